use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::{Category, Course, CourseChanges, CourseId, Lesson, LessonId, User, UserId};
use tokio::sync::{Mutex, Notify};

use crate::{api::CatalogApi, error::ClientError, request::RequestResult};

pub(crate) fn course(id: &str, category: Category, seq_no: i64) -> Course {
    Course {
        id: CourseId::new(id),
        category,
        description: format!("Course {id}"),
        long_description: format!("All about course {id}"),
        released_at: None,
        seq_no,
        icon_url: None,
        course_list_icon: None,
        lessons_count: None,
    }
}

pub(crate) fn lesson(id: &str, course_id: &str, seq_no: i64) -> Lesson {
    Lesson {
        id: LessonId::new(id),
        description: format!("Lesson {id}"),
        duration: "4:17".to_string(),
        seq_no,
        course_id: CourseId::new(course_id),
    }
}

pub(crate) fn user(email: &str) -> User {
    User {
        id: UserId::new("1"),
        email: email.to_string(),
        picture_url: None,
    }
}

/// `[{id:"1", BEGINNER, seq 2}, {id:"2", BEGINNER, seq 1}]`
pub(crate) fn two_beginner_courses() -> Vec<Course> {
    vec![
        course("1", Category::Beginner, 2),
        course("2", Category::Beginner, 1),
    ]
}

pub(crate) fn network_error() -> ClientError {
    ClientError::Network("connection refused".to_string())
}

/// In-process backend. Requests wait on their gate, when one is set, before
/// answering, which stands in for network latency.
pub(crate) struct FakeCatalogApi {
    load_result: RequestResult<Vec<Course>>,
    save_result: RequestResult<Value>,
    login_result: RequestResult<User>,
    lessons: Vec<Lesson>,
    load_gate: Option<Arc<Notify>>,
    save_gate: Option<Arc<Notify>>,
    lessons_gate: Option<Arc<Notify>>,
    pub(crate) load_calls: AtomicUsize,
    pub(crate) login_calls: AtomicUsize,
    pub(crate) saves: Mutex<Vec<(CourseId, CourseChanges)>>,
}

impl FakeCatalogApi {
    pub(crate) fn with_courses(courses: Vec<Course>) -> Self {
        Self {
            load_result: Ok(courses),
            save_result: Ok(json!({ "ok": true })),
            login_result: Ok(user("student@example.test")),
            lessons: Vec::new(),
            load_gate: None,
            save_gate: None,
            lessons_gate: None,
            load_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_load(err: ClientError) -> Self {
        let mut api = Self::with_courses(Vec::new());
        api.load_result = Err(err);
        api
    }

    pub(crate) fn with_save_result(mut self, result: RequestResult<Value>) -> Self {
        self.save_result = result;
        self
    }

    pub(crate) fn with_login_result(mut self, result: RequestResult<User>) -> Self {
        self.login_result = result;
        self
    }

    pub(crate) fn with_lessons(mut self, lessons: Vec<Lesson>) -> Self {
        self.lessons = lessons;
        self
    }

    pub(crate) fn with_load_gate(mut self, gate: Arc<Notify>) -> Self {
        self.load_gate = Some(gate);
        self
    }

    pub(crate) fn with_save_gate(mut self, gate: Arc<Notify>) -> Self {
        self.save_gate = Some(gate);
        self
    }

    pub(crate) fn with_lessons_gate(mut self, gate: Arc<Notify>) -> Self {
        self.lessons_gate = Some(gate);
        self
    }

    pub(crate) async fn save_calls(&self) -> Vec<(CourseId, CourseChanges)> {
        self.saves.lock().await.clone()
    }
}

async fn pass(gate: &Option<Arc<Notify>>) {
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn load_all_courses(&self) -> RequestResult<Vec<Course>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.load_gate).await;
        self.load_result.clone()
    }

    async fn load_course_by_id(&self, course_id: &CourseId) -> RequestResult<Course> {
        let courses = self.load_result.clone()?;
        courses
            .into_iter()
            .find(|course| &course.id == course_id)
            .ok_or_else(|| ClientError::status(404, "course not found"))
    }

    async fn load_course_lessons(&self, course_id: &CourseId) -> RequestResult<Vec<Lesson>> {
        pass(&self.lessons_gate).await;
        Ok(self
            .lessons
            .iter()
            .filter(|lesson| &lesson.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn save_course(
        &self,
        course_id: &CourseId,
        changes: &CourseChanges,
    ) -> RequestResult<Value> {
        self.saves
            .lock()
            .await
            .push((course_id.clone(), changes.clone()));
        pass(&self.save_gate).await;
        self.save_result.clone()
    }

    async fn login(&self, _email: &str, _password: &str) -> RequestResult<User> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_result.clone()
    }
}
