use std::{pin::Pin, sync::Arc};

use shared::domain::{Category, Course, CourseId, Lesson};
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::warn;

use crate::{
    api::CatalogApi,
    catalog::{select_category, CourseSnapshot, CoursesStore},
    dialog::{CourseEditSession, DialogOutcome},
    error::ClientError,
    loading::LoadingService,
    messages::MessagesService,
    request::SharedRequest,
};

type CourseListStream = Pin<Box<dyn Stream<Item = Vec<Course>> + Send>>;

pub fn render_course_card(course: &Course) -> String {
    let mut card = format!(
        "#{:<4} {} [{}]",
        course.id, course.description, course.category
    );
    if let Some(released_at) = course.released_at {
        card.push_str(&format!(" released {}", released_at.format("%Y-%m-%d")));
    }
    if !course.long_description.is_empty() {
        card.push_str("\n      ");
        card.push_str(&course.long_description);
    }
    card
}

pub fn render_lesson(lesson: &Lesson) -> String {
    if lesson.duration.is_empty() {
        format!("{:>3}. {}", lesson.seq_no, lesson.description)
    } else {
        format!(
            "{:>3}. {} ({})",
            lesson.seq_no, lesson.description, lesson.duration
        )
    }
}

pub struct LoadingIndicator {
    loading: watch::Receiver<bool>,
}

impl LoadingIndicator {
    pub fn new(loading: &LoadingService) -> Self {
        Self {
            loading: loading.subscribe(),
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.loading.borrow()
    }

    /// Waits for the next flag change. `None` once the service is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.loading.changed().await.ok()?;
        Some(*self.loading.borrow_and_update())
    }
}

/// Shows the latest error batch until the user dismisses it.
pub struct MessagesBanner {
    errors: Pin<Box<dyn Stream<Item = Vec<String>> + Send>>,
    current: Vec<String>,
    show_messages: bool,
}

impl MessagesBanner {
    pub fn new(messages: &MessagesService) -> Self {
        Self {
            errors: Box::pin(messages.errors()),
            current: Vec::new(),
            show_messages: false,
        }
    }

    /// Waits for the next non-empty batch and makes the banner visible.
    pub async fn next_batch(&mut self) -> Option<&[String]> {
        self.current = self.errors.next().await?;
        self.show_messages = true;
        Some(&self.current)
    }

    pub fn is_visible(&self) -> bool {
        self.show_messages
    }

    pub fn errors(&self) -> &[String] {
        &self.current
    }

    pub fn on_close(&mut self) {
        self.show_messages = false;
    }
}

/// Presentational list of course cards.
pub struct CoursesCardList {
    courses: Vec<Course>,
    courses_changed: Option<Box<dyn Fn() + Send + Sync>>,
}

impl CoursesCardList {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses,
            courses_changed: None,
        }
    }

    pub fn on_courses_changed(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.courses_changed = Some(Box::new(callback));
        self
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn set_courses(&mut self, courses: Vec<Course>) {
        self.courses = courses;
    }

    pub fn render(&self) -> Vec<String> {
        self.courses.iter().map(render_course_card).collect()
    }

    pub fn edit_course(&self, course_id: &CourseId) -> Option<CourseEditSession> {
        self.courses
            .iter()
            .find(|course| &course.id == course_id)
            .cloned()
            .map(CourseEditSession::open)
    }

    /// Notifies `courses_changed` only when the dialog closed with a save.
    pub fn dialog_closed(&self, outcome: &DialogOutcome) {
        if outcome.is_saved() {
            if let Some(callback) = &self.courses_changed {
                callback();
            }
        }
    }
}

/// Beginner and advanced course lists kept in step with the store.
pub struct HomeView {
    pub beginner: CoursesCardList,
    pub advanced: CoursesCardList,
    beginner_updates: CourseListStream,
    advanced_updates: CourseListStream,
}

impl HomeView {
    /// Lists start from the current snapshot; updates carry later changes only.
    pub fn new(store: &CoursesStore) -> Self {
        let mut courses = store.subscribe();
        let snapshot = Arc::clone(&courses.borrow_and_update());
        Self {
            beginner: CoursesCardList::new(select_category(&snapshot, Category::Beginner)),
            advanced: CoursesCardList::new(select_category(&snapshot, Category::Advanced)),
            beginner_updates: category_changes(courses.clone(), Category::Beginner),
            advanced_updates: category_changes(courses, Category::Advanced),
        }
    }

    /// Applies the next list update. Returns `false` once the store is gone.
    pub async fn next_update(&mut self) -> bool {
        tokio::select! {
            Some(courses) = self.beginner_updates.next() => {
                self.beginner.set_courses(courses);
                true
            }
            Some(courses) = self.advanced_updates.next() => {
                self.advanced.set_courses(courses);
                true
            }
            else => false,
        }
    }
}

fn category_changes(
    courses: watch::Receiver<CourseSnapshot>,
    category: Category,
) -> CourseListStream {
    Box::pin(
        WatchStream::from_changes(courses).map(move |snapshot| select_category(&snapshot, category)),
    )
}

/// Extracts the course id from a `/courses/{id}` route.
pub fn course_id_from_route(route: &str) -> Option<CourseId> {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    match (segments.next(), segments.next(), segments.next()) {
        (Some("courses"), Some(id), None) => Some(CourseId::new(id)),
        _ => None,
    }
}

/// Everything the course page renders. The course starts absent and the
/// lessons start empty; each fills in as its request completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseData {
    pub course: Option<Course>,
    pub lessons: Vec<Lesson>,
}

pub struct CourseDetailView {
    course_id: CourseId,
    data: watch::Receiver<CourseData>,
    done: SharedRequest<()>,
}

impl CourseDetailView {
    /// Loads the course and its lessons concurrently.
    pub fn load(api: Arc<dyn CatalogApi>, course_id: CourseId) -> Self {
        let (data_tx, data) = watch::channel(CourseData::default());
        let id = course_id.clone();
        let done = SharedRequest::spawn(async move {
            let course = async {
                let course = api.load_course_by_id(&id).await?;
                data_tx.send_modify(|data| data.course = Some(course));
                Ok::<(), ClientError>(())
            };
            let lessons = async {
                let lessons = api.load_course_lessons(&id).await?;
                data_tx.send_modify(|data| data.lessons = lessons);
                Ok::<(), ClientError>(())
            };
            let (course, lessons) = tokio::join!(course, lessons);
            if let Err(err) = &course {
                warn!("course: failed to load course={id} err={err}");
            }
            if let Err(err) = &lessons {
                warn!("course: failed to load lessons course={id} err={err}");
            }
            course.and(lessons)
        });
        Self {
            course_id,
            data,
            done,
        }
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub fn data(&self) -> CourseData {
        self.data.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CourseData> {
        self.data.clone()
    }

    /// Settles once both requests have finished; carries the first failure.
    pub fn done(&self) -> SharedRequest<()> {
        self.done.clone()
    }
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
