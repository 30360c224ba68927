use std::{future::IntoFuture, sync::Arc};

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use shared::domain::{sort_courses_by_seq_no, Category, Course, CourseChanges, CourseId};
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::{error, info};

use crate::{
    api::CatalogApi,
    error::CatalogError,
    loading::LoadingService,
    messages::MessagesService,
    request::{RequestResult, SharedRequest},
};

pub const LOAD_FAILED_MESSAGE: &str = "Could not load courses";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save course";

/// Immutable view of the catalog. Mutations swap in a new snapshot, so a
/// holder of an older one never sees it change.
pub type CourseSnapshot = Arc<[Course]>;

/// Courses of `category` in display order.
pub fn select_category(courses: &[Course], category: Category) -> Vec<Course> {
    let mut selected: Vec<Course> = courses
        .iter()
        .filter(|course| course.category == category)
        .cloned()
        .collect();
    selected.sort_by(sort_courses_by_seq_no);
    selected
}

/// Lifecycle of one optimistic save. The local edit is already visible in
/// every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    LocalApplied,
    RemoteConfirmed,
    RemoteFailed,
}

/// Returned by [`CoursesStore::save_course`]. Awaiting it (or any clone)
/// yields the single outcome of the background `PUT`.
#[derive(Debug, Clone)]
pub struct SaveHandle {
    course_id: CourseId,
    request: SharedRequest<Value>,
    state: watch::Receiver<SaveState>,
}

impl SaveHandle {
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub fn state(&self) -> SaveState {
        *self.state.borrow()
    }

    pub async fn outcome(&self) -> RequestResult<Value> {
        self.request.outcome().await
    }

    pub fn request(&self) -> &SharedRequest<Value> {
        &self.request
    }
}

impl IntoFuture for SaveHandle {
    type Output = RequestResult<Value>;
    type IntoFuture = Shared<BoxFuture<'static, RequestResult<Value>>>;

    fn into_future(self) -> Self::IntoFuture {
        self.request.into_future()
    }
}

/// In-memory source of truth for the course catalog.
pub struct CoursesStore {
    api: Arc<dyn CatalogApi>,
    loading: LoadingService,
    messages: MessagesService,
    courses: Arc<watch::Sender<CourseSnapshot>>,
    initial_load: SharedRequest<CourseSnapshot>,
}

impl CoursesStore {
    /// Builds the store and starts loading the catalog in the background.
    /// Must be called from within a Tokio runtime.
    pub fn new(
        api: Arc<dyn CatalogApi>,
        loading: LoadingService,
        messages: MessagesService,
    ) -> Arc<Self> {
        let (courses, _) = watch::channel(CourseSnapshot::from(Vec::new()));
        let courses = Arc::new(courses);
        let initial_load = spawn_load(
            Arc::clone(&api),
            Arc::clone(&courses),
            loading.clone(),
            messages.clone(),
        );
        Arc::new(Self {
            api,
            loading,
            messages,
            courses,
            initial_load,
        })
    }

    pub fn initial_load(&self) -> SharedRequest<CourseSnapshot> {
        self.initial_load.clone()
    }

    /// Fetches the catalog again. On failure the current snapshot is kept.
    pub fn reload(&self) -> SharedRequest<CourseSnapshot> {
        spawn_load(
            Arc::clone(&self.api),
            Arc::clone(&self.courses),
            self.loading.clone(),
            self.messages.clone(),
        )
    }

    pub fn snapshot(&self) -> CourseSnapshot {
        Arc::clone(&self.courses.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<CourseSnapshot> {
        self.courses.subscribe()
    }

    /// Current snapshot first, then every replacement.
    pub fn courses(&self) -> WatchStream<CourseSnapshot> {
        WatchStream::new(self.subscribe())
    }

    pub fn filter_by_category(
        &self,
        category: Category,
    ) -> impl Stream<Item = Vec<Course>> + Send + Unpin + 'static {
        self.courses()
            .map(move |snapshot| select_category(&snapshot, category))
    }

    pub fn course(&self, course_id: &CourseId) -> Option<Course> {
        self.courses
            .borrow()
            .iter()
            .find(|course| &course.id == course_id)
            .cloned()
    }

    /// Applies `changes` locally and publishes the result before the backend
    /// hears about it. A failed `PUT` is reported through the messages
    /// service; the local edit stays in place.
    pub fn save_course(
        &self,
        course_id: &CourseId,
        changes: CourseChanges,
    ) -> Result<SaveHandle, CatalogError> {
        let mut applied = false;
        self.courses.send_if_modified(|snapshot| {
            let Some(index) = snapshot.iter().position(|course| &course.id == course_id) else {
                return false;
            };
            let mut next = snapshot.to_vec();
            next[index] = changes.apply_to(&snapshot[index]);
            *snapshot = next.into();
            applied = true;
            true
        });

        if !applied {
            error!("catalog: save rejected course={course_id} reason=not_in_snapshot");
            return Err(CatalogError::CourseNotFound(course_id.clone()));
        }

        let (state_tx, state) = watch::channel(SaveState::LocalApplied);
        let api = Arc::clone(&self.api);
        let messages = self.messages.clone();
        let id = course_id.clone();
        let request = SharedRequest::spawn(async move {
            match api.save_course(&id, &changes).await {
                Ok(response) => {
                    info!("catalog: saved course={id}");
                    state_tx.send_replace(SaveState::RemoteConfirmed);
                    Ok(response)
                }
                Err(err) => {
                    error!("catalog: {SAVE_FAILED_MESSAGE} course={id} err={err}");
                    messages.show_error(SAVE_FAILED_MESSAGE);
                    state_tx.send_replace(SaveState::RemoteFailed);
                    Err(err)
                }
            }
        });

        Ok(SaveHandle {
            course_id: course_id.clone(),
            request,
            state,
        })
    }
}

fn spawn_load(
    api: Arc<dyn CatalogApi>,
    courses: Arc<watch::Sender<CourseSnapshot>>,
    loading: LoadingService,
    messages: MessagesService,
) -> SharedRequest<CourseSnapshot> {
    SharedRequest::spawn(async move {
        loading
            .run_with_signal(async {
                match api.load_all_courses().await {
                    Ok(loaded) => {
                        info!("catalog: loaded courses count={}", loaded.len());
                        let snapshot = CourseSnapshot::from(loaded);
                        courses.send_replace(Arc::clone(&snapshot));
                        Ok(snapshot)
                    }
                    Err(err) => {
                        error!("catalog: {LOAD_FAILED_MESSAGE} err={err}");
                        messages.show_error(LOAD_FAILED_MESSAGE);
                        Err(err)
                    }
                }
            })
            .await
    })
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
