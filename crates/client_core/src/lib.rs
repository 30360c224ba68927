//! Reactive stores behind the course catalog client.
//!
//! Every store is an explicitly constructed service sharing its state through
//! `tokio::sync::watch` cells: subscribers always see the latest value first,
//! then each replacement.

use std::sync::Arc;

use storage::KeyValueStore;

pub mod api;
pub mod auth;
pub mod catalog;
pub mod dialog;
pub mod error;
pub mod loading;
pub mod messages;
pub mod request;
pub mod views;

pub use api::{CatalogApi, HttpCatalogApi};
pub use auth::{AuthStore, AUTH_DATA};
pub use catalog::{CourseSnapshot, CoursesStore, SaveHandle, SaveState};
pub use dialog::{CourseEditSession, DialogOutcome, EditError, FieldViolation};
pub use error::{CatalogError, ClientError};
pub use loading::LoadingService;
pub use messages::MessagesService;
pub use request::{RequestResult, SharedRequest};

/// The services of one client session, wired together.
#[derive(Clone)]
pub struct CatalogClient {
    pub api: Arc<dyn CatalogApi>,
    pub loading: LoadingService,
    pub messages: MessagesService,
    pub courses: Arc<CoursesStore>,
    pub auth: Arc<AuthStore>,
}

impl CatalogClient {
    /// Restores the durable session and starts the initial catalog load.
    pub async fn start(
        api: Arc<dyn CatalogApi>,
        storage: Arc<dyn KeyValueStore>,
    ) -> RequestResult<Self> {
        let loading = LoadingService::new();
        let messages = MessagesService::new();
        let auth = AuthStore::new(Arc::clone(&api), storage).await?;
        let courses = CoursesStore::new(Arc::clone(&api), loading.clone(), messages.clone());
        Ok(Self {
            api,
            loading,
            messages,
            courses,
            auth,
        })
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
