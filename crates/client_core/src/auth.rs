use std::sync::Arc;

use shared::domain::User;
use storage::KeyValueStore;
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    api::CatalogApi,
    error::ClientError,
    request::{RequestResult, SharedRequest},
};

/// Durable storage key of the logged-in identity.
pub const AUTH_DATA: &str = "auth_data";

/// Holds at most one logged-in identity and mirrors it to durable storage.
///
/// Only plain identity fields belong in the durable record; session tokens
/// stay with the backend.
pub struct AuthStore {
    api: Arc<dyn CatalogApi>,
    storage: Arc<dyn KeyValueStore>,
    user: Arc<watch::Sender<Option<User>>>,
}

impl AuthStore {
    /// Restores the identity persisted by a previous session, if any. A record
    /// that no longer decodes is ignored.
    pub async fn new(
        api: Arc<dyn CatalogApi>,
        storage: Arc<dyn KeyValueStore>,
    ) -> RequestResult<Arc<Self>> {
        let restored = restore_user(storage.as_ref()).await?;
        if let Some(user) = &restored {
            info!("auth: restored session user={}", user.email);
        }
        let (user, _) = watch::channel(restored);
        Ok(Arc::new(Self {
            api,
            storage,
            user: Arc::new(user),
        }))
    }

    /// Exchanges credentials for an identity. Every await of the returned
    /// handle sees the same outcome; the request is issued once.
    pub fn login(&self, email: &str, password: &str) -> SharedRequest<User> {
        let api = Arc::clone(&self.api);
        let storage = Arc::clone(&self.storage);
        let user = Arc::clone(&self.user);
        let email = email.to_string();
        let password = password.to_string();

        SharedRequest::spawn(async move {
            let logged_in = api.login(&email, &password).await?;
            user.send_replace(Some(logged_in.clone()));

            let record = serde_json::to_string(&logged_in)?;
            storage
                .set_item(AUTH_DATA, &record)
                .await
                .map_err(|err| ClientError::Storage(format!("{err:#}")))?;

            info!("auth: logged in user={}", logged_in.email);
            Ok(logged_in)
        })
    }

    /// Forgets the identity. The in-memory state is cleared before the
    /// durable record is touched, and a storage failure is only logged.
    pub async fn logout(&self) {
        let previous = self.user.send_replace(None);
        if let Err(err) = self.storage.remove_item(AUTH_DATA).await {
            warn!("auth: failed to erase durable session err={err:#}");
        }
        if let Some(user) = previous {
            info!("auth: logged out user={}", user.email);
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    pub fn user(&self) -> WatchStream<Option<User>> {
        WatchStream::new(self.subscribe())
    }

    pub fn is_logged_in(&self) -> impl Stream<Item = bool> + Send + Unpin + 'static {
        self.user().map(|user| user.is_some())
    }

    pub fn is_logged_out(&self) -> impl Stream<Item = bool> + Send + Unpin + 'static {
        self.is_logged_in().map(|logged_in| !logged_in)
    }
}

async fn restore_user(storage: &dyn KeyValueStore) -> RequestResult<Option<User>> {
    let Some(raw) = storage
        .get_item(AUTH_DATA)
        .await
        .map_err(|err| ClientError::Storage(format!("{err:#}")))?
    else {
        return Ok(None);
    };

    match serde_json::from_str::<User>(&raw) {
        Ok(user) => Ok(Some(user)),
        Err(err) => {
            warn!("auth: ignoring malformed durable session err={err}");
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
