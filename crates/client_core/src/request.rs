use std::{fmt, future::IntoFuture};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};

use crate::error::ClientError;

pub type RequestResult<T> = Result<T, ClientError>;

/// Handle to a request running on its own task. Every clone and every await
/// observes the same single outcome; dropping handles never aborts the
/// request.
#[derive(Clone)]
pub struct SharedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Shared<BoxFuture<'static, RequestResult<T>>>,
}

impl<T> SharedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F>(request: F) -> Self
    where
        F: std::future::Future<Output = RequestResult<T>> + Send + 'static,
    {
        let handle = tokio::spawn(request);
        let inner = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Err(ClientError::Task(err.to_string())),
            }
        }
        .boxed()
        .shared();
        Self { inner }
    }

    /// A handle that is already settled.
    pub fn ready(outcome: RequestResult<T>) -> Self {
        Self {
            inner: futures::future::ready(outcome).boxed().shared(),
        }
    }

    pub async fn outcome(&self) -> RequestResult<T> {
        self.inner.clone().await
    }

    /// The outcome if some awaiting party has already driven the request to
    /// completion.
    pub fn peek(&self) -> Option<&RequestResult<T>> {
        self.inner.peek()
    }
}

impl<T> IntoFuture for SharedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = RequestResult<T>;
    type IntoFuture = Shared<BoxFuture<'static, RequestResult<T>>>;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

impl<T> fmt::Debug for SharedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRequest")
            .field("settled", &self.inner.peek().is_some())
            .finish()
    }
}
