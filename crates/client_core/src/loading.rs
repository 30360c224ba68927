use std::{future::Future, sync::Arc};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared busy flag. Overlapping wrapped operations are not ref-counted: the
/// first one to finish turns the flag off.
#[derive(Clone)]
pub struct LoadingService {
    loading: Arc<watch::Sender<bool>>,
}

impl LoadingService {
    pub fn new() -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            loading: Arc::new(loading),
        }
    }

    /// Runs `operation` with the flag raised. The flag goes up when the
    /// returned future is first polled and comes down exactly once, when the
    /// operation finishes or the returned future is dropped.
    pub async fn run_with_signal<F>(&self, operation: F) -> F::Output
    where
        F: Future,
    {
        let _guard = LoadingGuard::raise(&self.loading);
        operation.await
    }

    pub fn loading_on(&self) {
        self.loading.send_replace(true);
    }

    pub fn loading_off(&self) {
        self.loading.send_replace(false);
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Current value first, then every change.
    pub fn loading(&self) -> WatchStream<bool> {
        WatchStream::new(self.subscribe())
    }
}

impl Default for LoadingService {
    fn default() -> Self {
        Self::new()
    }
}

struct LoadingGuard<'a> {
    loading: &'a watch::Sender<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn raise(loading: &'a watch::Sender<bool>) -> Self {
        loading.send_replace(true);
        Self { loading }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.send_replace(false);
    }
}

#[cfg(test)]
#[path = "tests/loading_tests.rs"]
mod tests;
