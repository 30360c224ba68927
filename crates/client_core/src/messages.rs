use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::debug;

/// Error notices for the message banner. Each batch replaces the previous one.
#[derive(Clone)]
pub struct MessagesService {
    errors: Arc<watch::Sender<Vec<String>>>,
}

impl MessagesService {
    pub fn new() -> Self {
        let (errors, _) = watch::channel(Vec::new());
        Self {
            errors: Arc::new(errors),
        }
    }

    pub fn show_errors<I, S>(&self, errors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let errors: Vec<String> = errors.into_iter().map(Into::into).collect();
        if !errors.is_empty() {
            debug!("messages: showing errors={errors:?}");
        }
        self.errors.send_replace(errors);
    }

    pub fn show_error(&self, error: impl Into<String>) {
        self.show_errors([error.into()]);
    }

    /// Pending notices. An empty batch is never emitted; a subscriber joining
    /// while a non-empty batch is held receives it straight away.
    pub fn errors(&self) -> impl Stream<Item = Vec<String>> + Send + Unpin + 'static {
        WatchStream::new(self.errors.subscribe()).filter(|errors| !errors.is_empty())
    }

    pub fn current_errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Default for MessagesService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/messages_tests.rs"]
mod tests;
