use serde::Deserialize;
use thiserror::Error;

/// Error body some backends attach to non-2xx responses. Only the message is
/// read; any other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown course category '{0}'")]
pub struct ParseCategoryError(pub String);
