use shared::{domain::CourseId, error::ApiError};
use thiserror::Error;

/// Failure of a remote call or of durable storage. Cloneable so a shared
/// request handle can hand the same outcome to every awaiting party.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("durable storage failure: {0}")]
    Storage(String),
    #[error("background request ended abnormally: {0}")]
    Task(String),
}

impl ClientError {
    pub fn status(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiError>(body) {
            Ok(api_error) => api_error.message,
            Err(_) if body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => body.trim().to_string(),
        };
        Self::Status { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The caller asked to edit a course the snapshot does not contain.
    #[error("course {0} is not in the catalog snapshot")]
    CourseNotFound(CourseId),
}
