//! Error types for backend calls.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// 401 from the backend. Expected before a token is configured.
    #[error("not authenticated")]
    Unauthorized,

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized))
    }

    /// Message fit for a user-facing notification: the server's own text when
    /// there was one, otherwise `fallback`.
    pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Status { message, .. }) if !message.is_empty() => message.clone(),
            Some(ApiError::Rejected(message)) if !message.is_empty() => message.clone(),
            Some(ApiError::Unauthorized) => "Not authenticated".to_string(),
            _ => fallback.to_string(),
        }
    }
}
