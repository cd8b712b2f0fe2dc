use crate::error::ApiError;
use serde::Deserialize;

/// Every backend response is wrapped as `{success, data, message, error}`.
#[derive(Deserialize, Debug, Clone)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Stand-in for a successful response with no body.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            error: None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }

    /// Unwraps `data`, turning `success: false` into [`ApiError::Rejected`].
    pub fn into_data(self) -> Result<Option<T>, ApiError> {
        if !self.success {
            let message = self
                .server_message()
                .unwrap_or("request was rejected")
                .to_string();
            return Err(ApiError::Rejected(message));
        }
        Ok(self.data)
    }
}
