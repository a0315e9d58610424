use crate::errors::NavsyncError;

/// Failure reported by a caller-supplied refresh operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Refresh failed: {message}")]
    Failed { message: String },

    #[error("Data service unavailable: {message}")]
    Unavailable { message: String },
}

impl RefreshError {
    pub fn failed(message: impl Into<String>) -> Self {
        RefreshError::Failed {
            message: message.into(),
        }
    }
}

impl NavsyncError for RefreshError {
    fn error_code(&self) -> &'static str {
        match self {
            RefreshError::Failed { .. } => "REFRESH_FAILED",
            RefreshError::Unavailable { .. } => "REFRESH_SERVICE_UNAVAILABLE",
        }
    }
}
