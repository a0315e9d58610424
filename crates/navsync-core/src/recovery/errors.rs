use crate::errors::NavsyncError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Session store unavailable: {message}")]
    Unavailable { message: String },
}

impl NavsyncError for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::Unavailable { .. } => "SESSION_STORE_UNAVAILABLE",
        }
    }
}
