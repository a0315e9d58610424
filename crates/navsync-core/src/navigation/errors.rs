use crate::errors::NavsyncError;

/// A navigator write that the environment refused or could not perform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Navigation to '{target}' was rejected: {message}")]
    Rejected { target: String, message: String },

    #[error("Navigator unavailable: {message}")]
    Unavailable { message: String },
}

impl NavsyncError for NavigationError {
    fn error_code(&self) -> &'static str {
        match self {
            NavigationError::Rejected { .. } => "NAVIGATION_REJECTED",
            NavigationError::Unavailable { .. } => "NAVIGATOR_UNAVAILABLE",
        }
    }
}
