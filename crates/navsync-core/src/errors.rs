use std::error::Error;

use crate::refresh::RefreshError;
use crate::types::{ResourceKey, ViewId};

/// Base trait for all navsync errors
pub trait NavsyncError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the coordinator
pub type NavsyncResult<T> = Result<T, Box<dyn NavsyncError>>;

impl NavsyncError for navsync_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            navsync_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            navsync_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            navsync_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            navsync_config::ConfigError::ConfigParseError { .. }
                | navsync_config::ConfigError::InvalidConfiguration { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Refresh of '{key}' failed: {source}")]
    RefreshFailed {
        key: ResourceKey,
        #[source]
        source: RefreshError,
    },

    #[error("Unknown view '{view}'")]
    UnknownView { view: ViewId },

    #[error("No refresh operation registered for '{key}'")]
    UnknownResource { key: ResourceKey },

    #[error("Coordinator is detached")]
    Detached,
}

impl NavsyncError for CoordinatorError {
    fn error_code(&self) -> &'static str {
        match self {
            CoordinatorError::RefreshFailed { .. } => "REFRESH_FAILED",
            CoordinatorError::UnknownView { .. } => "UNKNOWN_VIEW",
            CoordinatorError::UnknownResource { .. } => "UNKNOWN_RESOURCE",
            CoordinatorError::Detached => "COORDINATOR_DETACHED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            CoordinatorError::UnknownView { .. } | CoordinatorError::UnknownResource { .. }
        )
    }
}
