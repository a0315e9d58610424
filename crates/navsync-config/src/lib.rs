//! # navsync-config
//!
//! TOML configuration types, loading, and validation for the navigation
//! coordinator. Every threshold the coordinator uses is configurable here,
//! with the observed production values as defaults.

mod loading;
mod validation;

pub mod defaults;
pub mod errors;
pub mod types;

// Public API re-exports
pub use errors::ConfigError;
pub use loading::{load_from_path, load_hierarchy_from, merge_configs};
pub use types::{
    HistoryConfig, LoopDetectionConfig, NavsyncConfig, RecoveryConfig, RefreshConfig,
    ResourceRefreshConfig, TabsConfig, ToastConfig,
};
pub use validation::validate_config;

impl NavsyncConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
