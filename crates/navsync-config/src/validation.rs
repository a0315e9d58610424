//! Configuration validation logic.
//!
//! Ensures thresholds and views are coherent before a coordinator is built
//! from them.

use crate::errors::ConfigError;
use crate::types::NavsyncConfig;

/// Validate a NavsyncConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - History capacity, loop window and both loop thresholds must be non-zero
/// - The emergency threshold must be greater than the warning threshold
/// - The view query parameter and default view must be non-empty
/// - If `known_views` is set, the default view and safe view must be members
///
/// # Errors
///
/// Returns `ConfigError::InvalidConfiguration` describing the first violation.
pub fn validate_config(config: &NavsyncConfig) -> Result<(), ConfigError> {
    if config.history.capacity() == 0 {
        return Err(invalid("history.capacity must be greater than 0"));
    }

    let detection = &config.loop_detection;
    if detection.window_ms() == 0 {
        return Err(invalid("loop_detection.window_ms must be greater than 0"));
    }
    if detection.warning_threshold() == 0 {
        return Err(invalid(
            "loop_detection.warning_threshold must be greater than 0",
        ));
    }
    if detection.emergency_threshold() <= detection.warning_threshold() {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "loop_detection.emergency_threshold ({}) must be greater than warning_threshold ({})",
                detection.emergency_threshold(),
                detection.warning_threshold()
            ),
        });
    }

    if config.tabs.query_param().trim().is_empty() {
        return Err(invalid("tabs.query_param must be non-empty"));
    }
    if config.tabs.default_view().trim().is_empty() {
        return Err(invalid("tabs.default_view must be non-empty"));
    }

    if let Some(ref views) = config.tabs.known_views {
        if views.is_empty() {
            return Err(invalid("tabs.known_views must not be an empty list"));
        }
        if !config.tabs.is_known_view(config.tabs.default_view()) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!(
                    "tabs.default_view '{}' is not one of known_views: {}",
                    config.tabs.default_view(),
                    views.join(", ")
                ),
            });
        }
        if !config.tabs.is_known_view(config.safe_view()) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!(
                    "recovery.safe_view '{}' is not one of known_views: {}",
                    config.safe_view(),
                    views.join(", ")
                ),
            });
        }
    }

    if config.recovery.flag_key().trim().is_empty() {
        return Err(invalid("recovery.flag_key must be non-empty"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NavsyncConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = NavsyncConfig::default();
        config.history.capacity = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("history.capacity"));
    }

    #[test]
    fn test_emergency_must_exceed_warning() {
        let mut config = NavsyncConfig::default();
        config.loop_detection.warning_threshold = Some(7);
        config.loop_detection.emergency_threshold = Some(7);

        let result = validate_config(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = NavsyncConfig::default();
        config.loop_detection.window_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_blank_default_view_rejected() {
        let mut config = NavsyncConfig::default();
        config.tabs.default_view = Some("  ".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tabs.default_view"));
    }

    #[test]
    fn test_default_view_must_be_known() {
        let mut config = NavsyncConfig::default();
        config.tabs.known_views = Some(vec!["messages".to_string()]);

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("'time-off' is not one of known_views"));
    }

    #[test]
    fn test_safe_view_must_be_known() {
        let mut config = NavsyncConfig::default();
        config.tabs.known_views = Some(vec!["time-off".to_string(), "messages".to_string()]);
        config.recovery.safe_view = Some("payroll".to_string());

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("recovery.safe_view"));
    }

    #[test]
    fn test_known_views_covering_defaults_is_valid() {
        let mut config = NavsyncConfig::default();
        config.tabs.known_views = Some(vec!["time-off".to_string(), "messages".to_string()]);
        config.recovery.safe_view = Some("messages".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
