//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.navsync/config.toml`
//! 3. **Project config** - `./.navsync/config.toml`
//! 4. **Explicit file** - `--config <path>` on the CLI (highest priority)

use std::fs;
use std::path::Path;

use crate::errors::ConfigError;
use crate::types::{
    HistoryConfig, LoopDetectionConfig, NavsyncConfig, RecoveryConfig, RefreshConfig, TabsConfig,
    ToastConfig,
};
use crate::validation::validate_config;

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a present file fails to parse or the merged result
/// fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<NavsyncConfig, ConfigError> {
    let user_config = navsync_paths::NavsyncPaths::resolve()
        .map(|paths| paths.user_config())
        .ok();
    let project_root = std::env::current_dir()?;
    load_hierarchy_from(user_config.as_deref(), &project_root)
}

/// Load the hierarchy from an explicit user config path and project root.
pub fn load_hierarchy_from(
    user_config: Option<&Path>,
    project_root: &Path,
) -> Result<NavsyncConfig, ConfigError> {
    let mut config = NavsyncConfig::default();

    if let Some(path) = user_config {
        config = merge_optional(config, path)?;
    }

    let project_config = navsync_paths::NavsyncPaths::project_config(project_root);
    config = merge_optional(config, &project_config)?;

    validate_config(&config)?;
    Ok(config)
}

/// Merge the file at `path` over `config`, skipping it if it does not exist.
fn merge_optional(config: NavsyncConfig, path: &Path) -> Result<NavsyncConfig, ConfigError> {
    match load_config_file(path) {
        Ok(file_config) => {
            tracing::debug!(
                event = "config.file_loaded",
                path = %path.display()
            );
            Ok(merge_configs(config, file_config))
        }
        Err(e) if e.is_file_not_found() => Ok(config),
        Err(e) => Err(e),
    }
}

/// Load, parse and validate a single configuration file, merged over defaults.
pub fn load_from_path(path: &Path) -> Result<NavsyncConfig, ConfigError> {
    let config = merge_configs(NavsyncConfig::default(), load_config_file(path)?);
    validate_config(&config)?;
    Ok(config)
}

/// Load a configuration file from the given path.
fn load_config_file(path: &Path) -> Result<NavsyncConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("'{}': {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        message: format!("'{}': {}", path.display(), e),
    })
}

/// Merge two configurations, with override_config taking precedence.
pub fn merge_configs(base: NavsyncConfig, override_config: NavsyncConfig) -> NavsyncConfig {
    NavsyncConfig {
        history: HistoryConfig::merge(&base.history, &override_config.history),
        tabs: TabsConfig::merge(&base.tabs, &override_config.tabs),
        loop_detection: LoopDetectionConfig::merge(
            &base.loop_detection,
            &override_config.loop_detection,
        ),
        refresh: RefreshConfig::merge(&base.refresh, &override_config.refresh),
        toasts: ToastConfig::merge(&base.toasts, &override_config.toasts),
        recovery: RecoveryConfig::merge(&base.recovery, &override_config.recovery),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_project_config(root: &Path, raw: &str) {
        let dir = root.join(".navsync");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), raw).unwrap();
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing_user = temp.path().join("absent.toml");

        let config = load_hierarchy_from(Some(&missing_user), temp.path()).unwrap();
        assert_eq!(config, NavsyncConfig::default());
    }

    #[test]
    fn test_project_overrides_user() {
        let temp = tempfile::TempDir::new().unwrap();
        let user = temp.path().join("user.toml");
        fs::write(
            &user,
            r#"
[loop_detection]
window_ms = 8000
warning_threshold = 4

[toasts]
min_spacing_ms = 20000
"#,
        )
        .unwrap();
        write_project_config(
            temp.path(),
            r#"
[loop_detection]
warning_threshold = 6
emergency_threshold = 9
"#,
        );

        let config = load_hierarchy_from(Some(&user), temp.path()).unwrap();
        assert_eq!(config.loop_detection.window_ms(), 8_000);
        assert_eq!(config.loop_detection.warning_threshold(), 6);
        assert_eq!(config.loop_detection.emergency_threshold(), 9);
        assert_eq!(config.toasts.min_spacing_ms(), 20_000);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        write_project_config(temp.path(), "[tabs\ndefault_view = ");

        let err = load_hierarchy_from(None, temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_merged_config_is_validated() {
        let temp = tempfile::TempDir::new().unwrap();
        write_project_config(
            temp.path(),
            r#"
[loop_detection]
warning_threshold = 10
"#,
        );

        let err = load_hierarchy_from(None, temp.path()).unwrap_err();
        assert!(err.to_string().contains("emergency_threshold"));
    }

    #[test]
    fn test_load_from_path_missing_file_errors() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = load_from_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(err.is_file_not_found());
    }

    #[test]
    fn test_load_from_path_reads_recovery_section() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("navsync.toml");
        fs::write(
            &path,
            r#"
[recovery]
safe_view = "announcements"
stabilization_ms = 15000
"#,
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.safe_view(), "announcements");
        assert_eq!(config.recovery.stabilization_ms(), 15_000);
    }

    #[test]
    fn test_load_hierarchy_reads_home_config() {
        let home = tempfile::TempDir::new().unwrap();
        let project = tempfile::TempDir::new().unwrap();
        let navsync_dir = home.path().join(".navsync");
        fs::create_dir_all(&navsync_dir).unwrap();
        fs::write(
            navsync_dir.join("config.toml"),
            "[tabs]\ndefault_view = \"messages\"\n",
        )
        .unwrap();

        let config = temp_env::with_var("HOME", Some(home.path()), || {
            let user = navsync_paths::NavsyncPaths::resolve()
                .unwrap()
                .user_config();
            load_hierarchy_from(Some(&user), project.path())
        })
        .unwrap();
        assert_eq!(config.tabs.default_view(), "messages");
    }
}
