//! Configuration types.
//!
//! Every field is optional in TOML. Accessors apply the built-in defaults from
//! [`crate::defaults`], so an empty file is a valid configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Top-level configuration for one coordinator instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavsyncConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub tabs: TabsConfig,
    #[serde(default)]
    pub loop_detection: LoopDetectionConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub toasts: ToastConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl NavsyncConfig {
    /// View recovery navigates to. Falls back to the default tab view.
    pub fn safe_view(&self) -> &str {
        self.recovery
            .safe_view
            .as_deref()
            .unwrap_or_else(|| self.tabs.default_view())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub capacity: Option<usize>,
}

impl HistoryConfig {
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(defaults::HISTORY_CAPACITY)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            capacity: override_config.capacity.or(base.capacity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabsConfig {
    /// Query parameter that carries the active view (`?tab=messages`).
    pub query_param: Option<String>,
    pub default_view: Option<String>,
    /// How long URL echoes are ignored after an internal view change.
    pub debounce_ms: Option<u64>,
    /// When set, views outside this list are not accepted.
    pub known_views: Option<Vec<String>>,
}

impl TabsConfig {
    pub fn query_param(&self) -> &str {
        self.query_param.as_deref().unwrap_or(defaults::QUERY_PARAM)
    }

    pub fn default_view(&self) -> &str {
        self.default_view.as_deref().unwrap_or(defaults::DEFAULT_VIEW)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(defaults::DEBOUNCE_MS)
    }

    /// Whether `view` is acceptable. Always true when no list is configured.
    pub fn is_known_view(&self, view: &str) -> bool {
        match &self.known_views {
            Some(views) => views.iter().any(|v| v == view),
            None => true,
        }
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            query_param: override_config
                .query_param
                .clone()
                .or_else(|| base.query_param.clone()),
            default_view: override_config
                .default_view
                .clone()
                .or_else(|| base.default_view.clone()),
            debounce_ms: override_config.debounce_ms.or(base.debounce_ms),
            known_views: override_config
                .known_views
                .clone()
                .or_else(|| base.known_views.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopDetectionConfig {
    pub window_ms: Option<u64>,
    pub warning_threshold: Option<usize>,
    pub emergency_threshold: Option<usize>,
}

impl LoopDetectionConfig {
    pub fn window_ms(&self) -> u64 {
        self.window_ms.unwrap_or(defaults::LOOP_WINDOW_MS)
    }

    pub fn warning_threshold(&self) -> usize {
        self.warning_threshold
            .unwrap_or(defaults::WARNING_THRESHOLD)
    }

    pub fn emergency_threshold(&self) -> usize {
        self.emergency_threshold
            .unwrap_or(defaults::EMERGENCY_THRESHOLD)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            window_ms: override_config.window_ms.or(base.window_ms),
            warning_threshold: override_config
                .warning_threshold
                .or(base.warning_threshold),
            emergency_threshold: override_config
                .emergency_threshold
                .or(base.emergency_threshold),
        }
    }
}

/// Per-resource interval overrides (`[refresh.resources.<key>]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRefreshConfig {
    pub manual_min_interval_ms: Option<u64>,
    pub automatic_min_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub manual_min_interval_ms: Option<u64>,
    pub automatic_min_interval_ms: Option<u64>,
    /// Schedule one automatic refresh per resource when a view mounts.
    pub auto_refresh_on_attach: Option<bool>,
    pub retry_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRefreshConfig>,
}

impl RefreshConfig {
    /// Minimum spacing between manual refreshes of `resource`.
    pub fn manual_min_interval_ms(&self, resource: &str) -> u64 {
        self.resources
            .get(resource)
            .and_then(|r| r.manual_min_interval_ms)
            .or(self.manual_min_interval_ms)
            .unwrap_or(defaults::MANUAL_MIN_INTERVAL_MS)
    }

    /// Minimum spacing between automatic refreshes of `resource`.
    pub fn automatic_min_interval_ms(&self, resource: &str) -> u64 {
        self.resources
            .get(resource)
            .and_then(|r| r.automatic_min_interval_ms)
            .or(self.automatic_min_interval_ms)
            .unwrap_or(defaults::AUTOMATIC_MIN_INTERVAL_MS)
    }

    pub fn auto_refresh_on_attach(&self) -> bool {
        self.auto_refresh_on_attach
            .unwrap_or(defaults::AUTO_REFRESH_ON_ATTACH)
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms.unwrap_or(defaults::RETRY_DELAY_MS)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(defaults::MAX_RETRIES)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        let mut resources = base.resources.clone();
        for (key, value) in &override_config.resources {
            let merged = match resources.get(key) {
                Some(existing) => ResourceRefreshConfig {
                    manual_min_interval_ms: value
                        .manual_min_interval_ms
                        .or(existing.manual_min_interval_ms),
                    automatic_min_interval_ms: value
                        .automatic_min_interval_ms
                        .or(existing.automatic_min_interval_ms),
                },
                None => value.clone(),
            };
            resources.insert(key.clone(), merged);
        }

        Self {
            manual_min_interval_ms: override_config
                .manual_min_interval_ms
                .or(base.manual_min_interval_ms),
            automatic_min_interval_ms: override_config
                .automatic_min_interval_ms
                .or(base.automatic_min_interval_ms),
            auto_refresh_on_attach: override_config
                .auto_refresh_on_attach
                .or(base.auto_refresh_on_attach),
            retry_delay_ms: override_config.retry_delay_ms.or(base.retry_delay_ms),
            max_retries: override_config.max_retries.or(base.max_retries),
            resources,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Minimum time between two shown toasts of any key.
    pub min_spacing_ms: Option<u64>,
    pub success_ttl_ms: Option<u64>,
    pub info_ttl_ms: Option<u64>,
    pub warning_ttl_ms: Option<u64>,
    pub error_ttl_ms: Option<u64>,
}

impl ToastConfig {
    pub fn min_spacing_ms(&self) -> u64 {
        self.min_spacing_ms
            .unwrap_or(defaults::TOAST_MIN_SPACING_MS)
    }

    pub fn success_ttl_ms(&self) -> u64 {
        self.success_ttl_ms.unwrap_or(defaults::SUCCESS_TTL_MS)
    }

    pub fn info_ttl_ms(&self) -> u64 {
        self.info_ttl_ms.unwrap_or(defaults::INFO_TTL_MS)
    }

    pub fn warning_ttl_ms(&self) -> u64 {
        self.warning_ttl_ms.unwrap_or(defaults::WARNING_TTL_MS)
    }

    pub fn error_ttl_ms(&self) -> u64 {
        self.error_ttl_ms.unwrap_or(defaults::ERROR_TTL_MS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            min_spacing_ms: override_config.min_spacing_ms.or(base.min_spacing_ms),
            success_ttl_ms: override_config.success_ttl_ms.or(base.success_ttl_ms),
            info_ttl_ms: override_config.info_ttl_ms.or(base.info_ttl_ms),
            warning_ttl_ms: override_config.warning_ttl_ms.or(base.warning_ttl_ms),
            error_ttl_ms: override_config.error_ttl_ms.or(base.error_ttl_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    pub safe_view: Option<String>,
    pub stabilization_ms: Option<u64>,
    /// Session-store key holding the recovery marker.
    pub flag_key: Option<String>,
    pub message: Option<String>,
}

impl RecoveryConfig {
    pub fn stabilization_ms(&self) -> u64 {
        self.stabilization_ms
            .unwrap_or(defaults::STABILIZATION_MS)
    }

    pub fn flag_key(&self) -> &str {
        self.flag_key
            .as_deref()
            .unwrap_or(defaults::RECOVERY_FLAG_KEY)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(defaults::RECOVERY_MESSAGE)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            safe_view: override_config
                .safe_view
                .clone()
                .or_else(|| base.safe_view.clone()),
            stabilization_ms: override_config
                .stabilization_ms
                .or(base.stabilization_ms),
            flag_key: override_config
                .flag_key
                .clone()
                .or_else(|| base.flag_key.clone()),
            message: override_config
                .message
                .clone()
                .or_else(|| base.message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: NavsyncConfig = toml::from_str("").unwrap();
        assert_eq!(config.history.capacity(), 20);
        assert_eq!(config.tabs.query_param(), "tab");
        assert_eq!(config.tabs.default_view(), "time-off");
        assert_eq!(config.loop_detection.window_ms(), 5_000);
        assert_eq!(config.loop_detection.warning_threshold(), 5);
        assert_eq!(config.loop_detection.emergency_threshold(), 7);
        assert_eq!(config.refresh.manual_min_interval_ms("messages"), 3_000);
        assert_eq!(config.refresh.automatic_min_interval_ms("messages"), 480_000);
        assert!(config.refresh.auto_refresh_on_attach());
        assert_eq!(config.toasts.min_spacing_ms(), 10_000);
        assert_eq!(config.recovery.stabilization_ms(), 10_000);
        assert_eq!(config.recovery.flag_key(), "navsync.recovery");
    }

    #[test]
    fn test_safe_view_falls_back_to_default_view() {
        let mut config = NavsyncConfig::default();
        config.tabs.default_view = Some("announcements".to_string());
        assert_eq!(config.safe_view(), "announcements");

        config.recovery.safe_view = Some("training".to_string());
        assert_eq!(config.safe_view(), "training");
    }

    #[test]
    fn test_resource_override_wins_over_global_interval() {
        let raw = r#"
[refresh]
manual_min_interval_ms = 30000

[refresh.resources.time-off]
manual_min_interval_ms = 5000
"#;
        let config: NavsyncConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.refresh.manual_min_interval_ms("time-off"), 5_000);
        assert_eq!(config.refresh.manual_min_interval_ms("messages"), 30_000);
        assert_eq!(
            config.refresh.automatic_min_interval_ms("time-off"),
            480_000,
            "Unset automatic override should fall through to the default"
        );
    }

    #[test]
    fn test_is_known_view_without_list_accepts_anything() {
        let tabs = TabsConfig::default();
        assert!(tabs.is_known_view("anything"));
    }

    #[test]
    fn test_is_known_view_with_list() {
        let tabs = TabsConfig {
            known_views: Some(vec!["messages".to_string(), "training".to_string()]),
            ..Default::default()
        };
        assert!(tabs.is_known_view("messages"));
        assert!(!tabs.is_known_view("payroll"));
    }

    #[test]
    fn test_refresh_merge_combines_resource_overrides() {
        let mut base = RefreshConfig::default();
        base.resources.insert(
            "messages".to_string(),
            ResourceRefreshConfig {
                manual_min_interval_ms: Some(1_000),
                automatic_min_interval_ms: Some(60_000),
            },
        );
        let mut project = RefreshConfig::default();
        project.resources.insert(
            "messages".to_string(),
            ResourceRefreshConfig {
                manual_min_interval_ms: Some(2_000),
                automatic_min_interval_ms: None,
            },
        );

        let merged = RefreshConfig::merge(&base, &project);
        assert_eq!(merged.manual_min_interval_ms("messages"), 2_000);
        assert_eq!(merged.automatic_min_interval_ms("messages"), 60_000);
    }
}
