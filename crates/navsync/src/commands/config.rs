use clap::ArgMatches;
use tracing::info;

use navsync_config::types::{
    HistoryConfig, LoopDetectionConfig, NavsyncConfig, RecoveryConfig, RefreshConfig,
    TabsConfig, ToastConfig,
};

use super::helpers::load_config;

pub(crate) fn handle_config_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let with_defaults = matches.get_flag("defaults");
    info!(
        event = "cli.config_started",
        json_output = json_output,
        defaults = with_defaults
    );

    let loaded = load_config(root)?;
    let config = if with_defaults {
        resolved(&loaded)
    } else {
        loaded
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }

    info!(event = "cli.config_completed");
    Ok(())
}

/// Every accessor's effective value written back as an explicit setting.
fn resolved(config: &NavsyncConfig) -> NavsyncConfig {
    NavsyncConfig {
        history: HistoryConfig {
            capacity: Some(config.history.capacity()),
        },
        tabs: TabsConfig {
            query_param: Some(config.tabs.query_param().to_string()),
            default_view: Some(config.tabs.default_view().to_string()),
            debounce_ms: Some(config.tabs.debounce_ms()),
            known_views: config.tabs.known_views.clone(),
        },
        loop_detection: LoopDetectionConfig {
            window_ms: Some(config.loop_detection.window_ms()),
            warning_threshold: Some(config.loop_detection.warning_threshold()),
            emergency_threshold: Some(config.loop_detection.emergency_threshold()),
        },
        refresh: RefreshConfig {
            manual_min_interval_ms: Some(config.refresh.manual_min_interval_ms("")),
            automatic_min_interval_ms: Some(config.refresh.automatic_min_interval_ms("")),
            auto_refresh_on_attach: Some(config.refresh.auto_refresh_on_attach()),
            retry_delay_ms: Some(config.refresh.retry_delay_ms()),
            max_retries: Some(config.refresh.max_retries()),
            resources: config.refresh.resources.clone(),
        },
        toasts: ToastConfig {
            min_spacing_ms: Some(config.toasts.min_spacing_ms()),
            success_ttl_ms: Some(config.toasts.success_ttl_ms()),
            info_ttl_ms: Some(config.toasts.info_ttl_ms()),
            warning_ttl_ms: Some(config.toasts.warning_ttl_ms()),
            error_ttl_ms: Some(config.toasts.error_ttl_ms()),
        },
        recovery: RecoveryConfig {
            safe_view: Some(config.safe_view().to_string()),
            stabilization_ms: Some(config.recovery.stabilization_ms()),
            flag_key: Some(config.recovery.flag_key().to_string()),
            message: Some(config.recovery.message().to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_fills_defaults() {
        let config = resolved(&NavsyncConfig::default());
        assert_eq!(config.history.capacity, Some(20));
        assert_eq!(config.tabs.query_param.as_deref(), Some("tab"));
        assert_eq!(config.loop_detection.emergency_threshold, Some(7));
        assert_eq!(config.refresh.automatic_min_interval_ms, Some(480_000));
        assert_eq!(config.toasts.min_spacing_ms, Some(10_000));
        assert_eq!(config.recovery.safe_view.as_deref(), Some("time-off"));
    }

    #[test]
    fn test_resolved_keeps_explicit_values() {
        let mut config = NavsyncConfig::default();
        config.tabs.default_view = Some("messages".to_string());
        config.toasts.error_ttl_ms = Some(8_000);

        let resolved = resolved(&config);
        assert_eq!(resolved.tabs.default_view.as_deref(), Some("messages"));
        assert_eq!(resolved.recovery.safe_view.as_deref(), Some("messages"));
        assert_eq!(resolved.toasts.error_ttl_ms, Some(8_000));
    }
}
