use std::path::{Path, PathBuf};

use clap::ArgMatches;
use tracing::{error, warn};

use navsync_core::NavsyncConfig;
use navsync_paths::NavsyncPaths;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if the config hierarchy cannot be loaded, but
/// notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> NavsyncConfig {
    match NavsyncConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.navsync/config.toml and ./.navsync/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            NavsyncConfig::default()
        }
    }
}

/// Resolve the config for a command: an explicit `--config` file must load
/// cleanly, the hierarchy falls back to defaults. Either way the result must
/// validate.
pub fn load_config(root: &ArgMatches) -> Result<NavsyncConfig, Box<dyn std::error::Error>> {
    let config = match root.get_one::<String>("config") {
        Some(path) => navsync_config::load_from_path(Path::new(path)).map_err(|e| {
            eprintln!("❌ Could not load config '{}': {}", path, e);
            error!(event = "cli.config.explicit_load_failed", path = %path, error = %e);
            e
        })?,
        None => load_config_with_warning(),
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        error!(event = "cli.config.invalid", error = %e);
        return Err(e.into());
    }
    Ok(config)
}

/// A trace argument is a path if it looks like one, otherwise a name under
/// `~/.navsync/traces/`.
pub fn resolve_trace_path(arg: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let direct = PathBuf::from(arg);
    let looks_like_path = arg.contains('/') || arg.contains('\\') || arg.ends_with(".json");
    if looks_like_path || direct.exists() {
        return Ok(direct);
    }
    let paths = NavsyncPaths::resolve().map_err(|e| {
        eprintln!("❌ Could not locate ~/.navsync/traces: {}", e);
        error!(event = "cli.paths.resolve_failed", error = %e);
        e
    })?;
    Ok(paths.trace_file(arg))
}
