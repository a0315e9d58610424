use tracing_subscriber::EnvFilter;

/// Initialize structured JSON logging on stderr.
///
/// Quiet mode suppresses every level. Otherwise `RUST_LOG` is honored and
/// defaults to `info`. Safe to call more than once.
pub fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
