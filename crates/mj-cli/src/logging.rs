use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MJ_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the stderr subscriber; stdout carries only command results.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
