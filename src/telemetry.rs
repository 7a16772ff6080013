use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FIRE_AGE_LOG";

/// Installs the global fmt subscriber. Logs go to stderr so `simulate` output on
/// stdout stays machine-readable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("fire_age=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
