use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, filtered by `RUST_LOG` and defaulting to `info`.
///
/// Logs go to stderr, stdout carries diagnostics and the run summary.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Subscriber for tests, printing through the test harness' captured output.
pub fn init_test() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("loadgen=trace"))
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
