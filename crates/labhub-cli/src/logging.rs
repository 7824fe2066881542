use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level used before any configuration is loaded.
pub const DEFAULT_LEVEL: &str = "info";

/// `RUST_LOG` wins over the configured level. Logs go to stderr.
pub fn init_tracing(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
