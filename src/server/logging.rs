use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging with configurable log levels
///
/// The configured level is the default; the `RUST_LOG` environment variable
/// overrides it when set. Examples:
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=axon=debug` - Debug level for the axon crate only
/// - `RUST_LOG=warn` - Warn level and above
pub fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
