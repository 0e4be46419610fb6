use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::configuration::LogSettings;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Records emitted
/// through the `log` crate are forwarded into the same subscriber.
pub fn init_telemetry(settings: &LogSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout).json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .init();
    }
}
