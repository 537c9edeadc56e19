use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init()?,
    }
    Ok(())
}
