use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber: compact console output filtered by
/// `RUST_LOG` (falling back to `logging.filter`), plus ERROR events as JSON
/// lines appended to `logging.error_log`.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))?;

    let console = fmt::layer()
        .event_format(Format::default().compact().with_target(false))
        .with_filter(filter);

    let error_file = match &config.error_log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::from_level(Level::ERROR)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(error_file)
        .try_init()?;
    Ok(())
}
