use std::io;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::config::BuilderConfig;
use crate::errors::{CoreError, Result};

/// Installs the global subscriber for a builder host. Logs go to stderr.
///
/// `RUST_LOG` wins over the configured level. Production output drops
/// colours and targets.
pub fn init_tracing(config: &BuilderConfig) -> Result<()> {
    let filter = build_filter(&config.log_level)?;
    let plain = config.is_production() || !atty::is(atty::Stream::Stderr);

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(!config.is_production())
        .with_ansi(!plain)
        .try_init()
        .map_err(|err| CoreError::General(err.to_string()))
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|err| CoreError::Config(format!("invalid log level `{}`: {}", level, err)))
}
