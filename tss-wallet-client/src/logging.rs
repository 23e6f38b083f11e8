use crate::{config::LoggingConfig, Result};
use tracing::Level;
use tracing_subscriber::{filter::Targets, prelude::*};

/// Install the global logging subscriber described by `config`.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // Log events generated by the wallet crates into stdout.
    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(our_targets_filter(config.stdout_log_level));

    // Optionally repeat every event as JSON.
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_filter(our_targets_filter(config.stdout_log_level))
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(json_layer)
        .try_init()?;

    Ok(())
}

/// Create filters for logging events originating from our tss_wallet*
/// crates.
fn our_targets_filter(level: Level) -> Targets {
    Targets::new()
        .with_target("tss_wallet", level)
        .with_target("tss_wallet_client", level)
}
