//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Install a JSON tracing subscriber filtered by `logging.level`
///
/// An unparseable level falls back to `info`. Fails when a global
/// subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.logging.level.as_str();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))?;

    tracing::info!(
        level = log_level,
        default_page_size = config.pagination.default_page_size,
        max_page_size = config.pagination.max_page_size,
        "Tracing initialized"
    );

    Ok(())
}

/// Shutdown tracing
pub fn shutdown_tracing() {
    tracing::info!("Tracing shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_fails() {
        let config = Config::default();
        // Another test may already have installed a subscriber, so only the
        // second call is guaranteed to fail.
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(Error::Tracing(_))));
        shutdown_tracing();
    }
}
