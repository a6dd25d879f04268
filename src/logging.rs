//! Tracing subscriber setup for the binary and for tests.
//!
//! The library only emits `tracing` events. Whoever owns `main` decides
//! whether they go anywhere by calling [`init`].

use tracing::level_filters::LevelFilter;

use crate::config::LoggingConfig;
use crate::error::VectorResult;

/// Installs a stderr `fmt` subscriber at the configured level.
///
/// Returns `Ok(false)` when a global subscriber was already installed,
/// so repeated calls are harmless.
///
/// # Errors
///
/// `VectorError::Config` if `config.level` is not a known level name.
pub fn init(config: &LoggingConfig) -> VectorResult<bool> {
    let level = config.level_filter()?;
    Ok(init_with_level(level, config.ansi))
}

/// Like [`init`] with an already parsed level.
pub fn init_with_level(level: LevelFilter, ansi: bool) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(ansi)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;

    #[test]
    fn test_init_twice_is_a_noop() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ansi: false,
        };
        // Another test may have installed a subscriber first, so only the
        // second call's outcome is fixed.
        let _ = init(&config).unwrap();
        assert!(!init(&config).unwrap());
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ansi: false,
        };
        assert!(matches!(init(&config), Err(VectorError::Config(_))));
    }
}
