//! # Logging Setup
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages everywhere
//! - `RUST_LOG=till_core=trace` - Engine only
//! - Default: [`DEFAULT_LOG_FILTER`]

use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info,till_core=debug,till_config=debug";

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// `default_filter` replaces [`DEFAULT_LOG_FILTER`] when given. Returns
/// `false` if a global subscriber was already installed, in which case the
/// existing one stays.
pub fn init_logging(default_filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_LOG_FILTER)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let _ = init_logging(Some("warn"));
        assert!(!init_logging(None));
    }
}
