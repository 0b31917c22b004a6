//! # till-config: Deployment Configuration for Till
//!
//! The engine in `till-core` never touches the file system or the
//! environment. This crate does that on its behalf:
//!
//! - [`config`] - `EngineConfig`: currency, denomination catalog, tender
//!   settings, loaded from `till.toml` and `TILL_*` variables
//! - [`logging`] - installs the `tracing` subscriber
//! - [`error`] - `ConfigError`
//!
//! ## Example Usage
//!
//! ```rust
//! use till_config::EngineConfig;
//! use till_core::{compute_change, Money};
//!
//! let config = EngineConfig::default();
//! let catalog = config.catalog().unwrap();
//!
//! let change = compute_change(Money::from_units(10_000), Money::from_units(7350), &catalog).unwrap();
//! assert_eq!(change.total().units(), 2650);
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CurrencySettings, EngineConfig, TenderSettings};
pub use error::{ConfigError, ConfigResult};
pub use logging::init_logging;
