//! # Engine Configuration
//!
//! Per-deployment settings for the till engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     TILL_CURRENCY_CODE=EUR                                              │
//! │     TILL_CURRENCY_SYMBOL=€                                              │
//! │     TILL_DENOMINATIONS=5000:note,1000:note,100:coin,1:coin              │
//! │     TILL_MAX_TENDER_SUGGESTIONS=4                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/till/till.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.till.till/till.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     XXX currency, 5000 … 1 catalog, 5 tender suggestions                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # till.toml
//! [currency]
//! code = "EUR"
//! symbol = "€"
//!
//! [tender]
//! max_suggestions = 5
//!
//! [[denominations]]
//! face_value = 5000
//! kind = "note"
//! label = "50"
//!
//! [[denominations]]
//! face_value = 1
//! kind = "coin"
//! label = "0.01"
//! ```
//!
//! Amounts are whole base units, the same as everywhere in the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use till_core::{
    suggest_tender_amounts, Denomination, DenominationCatalog, DenominationKind, Money,
};

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE_NAME: &str = "till.toml";

// =============================================================================
// Currency
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// ISO 4217 code. "XXX" means "no particular currency".
    #[serde(default = "default_currency_code")]
    pub code: String,

    /// Display symbol; the engine itself never formats amounts.
    #[serde(default)]
    pub symbol: String,
}

fn default_currency_code() -> String {
    "XXX".to_string()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            code: default_currency_code(),
            symbol: String::new(),
        }
    }
}

// =============================================================================
// Tender
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderSettings {
    /// Quick-tender buttons shown on the payment screen.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestions() -> usize {
    till_core::MAX_TENDER_SUGGESTIONS
}

impl Default for TenderSettings {
    fn default() -> Self {
        TenderSettings {
            max_suggestions: default_max_suggestions(),
        }
    }
}

// =============================================================================
// Denominations
// =============================================================================

fn default_denominations() -> Vec<Denomination> {
    vec![
        Denomination::note(5000, "5000"),
        Denomination::note(2000, "2000"),
        Denomination::note(1000, "1000"),
        Denomination::note(500, "500"),
        Denomination::coin(100, "100"),
        Denomination::coin(50, "50"),
        Denomination::coin(25, "25"),
        Denomination::coin(10, "10"),
        Denomination::coin(5, "5"),
        Denomination::coin(1, "1"),
    ]
}

/// Parses `face[:kind]` entries separated by commas. Kind defaults to coin.
fn parse_denomination_list(raw: &str) -> ConfigResult<Vec<Denomination>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (face, kind) = match entry.split_once(':') {
                Some((face, kind)) => (face.trim(), Some(kind.trim())),
                None => (entry, None),
            };

            let face_value: i64 = face.parse().map_err(|_| {
                ConfigError::InvalidConfig(format!("denomination '{}' is not an integer", face))
            })?;
            let kind = match kind.map(str::to_lowercase).as_deref() {
                None | Some("coin") => DenominationKind::Coin,
                Some("note") => DenominationKind::Note,
                Some(other) => {
                    return Err(ConfigError::InvalidConfig(format!(
                        "denomination kind '{}' must be note or coin",
                        other
                    )))
                }
            };

            Ok(Denomination {
                face_value: Money::from_units(face_value),
                kind,
                label: face.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub tender: TenderSettings,

    /// Notes and coins in circulation, any order.
    #[serde(default = "default_denominations")]
    pub denominations: Vec<Denomination>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            currency: CurrencySettings::default(),
            tender: TenderSettings::default(),
            denominations: default_denominations(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (till.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading till config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load till config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Till config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let code = &self.currency.code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidConfig(format!(
                "currency code must be three uppercase letters, got: {}",
                code
            )));
        }

        if self.tender.max_suggestions == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_suggestions must be greater than 0".into(),
            ));
        }

        self.catalog()?;
        Ok(())
    }

    /// Builds the validated, largest-first catalog for change making.
    pub fn catalog(&self) -> ConfigResult<DenominationCatalog> {
        Ok(DenominationCatalog::new(self.denominations.clone())?)
    }

    /// Quick-tender amounts for `amount_due`, capped by `max_suggestions`.
    pub fn tender_suggestions(&self, amount_due: Money) -> ConfigResult<Vec<Money>> {
        let catalog = self.catalog()?;
        Ok(suggest_tender_amounts(
            amount_due,
            &catalog,
            self.tender.max_suggestions,
        ))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TILL_*` overrides read through `lookup`. Unparsable values
    /// are logged and skipped.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(code) = lookup("TILL_CURRENCY_CODE") {
            debug!(code = %code, "Overriding currency code from environment");
            self.currency.code = code.trim().to_uppercase();
        }

        if let Some(symbol) = lookup("TILL_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(raw) = lookup("TILL_DENOMINATIONS") {
            match parse_denomination_list(&raw) {
                Ok(list) => {
                    debug!(count = list.len(), "Overriding denominations from environment");
                    self.denominations = list;
                }
                Err(e) => warn!(value = %raw, error = %e, "Ignoring TILL_DENOMINATIONS"),
            }
        }

        if let Some(raw) = lookup("TILL_MAX_TENDER_SUGGESTIONS") {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.tender.max_suggestions = n,
                Err(_) => warn!(value = %raw, "Ignoring TILL_MAX_TENDER_SUGGESTIONS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "till")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use till_core::compute_change;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.currency.code, "XXX");
        assert_eq!(config.tender.max_suggestions, 5);
        assert!(config.validate().is_ok());

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.smallest().map(|d| d.face_value.units()), Some(1));
    }

    #[test]
    fn test_default_catalog_makes_change() {
        let catalog = EngineConfig::default().catalog().unwrap();
        let change =
            compute_change(Money::from_units(10_000), Money::from_units(7350), &catalog).unwrap();
        assert_eq!(change.total().units(), 2650);
        assert_eq!(change.note_count(), 2);
        assert_eq!(change.coin_count(), 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.currency.code = "eur".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
        config.currency.code = "EUR".to_string();

        config.tender.max_suggestions = 0;
        assert!(config.validate().is_err());
        config.tender.max_suggestions = 3;

        config.denominations.push(Denomination::coin(50, "dup"));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCatalog(_))));

        config.denominations = vec![];
        assert!(config.validate().is_err());

        config.denominations = vec![Denomination::coin(0, "zero")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("TILL_CURRENCY_CODE", "eur"),
            ("TILL_CURRENCY_SYMBOL", "€"),
            ("TILL_DENOMINATIONS", "100:coin, 5000:note,1"),
            ("TILL_MAX_TENDER_SUGGESTIONS", "3"),
        ]);
        let mut config = EngineConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned());

        assert_eq!(config.currency.code, "EUR");
        assert_eq!(config.currency.symbol, "€");
        assert_eq!(config.tender.max_suggestions, 3);
        assert_eq!(config.denominations.len(), 3);
        assert_eq!(config.denominations[1].kind, DenominationKind::Note);
        assert_eq!(config.denominations[2].kind, DenominationKind::Coin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let vars = env(&[
            ("TILL_DENOMINATIONS", "100,abc"),
            ("TILL_MAX_TENDER_SUGGESTIONS", "many"),
        ]);
        let mut config = EngineConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned());
        assert_eq!(config, EngineConfig::default());

        assert!(parse_denomination_list("100:bill").is_err());
    }

    #[test]
    fn test_tender_suggestions_respect_limit() {
        let mut config = EngineConfig::default();
        config.tender.max_suggestions = 3;
        let amounts: Vec<i64> = config
            .tender_suggestions(Money::from_units(7350))
            .unwrap()
            .into_iter()
            .map(|m| m.units())
            .collect();
        assert_eq!(amounts, vec![7350, 7400, 7500]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = EngineConfig::default();
        config.currency.code = "GBP".to_string();
        config.denominations = vec![
            Denomination::note(2000, "£20"),
            Denomination::coin(100, "£1"),
            Denomination::coin(1, "1p"),
        ];
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[currency]"));
        assert!(contents.contains("[[denominations]]"));

        let loaded: EngineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[currency]\ncode = \"USD\"\nsymbol = \"$\"\n").unwrap();

        let config = EngineConfig::load(Some(path)).unwrap();
        assert_eq!(config.currency.symbol, "$");
        assert_eq!(config.denominations, default_denominations());
    }

    #[test]
    fn test_broken_file_reports_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[currency\ncode = ").unwrap();

        assert!(matches!(
            EngineConfig::load(Some(path.clone())),
            Err(ConfigError::LoadFailed(_))
        ));
        assert_eq!(
            EngineConfig::load_or_default(Some(path)).tender.max_suggestions,
            5
        );
    }
}
