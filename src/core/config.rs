use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.nbp.pl/api";
/// Upper bound for `defaults.period_days`, about a century.
pub const MAX_PERIOD_DAYS: u32 = 36_600;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub amount: Decimal,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Length of the history window in days.
    pub period_days: u32,
    /// Fractional digits shown for converted amounts.
    pub precision: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            amount: Decimal::ONE,
            from: CurrencyCode::USD,
            to: CurrencyCode::PLN,
            period_days: 90,
            precision: 2,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in defaults.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("pl", "nbpfx", "nbpfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.defaults.amount <= Decimal::ZERO {
            anyhow::bail!("defaults.amount must be greater than zero");
        }
        if self.defaults.period_days == 0 {
            anyhow::bail!("defaults.period_days must be at least 1");
        }
        if self.defaults.period_days > MAX_PERIOD_DAYS {
            anyhow::bail!("defaults.period_days must be at most {MAX_PERIOD_DAYS}");
        }
        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.provider.base_url, "https://api.nbp.pl/api");
        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.defaults.amount, Decimal::ONE);
        assert_eq!(config.defaults.from.as_str(), "USD");
        assert_eq!(config.defaults.to, CurrencyCode::PLN);
        assert_eq!(config.defaults.period_days, 90);
        assert_eq!(config.defaults.precision, 2);
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
provider:
  base_url: "http://localhost:8080/api"
defaults:
  amount: 250.5
  from: eur
  to: CHF
  precision: 4
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.provider.base_url, "http://localhost:8080/api");
        // Unset keys keep their defaults
        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.defaults.amount, dec!(250.5));
        assert_eq!(config.defaults.from.as_str(), "EUR");
        assert_eq!(config.defaults.to.as_str(), "CHF");
        assert_eq!(config.defaults.period_days, 90);
        assert_eq!(config.defaults.precision, 4);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_currency_is_rejected() {
        let yaml_str = "defaults:\n  from: dollars\n";
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }

    #[test]
    fn test_load_from_path_validates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "defaults:\n  period_days: 0\n").unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("period_days"));

        fs::write(&path, "defaults:\n  period_days: 4000000000\n").unwrap();
        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("at most 36600"));

        let err = AppConfig::load_from_path(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
