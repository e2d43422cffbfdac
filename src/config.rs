use crate::currencies::{SameCurrencyPolicy, DEFAULT_FALLBACK_RATE, DEFAULT_REFERENCE_CURRENCY};
use crate::error::ConverterError;
use crate::models::{sample_rate_table, CurrencyCode, RateTable};
use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_from: CurrencyCode,
    pub default_to: CurrencyCode,
    pub reference_currencies: Vec<CurrencyCode>,
    pub fallback_rate: f64,
    pub same_currency: SameCurrencyPolicy,
    pub delay: DelayConfig,
    pub rates: RateTable,
}

/// Artificial latency of the rate lookup, `min_ms` plus up to `jitter_ms`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub jitter_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: 800,
            jitter_ms: 400,
        }
    }
}

impl DelayConfig {
    pub fn none() -> Self {
        Self {
            min_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Pick a delay in `min_ms..=min_ms + jitter_ms`
    pub fn sample(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.min_ms + jitter)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_from: CurrencyCode::parse("USD").expect("USD is a known currency"),
            default_to: CurrencyCode::parse("INR").expect("INR is a known currency"),
            reference_currencies: vec![
                CurrencyCode::parse(DEFAULT_REFERENCE_CURRENCY).expect("USD is a known currency"),
            ],
            fallback_rate: DEFAULT_FALLBACK_RATE,
            same_currency: SameCurrencyPolicy::default(),
            delay: DelayConfig::default(),
            rates: sample_rate_table(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConverterError> {
        if !self.fallback_rate.is_finite() || self.fallback_rate <= 0.0 {
            return Err(ConverterError::InvalidFallbackRate(self.fallback_rate));
        }
        self.rates.validate()
    }
}

/// Load the config from `path`, or from `config.toml` in the working
/// directory when no path is given. Only the implicit file may be missing.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                load_config(&default_path)
            } else {
                tracing::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_from.as_str(), "USD");
        assert_eq!(config.default_to.as_str(), "INR");
        assert_eq!(config.reference_currencies.len(), 1);
        assert_eq!(config.reference_currencies[0].as_str(), "USD");
        assert_relative_eq!(config.fallback_rate, 1.5);
        assert_eq!(config.same_currency, SameCurrencyPolicy::Identity);
        assert_eq!(config.rates, sample_rate_table());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_config() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.default_to = CurrencyCode::parse("EUR")?;
        config.same_currency = SameCurrencyPolicy::Fallback;
        save_config(&config, &path)?;

        let loaded = load_config(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_config_uses_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            default_to = "gbp"
            same_currency = "fallback"

            [delay]
            min_ms = 10

            [rates.GBP]
            USD = 1.25
            "#,
        )?;

        let config = load_config(&path)?;
        assert_eq!(config.default_from.as_str(), "USD");
        assert_eq!(config.default_to.as_str(), "GBP");
        assert_eq!(config.same_currency, SameCurrencyPolicy::Fallback);
        assert_eq!(config.delay.min_ms, 10);
        assert_eq!(config.delay.jitter_ms, 400);
        assert_eq!(config.rates.len(), 1);
        assert_relative_eq!(config.rates.get("GBP", "USD").unwrap(), 1.25);
        Ok(())
    }

    #[test]
    fn test_invalid_configs_are_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        fs::write(&path, "default_from = \"XYZ\"\n")?;
        assert!(load_config(&path).is_err());

        fs::write(&path, "fallback_rate = 0.0\n")?;
        let err = load_config(&path).unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ConverterError::InvalidFallbackRate(0.0).to_string()
        );

        fs::write(&path, "[rates.USD]\nEUR = -0.92\n")?;
        assert!(load_config(&path).is_err());

        fs::write(&path, "reference_currencies = [\"XXX\"]\n")?;
        assert!(load_config(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_rate_table_codes_in_config() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        fs::write(&path, "[rates.gbp]\njpy = 190.0\n")?;
        let config = load_config(&path)?;
        assert_relative_eq!(config.rates.get("GBP", "JPY").unwrap(), 190.0);

        fs::write(&path, "[rates.GBP]\nJPY = 190.0\n\n[rates.XYZ]\nUSD = 2.0\n")?;
        let err = load_config(&path).unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ConverterError::UnknownCurrency("XYZ".to_string()).to_string()
        );
        Ok(())
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load(Some(&missing)).is_err());
    }

    #[test]
    fn test_delay_sample_range() {
        assert_eq!(DelayConfig::none().sample(), Duration::ZERO);

        let delay = DelayConfig {
            min_ms: 5,
            jitter_ms: 10,
        };
        for _ in 0..50 {
            let sampled = delay.sample();
            assert!(sampled >= Duration::from_millis(5));
            assert!(sampled <= Duration::from_millis(15));
        }
    }
}
