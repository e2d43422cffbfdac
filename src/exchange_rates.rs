// SPDX-FileCopyrightText: 2025 Joost van der Laan
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::{Config, DelayConfig};
use crate::currencies::{RateResolver, ResolvedRate};
use crate::error::ConverterError;
use crate::models::{CurrencyCode, CURRENCIES};
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

/// Mock exchange-rate API: validates the currency codes, waits an
/// artificial delay and resolves against the local rate table.
#[derive(Debug, Clone)]
pub struct RateService {
    resolver: RateResolver,
    delay: DelayConfig,
}

impl RateService {
    pub fn new(resolver: RateResolver, delay: DelayConfig) -> Self {
        Self { resolver, delay }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(RateResolver::from_config(config), config.delay)
    }

    pub fn resolver(&self) -> &RateResolver {
        &self.resolver
    }

    pub async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ResolvedRate, ConverterError> {
        let from = CurrencyCode::parse(from)?;
        let to = CurrencyCode::parse(to)?;

        let delay = self.delay.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let resolved = self.resolver.resolve(from.as_str(), to.as_str());
        if resolved.is_fallback() {
            tracing::warn!(
                "⚠️  No conversion rate found for {} to {}, using fallback rate {}",
                from,
                to,
                resolved.rate
            );
        }
        Ok(resolved)
    }
}

/// Export the resolved rate of every currency pair to CSV
pub fn export_rate_matrix_csv(resolver: &RateResolver, output_dir: &Path) -> Result<PathBuf> {
    // Create output directory if it doesn't exist
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let csv_path = output_dir.join(format!("exchange_rates_{}.csv", timestamp));
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record(["From", "To", "Rate", "Inverse", "Source"])?;

    for from in CURRENCIES.iter() {
        for to in CURRENCIES.iter() {
            let resolved = resolver.resolve(from.code, to.code);
            writer.write_record([
                from.code.to_string(),
                to.code.to_string(),
                resolved.rate.to_string(),
                (1.0 / resolved.rate).to_string(),
                resolved.source.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    tracing::info!("✅ Exchange rates written to {}", csv_path.display());

    Ok(csv_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::RateSource;
    use crate::models::sample_rate_table;
    use approx::assert_relative_eq;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn instant_service() -> RateService {
        RateService::new(RateResolver::new(sample_rate_table()), DelayConfig::none())
    }

    #[tokio::test]
    async fn test_get_exchange_rate() -> Result<()> {
        let service = instant_service();

        let resolved = service.get_exchange_rate("USD", "EUR").await?;
        assert_eq!(resolved.source, RateSource::Direct);
        assert_relative_eq!(resolved.rate, 0.92);

        // Codes are normalised before lookup
        let resolved = service.get_exchange_rate("eur", " usd").await?;
        assert_relative_eq!(resolved.rate, 1.09);

        let resolved = service.get_exchange_rate("GBP", "JPY").await?;
        assert!(resolved.is_fallback());
        assert_relative_eq!(resolved.rate, 1.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_lowercase_table_codes_resolve() -> Result<()> {
        let table: crate::models::RateTable = toml::from_str("[gbp]\njpy = 190.0\n")?;
        let service = RateService::new(RateResolver::new(table), DelayConfig::none());

        let resolved = service.get_exchange_rate("gbp", "jpy").await?;
        assert_eq!(resolved.source, RateSource::Direct);
        assert_relative_eq!(resolved.rate, 190.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_currency_is_an_error() {
        let service = instant_service();

        let err = service.get_exchange_rate("USD", "XXX").await.unwrap_err();
        assert_eq!(err, ConverterError::UnknownCurrency("XXX".to_string()));

        let err = service.get_exchange_rate("BTC", "USD").await.unwrap_err();
        assert_eq!(err, ConverterError::UnknownCurrency("BTC".to_string()));
    }

    #[tokio::test]
    async fn test_artificial_delay() -> Result<()> {
        let delay = DelayConfig {
            min_ms: 30,
            jitter_ms: 0,
        };
        let service = RateService::new(RateResolver::new(sample_rate_table()), delay);

        let started = Instant::now();
        service.get_exchange_rate("USD", "INR").await?;
        assert!(started.elapsed() >= Duration::from_millis(30));

        Ok(())
    }

    #[test]
    fn test_export_rate_matrix_csv() -> Result<()> {
        let dir = tempdir()?;
        let output_dir = dir.path().join("output");
        let resolver = RateResolver::new(sample_rate_table());

        let csv_path = export_rate_matrix_csv(&resolver, &output_dir)?;
        assert!(csv_path.starts_with(&output_dir));

        let mut reader = csv::Reader::from_path(&csv_path)?;
        let headers = reader.headers()?.clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["From", "To", "Rate", "Inverse", "Source"]
        );

        let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
        assert_eq!(records.len(), CURRENCIES.len() * CURRENCIES.len());

        let usd_eur = records
            .iter()
            .find(|r| &r[0] == "USD" && &r[1] == "EUR")
            .expect("USD/EUR row");
        assert_relative_eq!(usd_eur[2].parse::<f64>()?, 0.92);
        assert_eq!(&usd_eur[4], "direct");

        let usd_usd = records
            .iter()
            .find(|r| &r[0] == "USD" && &r[1] == "USD")
            .expect("USD/USD row");
        assert_eq!(&usd_usd[4], "identity");

        Ok(())
    }
}
