// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::Config;
use crate::currencies::RateSource;
use crate::error::ConverterError;
use crate::exchange_rates::RateService;
use crate::models::{CurrencyCode, CURRENCIES};
use crate::utils::format_grouped;
use chrono::{DateTime, Local};

pub const GENERIC_ERROR_MESSAGE: &str = "Error converting currency. Please try again.";

/// Shown while a conversion is waiting on the rate service
pub trait LoadingIndicator {
    fn show_loading(&mut self, loading: bool);
}

impl LoadingIndicator for () {
    fn show_loading(&mut self, _loading: bool) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub value: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
    pub source: RateSource,
    pub converted: f64,
    pub updated_at: DateTime<Local>,
}

/// State of the converter form: the two currency selectors and the amount
/// field, plus the rate service conversions go through.
#[derive(Debug, Clone)]
pub struct ConverterWidget {
    service: RateService,
    from: CurrencyCode,
    to: CurrencyCode,
    amount: String,
}

impl ConverterWidget {
    pub fn new(service: RateService, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self {
            service,
            from,
            to,
            amount: String::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RateService::from_config(config),
            config.default_from.clone(),
            config.default_to.clone(),
        )
    }

    /// Options for both currency selectors, in catalogue order
    pub fn dropdown_options() -> Vec<DropdownOption> {
        CURRENCIES
            .iter()
            .map(|currency| DropdownOption {
                value: currency.code,
                label: currency.option_label(),
            })
            .collect()
    }

    pub fn from_currency(&self) -> &CurrencyCode {
        &self.from
    }

    pub fn to_currency(&self) -> &CurrencyCode {
        &self.to
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn select_from(&mut self, code: &str) -> Result<(), ConverterError> {
        self.from = CurrencyCode::parse(code)?;
        Ok(())
    }

    pub fn select_to(&mut self, code: &str) -> Result<(), ConverterError> {
        self.to = CurrencyCode::parse(code)?;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    /// Swap source and target. Returns true when there is an amount to
    /// convert again.
    pub fn swap(&mut self) -> bool {
        std::mem::swap(&mut self.from, &mut self.to);
        !self.amount.is_empty()
    }

    pub async fn convert(
        &mut self,
        indicator: &mut dyn LoadingIndicator,
    ) -> Result<Conversion, ConverterError> {
        let amount = validate_amount(&self.amount)?;

        indicator.show_loading(true);
        let resolved = self
            .service
            .get_exchange_rate(self.from.as_str(), self.to.as_str())
            .await;
        indicator.show_loading(false);
        let resolved = resolved?;

        let conversion = Conversion {
            amount,
            from: self.from.clone(),
            to: self.to.clone(),
            rate: resolved.rate,
            source: resolved.source,
            converted: amount * resolved.rate,
            updated_at: Local::now(),
        };
        tracing::debug!(
            "Converted {} {} to {} {} at {} ({})",
            conversion.amount,
            conversion.from,
            conversion.converted,
            conversion.to,
            conversion.rate,
            conversion.source
        );
        Ok(conversion)
    }
}

/// Parse the amount field. Must be a finite number greater than zero.
pub fn validate_amount(input: &str) -> Result<f64, ConverterError> {
    let amount = input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or(ConverterError::InvalidNumber)?;

    if amount <= 0.0 {
        return Err(ConverterError::NonPositiveAmount);
    }

    Ok(amount)
}

pub fn render_result(conversion: &Conversion) -> String {
    let from = conversion.from.currency();
    let to = conversion.to.currency();

    let mut lines = vec![
        format!(
            "{} {} {} = {} {:.2} {}",
            from.flag,
            format_grouped(conversion.amount),
            from.code,
            to.flag,
            conversion.converted,
            to.code
        ),
        format!("1 {} = {:.6} {}", from.code, conversion.rate, to.code),
        format!("1 {} = {:.6} {}", to.code, 1.0 / conversion.rate, from.code),
    ];
    if conversion.source == RateSource::Fallback {
        lines.push(format!(
            "Note: no rate data for {}/{}, a fallback rate was used",
            from.code, to.code
        ));
    }
    lines.push(format!(
        "Rates last updated: {}",
        conversion.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    lines.join("\n")
}

pub fn render_error(err: &ConverterError) -> String {
    if err.is_user_facing() {
        err.to_string()
    } else {
        tracing::error!("Conversion failed: {}", err);
        GENERIC_ERROR_MESSAGE.to_string()
    }
}
