// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::ConverterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

/// Every currency the converter offers, in dropdown order.
pub static CURRENCIES: [Currency; 10] = [
    Currency { code: "USD", name: "US Dollar", flag: "🇺🇸" },
    Currency { code: "EUR", name: "Euro", flag: "🇪🇺" },
    Currency { code: "GBP", name: "British Pound", flag: "🇬🇧" },
    Currency { code: "JPY", name: "Japanese Yen", flag: "🇯🇵" },
    Currency { code: "AUD", name: "Australian Dollar", flag: "🇦🇺" },
    Currency { code: "CAD", name: "Canadian Dollar", flag: "🇨🇦" },
    Currency { code: "CHF", name: "Swiss Franc", flag: "🇨🇭" },
    Currency { code: "CNY", name: "Chinese Yuan", flag: "🇨🇳" },
    Currency { code: "INR", name: "Indian Rupee", flag: "🇮🇳" },
    Currency { code: "BRL", name: "Brazilian Real", flag: "🇧🇷" },
];

/// Look up a currency by its exact code
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code)
}

impl Currency {
    /// Label shown in the currency selectors, e.g. `🇺🇸 USD - US Dollar`
    pub fn option_label(&self) -> String {
        format!("{} {} - {}", self.flag, self.code, self.name)
    }
}

/// A currency code known to be in [`CURRENCIES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(input: &str) -> Result<Self, ConverterError> {
        let code = input.trim().to_uppercase();
        match find_currency(&code) {
            Some(currency) => Ok(CurrencyCode(currency.code.to_string())),
            None => Err(ConverterError::UnknownCurrency(input.trim().to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn currency(&self) -> &'static Currency {
        // Construction guarantees the code is in the catalogue.
        find_currency(&self.0).unwrap_or(&CURRENCIES[0])
    }
}

impl FromStr for CurrencyCode {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConverterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
