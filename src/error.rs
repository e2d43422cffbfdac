// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConverterError {
    #[error("Please enter a valid number")]
    InvalidNumber,

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Invalid exchange rate {rate} for {from}/{to}: rates must be positive")]
    InvalidRate { from: String, to: String, rate: f64 },

    #[error("Invalid fallback rate {0}: must be positive")]
    InvalidFallbackRate(f64),
}

impl ConverterError {
    /// Errors whose message is meant to be shown as-is in the result area.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ConverterError::InvalidNumber
                | ConverterError::NonPositiveAmount
                | ConverterError::UnknownCurrency(_)
        )
    }
}
