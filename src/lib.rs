// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod config;
pub mod currencies;
pub mod error;
pub mod exchange_rates;
pub mod models;
pub mod utils;
pub mod widget;

pub use currencies::{resolve_rate, RateResolver, RateSource, ResolvedRate, SameCurrencyPolicy};
pub use error::ConverterError;
pub use exchange_rates::RateService;
