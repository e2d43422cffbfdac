// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::ConverterError;
use crate::models::find_currency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Rows = BTreeMap<String, BTreeMap<String, f64>>;

/// Sparse `from -> to -> rate` table. A missing entry is not an error,
/// it just sends the resolver further down its chain.
///
/// Codes are stored trimmed and upper-cased, however they were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Rows", into = "Rows")]
pub struct RateTable {
    rates: Rows,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl From<Rows> for RateTable {
    fn from(rows: Rows) -> Self {
        let mut table = RateTable::new();
        for (from, row) in rows {
            for (to, rate) in row {
                table.insert(&from, &to, rate);
            }
        }
        table
    }
}

impl From<RateTable> for Rows {
    fn from(table: RateTable) -> Self {
        table.rates
    }
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: f64) {
        self.rates
            .entry(normalize_code(from))
            .or_default()
            .insert(normalize_code(to), rate);
    }

    /// Builder-style variant of [`RateTable::insert`]
    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.insert(from, to, rate);
        self
    }

    /// Usable rate for `from -> to`. Zero, negative and non-finite
    /// entries count as missing.
    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.rates
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tabulated `(from, to, rate)` entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.rates.iter().flat_map(|(from, row)| {
            row.iter()
                .map(move |(to, rate)| (from.as_str(), to.as_str(), *rate))
        })
    }

    /// Every code must be a known currency and every rate finite and
    /// strictly positive
    pub fn validate(&self) -> Result<(), ConverterError> {
        for (from, to, _) in self.iter() {
            for code in [from, to] {
                if find_currency(code).is_none() {
                    return Err(ConverterError::UnknownCurrency(code.to_string()));
                }
            }
        }

        match self.iter().find(|(_, _, rate)| !rate.is_finite() || *rate <= 0.0) {
            Some((from, to, rate)) => Err(ConverterError::InvalidRate {
                from: from.to_string(),
                to: to.to_string(),
                rate,
            }),
            None => Ok(()),
        }
    }
}

/// Built-in sample rates (as of 2023). Only USD, INR and EUR have rows.
pub fn sample_rate_table() -> RateTable {
    let rows: [(&str, &[(&str, f64)]); 3] = [
        (
            "USD",
            &[
                ("EUR", 0.92),
                ("GBP", 0.79),
                ("JPY", 150.25),
                ("AUD", 1.52),
                ("CAD", 1.36),
                ("CHF", 0.88),
                ("CNY", 7.15),
                ("INR", 83.50),
                ("BRL", 4.92),
            ],
        ),
        (
            "INR",
            &[
                ("USD", 0.012), // 1 INR = 0.012 USD
                ("EUR", 0.011),
                ("GBP", 0.0095),
                ("JPY", 1.80),
                ("AUD", 0.018),
                ("CAD", 0.016),
                ("CHF", 0.0105),
                ("CNY", 0.086),
                ("BRL", 0.059),
            ],
        ),
        (
            "EUR",
            &[
                ("USD", 1.09),
                ("INR", 89.75),
                ("GBP", 0.86),
                ("JPY", 163.30),
                ("AUD", 1.65),
                ("CAD", 1.48),
                ("CHF", 0.96),
                ("CNY", 7.77),
                ("BRL", 5.35),
            ],
        ),
    ];

    let mut table = RateTable::new();
    for (from, row) in rows {
        for &(to, rate) in row {
            table.insert(from, to, rate);
        }
    }
    table
}
