// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::Config;
use crate::models::RateTable;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_REFERENCE_CURRENCY: &str = "USD";
pub const DEFAULT_FALLBACK_RATE: f64 = 1.5;

/// What to do when source and target are the same currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameCurrencyPolicy {
    /// Always 1.0
    #[default]
    Identity,
    /// No special case: the pair goes through the chain and usually ends
    /// on the fallback rate
    Fallback,
}

/// Which step of the chain produced a rate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RateSource {
    Identity,
    Direct,
    Inverse,
    Triangulated { via: String },
    Fallback,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Identity => write!(f, "identity"),
            RateSource::Direct => write!(f, "direct"),
            RateSource::Inverse => write!(f, "inverse"),
            RateSource::Triangulated { via } => write!(f, "triangulated via {}", via),
            RateSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub source: RateSource,
}

impl ResolvedRate {
    fn new(rate: f64, source: RateSource) -> Self {
        Self { rate, source }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

/// What the strategies look at: a borrowed table plus the chain settings
struct Chain<'a> {
    table: &'a RateTable,
    references: &'a [String],
    same_currency: SameCurrencyPolicy,
}

type Strategy = fn(&Chain, &str, &str) -> Option<ResolvedRate>;

/// Tried in order, first hit wins. The fallback rate covers everything else.
const STRATEGIES: [Strategy; 4] = [same_currency, direct, inverse, triangulated];

fn same_currency(chain: &Chain, from: &str, to: &str) -> Option<ResolvedRate> {
    match chain.same_currency {
        SameCurrencyPolicy::Identity if from == to => {
            Some(ResolvedRate::new(1.0, RateSource::Identity))
        }
        _ => None,
    }
}

fn direct(chain: &Chain, from: &str, to: &str) -> Option<ResolvedRate> {
    chain
        .table
        .get(from, to)
        .map(|rate| ResolvedRate::new(rate, RateSource::Direct))
}

fn inverse(chain: &Chain, from: &str, to: &str) -> Option<ResolvedRate> {
    chain
        .table
        .get(to, from)
        .map(|rate| ResolvedRate::new(1.0 / rate, RateSource::Inverse))
}

fn triangulated(chain: &Chain, from: &str, to: &str) -> Option<ResolvedRate> {
    chain
        .references
        .iter()
        .filter(|reference| from != reference.as_str() && to != reference.as_str())
        .find_map(|reference| {
            let first_leg = chain.table.get(from, reference)?;
            let second_leg = chain.table.get(reference, to)?;
            Some(ResolvedRate::new(
                first_leg * second_leg,
                RateSource::Triangulated {
                    via: reference.clone(),
                },
            ))
        })
}

fn resolve_chain(chain: &Chain, fallback_rate: f64, from: &str, to: &str) -> ResolvedRate {
    if let Some(resolved) = STRATEGIES.iter().find_map(|strategy| strategy(chain, from, to)) {
        return resolved;
    }

    tracing::debug!(
        "No exchange rate found for {}/{}, using fallback rate {}",
        from,
        to,
        fallback_rate
    );
    ResolvedRate::new(fallback_rate, RateSource::Fallback)
}

/// Resolves exchange rates against a sparse [`RateTable`].
///
/// The chain is: same currency (policy dependent), direct entry, inverse of
/// the opposite entry, triangulation through each reference currency, and
/// finally a constant fallback rate. Resolution never fails.
#[derive(Debug, Clone)]
pub struct RateResolver {
    table: RateTable,
    references: Vec<String>,
    fallback_rate: f64,
    same_currency: SameCurrencyPolicy,
}

impl RateResolver {
    pub fn new(table: RateTable) -> Self {
        Self {
            table,
            references: vec![DEFAULT_REFERENCE_CURRENCY.to_string()],
            fallback_rate: DEFAULT_FALLBACK_RATE,
            same_currency: SameCurrencyPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rates.clone())
            .with_references(
                config
                    .reference_currencies
                    .iter()
                    .map(|code| code.to_string())
                    .collect(),
            )
            .with_fallback_rate(config.fallback_rate)
            .with_same_currency_policy(config.same_currency)
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    pub fn with_fallback_rate(mut self, fallback_rate: f64) -> Self {
        self.fallback_rate = fallback_rate;
        self
    }

    pub fn with_same_currency_policy(mut self, policy: SameCurrencyPolicy) -> Self {
        self.same_currency = policy;
        self
    }

    fn chain(&self) -> Chain<'_> {
        Chain {
            table: &self.table,
            references: &self.references,
            same_currency: self.same_currency,
        }
    }

    pub fn resolve(&self, from: &str, to: &str) -> ResolvedRate {
        resolve_chain(&self.chain(), self.fallback_rate, from, to)
    }
}

/// Resolve `from -> to` with the default chain settings: USD as the
/// reference currency, 1.5 as the fallback rate, 1.0 for same-currency pairs.
pub fn resolve_rate(from: &str, to: &str, table: &RateTable) -> f64 {
    let references = [DEFAULT_REFERENCE_CURRENCY.to_string()];
    let chain = Chain {
        table,
        references: &references,
        same_currency: SameCurrencyPolicy::default(),
    };
    resolve_chain(&chain, DEFAULT_FALLBACK_RATE, from, to).rate
}
