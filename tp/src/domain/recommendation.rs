//! Recommendation payload, leaderboard entries, budget verdict, money helpers
//!
//! The pricing service is a black box. Its payload is ingested leniently:
//! prices may arrive as numbers, currency strings ("₱1,250.00") or null.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::session::de_quantity;

/// Result of one successful pricing call; replaced wholesale on the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Store suggested by the service (not necessarily the cheapest by client-side totals)
    #[serde(default)]
    pub recommended_store: String,

    #[serde(default, deserialize_with = "de_amount")]
    pub total_cost: f64,

    #[serde(default)]
    pub within_budget: bool,

    /// Service-side adjusted budget; the service may send null
    #[serde(default, deserialize_with = "de_price")]
    pub adjusted_budget: Option<f64>,

    #[serde(default)]
    pub ingredients: Vec<PricedIngredient>,
}

/// One basket line as priced by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedIngredient {
    pub name: String,

    #[serde(default, deserialize_with = "de_quantity")]
    pub quantity: String,

    /// Price per store; `None` means the store was not evaluated for this item
    #[serde(default, deserialize_with = "de_prices")]
    pub prices: BTreeMap<String, Option<f64>>,

    #[serde(default)]
    pub cheapest_store: String,

    #[serde(default, deserialize_with = "de_price")]
    pub cheapest_price: Option<f64>,
}

impl PricedIngredient {
    /// Price at `store`, with a missing or null price counting as zero
    pub fn price_at(&self, store: &str) -> f64 {
        self.prices.get(store).copied().flatten().unwrap_or(0.0)
    }
}

/// A store and its basket total (derived, never persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLeaderboardEntry {
    pub store: String,
    pub total: f64,
}

/// Budget status for the active store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVerdict {
    pub store: String,

    pub total: f64,

    pub budget: f64,

    /// `total <= budget`
    pub within_budget: bool,

    /// Signed `budget - total`; negative when over budget
    pub difference: f64,
}

impl BudgetVerdict {
    pub fn evaluate(store: impl Into<String>, total: f64, budget: f64) -> Self {
        let store = store.into();
        // Only the total is rounded; the budget is compared exactly as entered
        let total = round_cents(total);
        let within_budget = total <= budget;
        let difference = round_cents(budget - total);
        debug!(%store, total, budget, within_budget, "BudgetVerdict::evaluate: called");
        Self {
            store,
            total,
            budget,
            within_budget,
            difference,
        }
    }

    /// Amount over budget, if any
    pub fn overage(&self) -> Option<f64> {
        if self.within_budget { None } else { Some(-self.difference) }
    }

    /// Amount left over, if within budget
    pub fn remaining(&self) -> Option<f64> {
        if self.within_budget { Some(self.difference) } else { None }
    }
}

/// Round to whole cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a price string such as "₱1,250.50", "PHP 42" or "19.99"
///
/// Returns `None` for empty, negative or unparseable input.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("PHP")
        .chars()
        .filter(|c| !matches!(c, '₱' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(round_cents(value))
    } else {
        debug!(%raw, "parse_price: rejected value");
        None
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
    Null(()),
}

impl RawPrice {
    fn normalize(self) -> Option<f64> {
        match self {
            RawPrice::Number(n) if n.is_finite() && n >= 0.0 => Some(round_cents(n)),
            RawPrice::Number(_) => None,
            RawPrice::Text(s) => parse_price(&s),
            RawPrice::Null(()) => None,
        }
    }
}

fn de_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawPrice::deserialize(deserializer)?.normalize())
}

fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_price(deserializer)?.unwrap_or(0.0))
}

fn de_prices<'de, D>(deserializer: D) -> Result<BTreeMap<String, Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, RawPrice>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(store, price)| (store, price.normalize()))
        .collect())
}
