//! Render-independent read models for presentation and export
//!
//! Nothing here knows about terminals or images; the structures serialize
//! to JSON so an external tool can rasterize them.

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{BudgetVerdict, RecommendationResult, SessionRecord, StoreLeaderboardEntry};

/// One labelled value of the submission summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

impl DataPoint {
    fn new(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// What the user has entered so far, in display order, unset values omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub session_id: String,
    pub points: Vec<DataPoint>,
}

impl PlanSummary {
    pub fn from_record(record: &SessionRecord) -> Self {
        let mut points = Vec::new();
        if !record.dish.is_empty() {
            points.push(DataPoint::new("Dish", &record.dish));
        }
        if let Some(people) = record.people_count {
            points.push(DataPoint::new("People", people));
        }
        if let Some(budget) = record.budget {
            points.push(DataPoint::new("Budget", format!("{:.2}", budget)));
        }
        if let Some(address) = &record.address {
            points.push(DataPoint::new("Address", &address.text));
            points.push(DataPoint::new("Latitude", format!("{:.6}", address.lat)));
            points.push(DataPoint::new("Longitude", format!("{:.6}", address.lng)));
        }
        Self {
            session_id: record.id.clone(),
            points,
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.points.iter().find(|p| p.label == label).map(|p| p.value.as_str())
    }
}

/// One ingredient line of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub name: String,
    pub quantity: String,
    /// Basket count, if the item is in the basket
    pub count: Option<u32>,
    /// One cell per store, in `Breakdown::stores` order
    pub prices: Vec<Option<f64>>,
    pub cheapest_store: String,
    pub cheapest_price: Option<f64>,
}

/// Full pricing breakdown backing the results view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub session_id: String,
    pub dish: String,
    pub people_count: Option<u32>,
    pub address: Option<String>,
    /// Store columns in leaderboard order
    pub stores: Vec<String>,
    pub rows: Vec<BreakdownRow>,
    /// Store suggested by the pricing service
    pub recommended_store: String,
    /// Store whose total is currently shown
    pub active_store: Option<String>,
    pub leaderboard: Vec<StoreLeaderboardEntry>,
    pub verdict: Option<BudgetVerdict>,
}

impl Breakdown {
    pub fn build(
        record: &SessionRecord,
        result: &RecommendationResult,
        leaderboard: &[StoreLeaderboardEntry],
        active_store: Option<&str>,
        verdict: Option<BudgetVerdict>,
    ) -> Self {
        debug!(rows = result.ingredients.len(), stores = leaderboard.len(), "Breakdown::build: called");
        let stores: Vec<String> = leaderboard.iter().map(|e| e.store.clone()).collect();
        let rows = result
            .ingredients
            .iter()
            .map(|ingredient| BreakdownRow {
                name: ingredient.name.clone(),
                quantity: ingredient.quantity.clone(),
                count: record.basket_item(&ingredient.name).map(|item| item.count),
                prices: stores
                    .iter()
                    .map(|store| ingredient.prices.get(store).copied().flatten())
                    .collect(),
                cheapest_store: ingredient.cheapest_store.clone(),
                cheapest_price: ingredient.cheapest_price,
            })
            .collect();

        Self {
            session_id: record.id.clone(),
            dish: record.dish.clone(),
            people_count: record.people_count,
            address: record.address.as_ref().map(|a| a.text.clone()),
            stores,
            rows,
            recommended_store: result.recommended_store.clone(),
            active_store: active_store.map(str::to_string),
            leaderboard: leaderboard.to_vec(),
            verdict,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize breakdown")
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?).context(format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Breakdown exported");
        Ok(())
    }
}
