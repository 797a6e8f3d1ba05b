//! SessionRecord - the single in-progress planning session
//!
//! Holds everything the flow has gathered so far. Fields are permissive:
//! a half-filled record is valid and displayable mid-flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::geo::Address;
use super::recommendation::RecommendationResult;

/// A source ingredient as produced by the generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,

    /// Free-form amount ("1kg", "6 pcs"); numbers from the service are stringified
    #[serde(default, deserialize_with = "de_quantity")]
    pub quantity: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
        }
    }
}

/// A line in the shopping basket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub name: String,

    pub quantity: String,

    /// Number of units to buy, never below 1
    pub count: u32,
}

impl BasketItem {
    /// A fresh basket line with `count = 1`
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity.clone(),
            count: 1,
        }
    }
}

/// Named fields of the session record, used in change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionField {
    Dish,
    PeopleCount,
    Budget,
    Address,
    GeneratedIngredients,
    Basket,
    Recommendation,
}

impl std::fmt::Display for SessionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dish => "dish",
            Self::PeopleCount => "people_count",
            Self::Budget => "budget",
            Self::Address => "address",
            Self::GeneratedIngredients => "generated_ingredients",
            Self::Basket => "basket",
            Self::Recommendation => "recommendation",
        };
        write!(f, "{}", name)
    }
}

/// The planning session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier, regenerated on restart
    pub id: String,

    pub started_at: DateTime<Utc>,

    /// Desired dish; empty means unset
    pub dish: String,

    pub people_count: Option<u32>,

    pub budget: Option<f64>,

    pub address: Option<Address>,

    /// Source list from the generation service, plus custom additions
    ///
    /// Names may repeat.
    pub generated_ingredients: Vec<Ingredient>,

    /// Basket lines; names are unique
    pub basket: Vec<BasketItem>,

    pub recommendation: Option<RecommendationResult>,
}

impl SessionRecord {
    /// Create an empty record with a fresh id
    pub fn new() -> Self {
        let id = Uuid::now_v7().to_string();
        debug!(%id, "SessionRecord::new: called");
        Self {
            id,
            started_at: Utc::now(),
            dish: String::new(),
            people_count: None,
            budget: None,
            address: None,
            generated_ingredients: Vec::new(),
            basket: Vec::new(),
            recommendation: None,
        }
    }

    pub fn basket_item(&self, name: &str) -> Option<&BasketItem> {
        self.basket.iter().find(|item| item.name == name)
    }

    pub fn in_basket(&self, name: &str) -> bool {
        self.basket_item(name).is_some()
    }

    /// First source ingredient with the given name
    pub fn ingredient(&self, name: &str) -> Option<&Ingredient> {
        self.generated_ingredients.iter().find(|i| i.name == name)
    }

    /// True when nothing has been entered yet
    pub fn is_blank(&self) -> bool {
        self.dish.is_empty()
            && self.people_count.is_none()
            && self.budget.is_none()
            && self.address.is_none()
            && self.generated_ingredients.is_empty()
            && self.basket.is_empty()
            && self.recommendation.is_none()
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn de_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
