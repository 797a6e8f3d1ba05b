//! Domain types for the trip planner
//!
//! Plain data shared by every component: the session record, basket lines,
//! geographic types and the pricing payload. No behavior beyond small
//! accessors and lenient deserialization lives here.

mod failure;
mod geo;
mod recommendation;
mod session;

pub use failure::FailureKind;
pub use geo::{Address, BoundingBox, GeoPoint};
pub use recommendation::{
    BudgetVerdict, PricedIngredient, RecommendationResult, StoreLeaderboardEntry, parse_price, round_cents,
};
pub use session::{BasketItem, Ingredient, SessionField, SessionRecord};
