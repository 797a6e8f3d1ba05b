//! Shopping basket derived from the generated ingredient list
//!
//! `ops` holds the pure record transformations; `BasketManager` runs them
//! atomically inside the session actor.

mod manager;
pub mod ops;

pub use manager::{BasketError, BasketManager};
