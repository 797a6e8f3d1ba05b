//! Store pricing reconciliation
//!
//! `leaderboard` holds the pure ranking and verdict functions; the
//! reconciler runs the request cycle and tracks the active store.

pub mod leaderboard;
mod reconciler;

pub use leaderboard::{compute_leaderboard, known_stores, store_total, verdict_for};
pub use reconciler::{ReconcileError, ReconcilePhase, RecommendationReconciler};
