//! Trip Planner - budget-aware grocery trip planning
//!
//! Turns a dish, a head count, a budget and a shopping location into a
//! store-specific shopping list. Ingredient lists and per-store prices come
//! from a remote planning backend; locations come from a geocoder and are
//! restricted to one configured region.
//!
//! # Core Concepts
//!
//! - **One session**: every component reads and writes a single session
//!   record owned by an actor ([`session::SessionManager`])
//! - **Latest request wins**: asynchronous results carry a ticket and are
//!   dropped if a newer request or a restart replaced them
//! - **Pure basket rules**: basket edits are plain functions over the record
//!
//! # Modules
//!
//! - [`domain`] - Value types shared by every component
//! - [`session`] - Session actor with staleness tracking
//! - [`services`] - Remote service traits and HTTP clients
//! - [`address`] - Location resolution and region checks
//! - [`basket`] - Basket editing
//! - [`recommend`] - Pricing requests, store leaderboard, budget verdicts
//! - [`planner`] - Facade used by the CLI and the shell
//! - [`export`] - Summary and breakdown read models
//! - [`config`] - Configuration types and loading
//! - [`cli`], [`render`], [`repl`] - Terminal front ends

pub mod address;
pub mod basket;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod planner;
pub mod recommend;
pub mod render;
pub mod repl;
pub mod services;
pub mod session;

pub use config::Config;
pub use planner::{Component, Outcome, PlanError, TripPlanner};
