//! TripPlanner - facade over the planning pipeline
//!
//! Owns one session and the components that work on it, and records the
//! outcome of the last operation per component for display. Presentation
//! code (CLI, REPL) talks only to this type.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::address::{AddressResolver, ResolveError};
use crate::basket::{BasketError, BasketManager};
use crate::config::{Config, RegionConfig};
use crate::domain::{
    Address, BasketItem, BudgetVerdict, FailureKind, GeoPoint, Ingredient, RecommendationResult, SessionField,
    SessionRecord, StoreLeaderboardEntry,
};
use crate::export::{Breakdown, PlanSummary};
use crate::recommend::{ReconcileError, ReconcilePhase, RecommendationReconciler};
use crate::services::{GenerationRequest, IngredientGenerator, ServiceError, Services, create_services};
use crate::session::{Commit, SessionError, SessionManager, SessionUpdate, Slot};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("No dish entered")]
    MissingDish,

    #[error("Number of people must be at least 1")]
    InvalidPeopleCount,

    #[error("Ingredient generation failed: {0}")]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl PlanError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PlanError::MissingDish | PlanError::InvalidPeopleCount => FailureKind::InputValidation,
            PlanError::Service(e) => e.kind(),
            PlanError::Session(_) => FailureKind::Internal,
        }
    }
}

/// Pipeline component an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Ingredients,
    Address,
    Basket,
    Recommendation,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Ingredients => write!(f, "ingredients"),
            Component::Address => write!(f, "address"),
            Component::Basket => write!(f, "basket"),
            Component::Recommendation => write!(f, "recommendation"),
        }
    }
}

/// Result of the last operation on a component
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok,
    /// Finished, but a newer request had already replaced it
    Superseded,
    Failed { kind: FailureKind, message: String },
}

pub struct TripPlanner {
    session: SessionManager,
    generator: Arc<dyn IngredientGenerator>,
    address: AddressResolver,
    basket: BasketManager,
    reconciler: RecommendationReconciler,
    outcomes: BTreeMap<Component, Outcome>,
}

impl TripPlanner {
    /// Wire components around an existing session
    pub fn new(session: SessionManager, services: Services, region: RegionConfig) -> Self {
        debug!(region = %region.code, "TripPlanner::new: called");
        let address = AddressResolver::from_services(session.clone(), region, &services);
        let basket = BasketManager::new(session.clone());
        let reconciler = RecommendationReconciler::new(session.clone(), services.pricing.clone());
        Self {
            session,
            generator: services.generator,
            address,
            basket,
            reconciler,
            outcomes: BTreeMap::new(),
        }
    }

    /// Spawn a session and build HTTP-backed services from configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let services = create_services(config)?;
        Ok(Self::new(SessionManager::spawn(), services, config.region.clone()))
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn region(&self) -> &RegionConfig {
        self.address.region()
    }

    pub fn last_outcome(&self, component: Component) -> Option<&Outcome> {
        self.outcomes.get(&component)
    }

    pub fn outcomes(&self) -> &BTreeMap<Component, Outcome> {
        &self.outcomes
    }

    fn track<T, E: std::fmt::Display>(
        &mut self,
        component: Component,
        result: &Result<Commit<T>, E>,
        kind_of: fn(&E) -> FailureKind,
    ) {
        let outcome = match result {
            Ok(Commit::Applied(_)) => Outcome::Ok,
            Ok(Commit::Stale) => Outcome::Superseded,
            Err(e) => Outcome::Failed {
                kind: kind_of(e),
                message: e.to_string(),
            },
        };
        self.outcomes.insert(component, outcome);
    }

    fn track_basket<T>(&mut self, result: Result<T, BasketError>) -> Result<T, BasketError> {
        let outcome = match &result {
            Ok(_) => Outcome::Ok,
            Err(e) => Outcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        };
        self.outcomes.insert(Component::Basket, outcome);
        result
    }

    // === Plain field writes ===

    pub async fn set_dish(&self, dish: &str) -> Result<(), SessionError> {
        self.session.set_dish(dish.trim()).await
    }

    pub async fn set_people_count(&self, count: u32) -> Result<(), SessionError> {
        self.session.set_people_count(count).await
    }

    pub async fn set_budget(&self, budget: f64) -> Result<(), SessionError> {
        self.session.set_budget(budget).await
    }

    pub async fn snapshot(&self) -> Result<SessionRecord, SessionError> {
        self.session.read().await
    }

    // === Ingredients ===

    /// Ask the generation service for the dish's ingredient list
    ///
    /// An applied result starts a fresh basket and clears any recommendation.
    pub async fn generate_ingredients(&mut self) -> Result<Commit<Vec<Ingredient>>, PlanError> {
        let result = self.run_generation().await;
        self.track(Component::Ingredients, &result, PlanError::kind);
        result
    }

    async fn run_generation(&mut self) -> Result<Commit<Vec<Ingredient>>, PlanError> {
        let record = self.session.read().await?;
        debug!(dish = %record.dish, people = ?record.people_count, "generate_ingredients: called");
        let dish = record.dish.trim().to_string();
        if dish.is_empty() {
            return Err(PlanError::MissingDish);
        }
        let people_count = match record.people_count {
            Some(n) if n > 0 => n,
            _ => return Err(PlanError::InvalidPeopleCount),
        };

        let ticket = self.session.begin(Slot::Ingredients).await?;
        let ingredients = self
            .generator
            .generate(GenerationRequest { dish, people_count })
            .await?;

        let applied = self
            .session
            .commit(ticket, SessionUpdate::GeneratedIngredients(ingredients.clone()))
            .await?;
        if !applied {
            return Ok(Commit::Stale);
        }

        self.session
            .modify(|record| {
                record.basket.clear();
                record.recommendation = None;
                vec![SessionField::Basket, SessionField::Recommendation]
            })
            .await?;
        self.reconciler.reset();
        info!(count = ingredients.len(), "Ingredients generated");
        Ok(Commit::Applied(ingredients))
    }

    // === Address ===

    pub async fn resolve_address(&mut self, query: &str) -> Result<Commit<Address>, ResolveError> {
        let result = self.address.resolve_from_text(query).await;
        self.track(Component::Address, &result, ResolveError::kind);
        result
    }

    pub async fn resolve_point(&mut self, point: GeoPoint) -> Result<Commit<Address>, ResolveError> {
        let result = self.address.resolve_from_point(point).await;
        self.track(Component::Address, &result, ResolveError::kind);
        result
    }

    pub async fn resolve_here(&mut self) -> Result<Commit<Address>, ResolveError> {
        let result = self.address.resolve_from_device().await;
        self.track(Component::Address, &result, ResolveError::kind);
        result
    }

    // === Basket ===

    pub async fn basket(&self) -> Result<Vec<BasketItem>, BasketError> {
        self.basket.items().await
    }

    pub async fn add_item(&mut self, name: &str) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.add_generated(name).await;
        self.track_basket(result)
    }

    pub async fn add_custom(&mut self, name: &str, quantity: &str) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.add_custom(name, quantity).await;
        self.track_basket(result)
    }

    pub async fn remove_item(&mut self, name: &str) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.remove(name).await;
        self.track_basket(result)
    }

    pub async fn adjust_count(&mut self, name: &str, delta: i64) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.adjust_count(name, delta).await;
        self.track_basket(result)
    }

    pub async fn select_all(&mut self) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.select_all().await;
        self.track_basket(result)
    }

    pub async fn deselect_all(&mut self) -> Result<Vec<BasketItem>, BasketError> {
        let result = self.basket.deselect_all().await;
        self.track_basket(result)
    }

    // === Recommendation ===

    /// Price the session's basket with its people count and budget
    pub async fn recommend(&mut self) -> Result<Commit<RecommendationResult>, ReconcileError> {
        let result = self.reconciler.request_from_session().await;
        self.track(Component::Recommendation, &result, ReconcileError::kind);
        result
    }

    pub async fn select_store(&mut self, store: &str) -> Result<BudgetVerdict, ReconcileError> {
        let result = self.reconciler.select_store(store).await;
        if let Err(e) = &result {
            warn!(%store, error = %e, "select_store: rejected");
        }
        result
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.reconciler.phase()
    }

    pub fn leaderboard(&self) -> &[StoreLeaderboardEntry] {
        self.reconciler.leaderboard()
    }

    pub fn active_store(&self) -> Option<&str> {
        self.reconciler.active_store()
    }

    /// Active store against the session's current budget
    pub async fn verdict(&self) -> Result<Option<BudgetVerdict>, ReconcileError> {
        self.reconciler.verdict().await
    }

    // === Read models ===

    pub async fn summary(&self) -> Result<PlanSummary, SessionError> {
        Ok(PlanSummary::from_record(&self.session.read().await?))
    }

    /// Breakdown of the current recommendation, if one is ready
    pub async fn breakdown(&self) -> Result<Option<Breakdown>, SessionError> {
        let record = self.session.read().await?;
        let Some(result) = self.reconciler.current() else {
            return Ok(None);
        };
        Ok(Some(Breakdown::build(
            &record,
            result,
            self.reconciler.leaderboard(),
            self.reconciler.active_store(),
            self.reconciler.verdict_against(record.budget),
        )))
    }

    // === Lifecycle ===

    /// Empty the session and forget every in-flight request
    pub async fn restart(&mut self) -> Result<SessionRecord, SessionError> {
        debug!("restart: called");
        let record = self.session.reset().await?;
        self.reconciler.reset();
        self.outcomes.clear();
        info!(session_id = %record.id, "Planning session restarted");
        Ok(record)
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.session.shutdown().await
    }
}
