//! RecommendationReconciler - pricing request, leaderboard, active store, budget verdict
//!
//! One cycle runs `Idle -> Requesting -> {Ready, Failed}`. In `Ready` the
//! active store can be switched any number of times without another request.
//! Every request leaves `Requesting` before returning.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::leaderboard::{compute_leaderboard, verdict_for};
use crate::domain::{BasketItem, BudgetVerdict, FailureKind, RecommendationResult, SessionRecord, StoreLeaderboardEntry};
use crate::services::{PricingRequest, PricingService, ServiceError};
use crate::session::{Commit, SessionError, SessionManager, SessionUpdate, Slot};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Basket is empty")]
    EmptyBasket,

    #[error("Budget must be a positive amount")]
    InvalidBudget,

    #[error("Number of people must be at least 1")]
    InvalidPeopleCount,

    #[error("No store prices were returned for this basket")]
    NoPrices,

    #[error("Pricing service failed: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("No recommendation is ready (currently {0})")]
    NotReady(ReconcilePhase),

    #[error("Store '{0}' is not in the leaderboard")]
    UnknownStore(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ReconcileError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ReconcileError::EmptyBasket
            | ReconcileError::InvalidBudget
            | ReconcileError::InvalidPeopleCount
            | ReconcileError::NotReady(_)
            | ReconcileError::UnknownStore(_) => FailureKind::InputValidation,
            ReconcileError::NoPrices => FailureKind::NotFound,
            ReconcileError::ServiceError(e) => e.kind(),
            ReconcileError::Session(_) => FailureKind::Internal,
        }
    }
}

/// Recommendation cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    Requesting,
    Ready,
    Failed,
}

impl std::fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePhase::Idle => write!(f, "idle"),
            ReconcilePhase::Requesting => write!(f, "requesting"),
            ReconcilePhase::Ready => write!(f, "ready"),
            ReconcilePhase::Failed => write!(f, "failed"),
        }
    }
}

pub struct RecommendationReconciler {
    session: SessionManager,
    pricing: Arc<dyn PricingService>,
    phase: ReconcilePhase,
    /// The result the leaderboard was computed from
    current: Option<RecommendationResult>,
    leaderboard: Vec<StoreLeaderboardEntry>,
    active_store: Option<String>,
    last_error: Option<String>,
}

impl RecommendationReconciler {
    pub fn new(session: SessionManager, pricing: Arc<dyn PricingService>) -> Self {
        Self {
            session,
            pricing,
            phase: ReconcilePhase::Idle,
            current: None,
            leaderboard: Vec::new(),
            active_store: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    pub fn leaderboard(&self) -> &[StoreLeaderboardEntry] {
        &self.leaderboard
    }

    pub fn active_store(&self) -> Option<&str> {
        self.active_store.as_deref()
    }

    pub fn current(&self) -> Option<&RecommendationResult> {
        self.current.as_ref()
    }

    /// Message of the most recent failure, cleared on success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Price `basket` and rank the stores
    ///
    /// Preconditions are checked before anything changes. On a service
    /// failure the phase becomes `Failed` and the stored recommendation is
    /// left as it was. A result superseded while in flight (session restart)
    /// is dropped and the reconciler re-syncs from the session.
    pub async fn request_recommendation(
        &mut self,
        basket: Vec<BasketItem>,
        people_count: u32,
        budget: f64,
    ) -> Result<Commit<RecommendationResult>, ReconcileError> {
        debug!(items = basket.len(), people_count, budget, phase = %self.phase, "request_recommendation: called");
        if basket.is_empty() {
            return Err(ReconcileError::EmptyBasket);
        }
        if !budget.is_finite() || budget <= 0.0 {
            return Err(ReconcileError::InvalidBudget);
        }
        if people_count == 0 {
            return Err(ReconcileError::InvalidPeopleCount);
        }

        self.phase = ReconcilePhase::Requesting;
        let outcome = self.run(basket, people_count, budget).await;
        match &outcome {
            Ok(Commit::Applied(_)) => {
                self.last_error = None;
            }
            Ok(Commit::Stale) => {}
            Err(e) => {
                warn!(error = %e, "request_recommendation: failed");
                self.phase = ReconcilePhase::Failed;
                self.last_error = Some(e.to_string());
            }
        }
        outcome
    }

    /// Request using the basket, people count and budget stored in the session
    pub async fn request_from_session(&mut self) -> Result<Commit<RecommendationResult>, ReconcileError> {
        let record = self.session.read().await?;
        let budget = record.budget.ok_or(ReconcileError::InvalidBudget)?;
        let people_count = record.people_count.ok_or(ReconcileError::InvalidPeopleCount)?;
        self.request_recommendation(record.basket, people_count, budget).await
    }

    async fn run(
        &mut self,
        basket: Vec<BasketItem>,
        people_count: u32,
        budget: f64,
    ) -> Result<Commit<RecommendationResult>, ReconcileError> {
        let ticket = self.session.begin(Slot::Recommendation).await?;
        let request = PricingRequest {
            people_count,
            budget,
            ingredients: basket,
        };
        let result = self.pricing.recommend(request).await?;

        let leaderboard = compute_leaderboard(&result);
        if leaderboard.is_empty() {
            return Err(ReconcileError::NoPrices);
        }

        let applied = self
            .session
            .commit(ticket, SessionUpdate::Recommendation(Some(result.clone())))
            .await?;
        if !applied {
            debug!(generation = ticket.generation, "run: superseded, re-syncing from session");
            let record = self.session.read().await?;
            self.sync(&record);
            return Ok(Commit::Stale);
        }

        // The client-side cheapest store is the default, not the service's pick
        let cheapest = leaderboard[0].store.clone();
        info!(
            cheapest = %cheapest,
            recommended = %result.recommended_store,
            stores = leaderboard.len(),
            "Recommendation ready"
        );
        self.leaderboard = leaderboard;
        self.active_store = Some(cheapest);
        self.current = Some(result.clone());
        self.phase = ReconcilePhase::Ready;
        Ok(Commit::Applied(result))
    }

    /// Pin `store` as active and return its verdict against the session budget
    pub async fn select_store(&mut self, store: &str) -> Result<BudgetVerdict, ReconcileError> {
        debug!(%store, phase = %self.phase, "select_store: called");
        if self.phase != ReconcilePhase::Ready {
            return Err(ReconcileError::NotReady(self.phase));
        }
        if !self.leaderboard.iter().any(|entry| entry.store == store) {
            return Err(ReconcileError::UnknownStore(store.to_string()));
        }
        self.active_store = Some(store.to_string());
        self.verdict().await?.ok_or(ReconcileError::InvalidBudget)
    }

    /// Active store's verdict against `budget`; none without a result or a positive budget
    pub fn verdict_against(&self, budget: Option<f64>) -> Option<BudgetVerdict> {
        let result = self.current.as_ref()?;
        let store = self.active_store.as_deref()?;
        let budget = budget.filter(|b| b.is_finite() && *b > 0.0)?;
        Some(verdict_for(result, store, budget))
    }

    /// Active store's verdict against the budget currently in the session
    pub async fn verdict(&self) -> Result<Option<BudgetVerdict>, ReconcileError> {
        let record = self.session.read().await?;
        Ok(self.verdict_against(record.budget))
    }

    /// Rebuild from a session snapshot: `Ready` if it holds a priced result, else `Idle`
    pub fn sync(&mut self, record: &SessionRecord) {
        debug!(session_id = %record.id, "sync: called");
        self.reset();
        let Some(result) = record.recommendation.clone() else {
            return;
        };
        let leaderboard = compute_leaderboard(&result);
        if leaderboard.is_empty() {
            return;
        }
        self.active_store = Some(leaderboard[0].store.clone());
        self.leaderboard = leaderboard;
        self.current = Some(result);
        self.phase = ReconcilePhase::Ready;
    }

    /// Back to `Idle` with nothing selected
    pub fn reset(&mut self) {
        self.phase = ReconcilePhase::Idle;
        self.current = None;
        self.leaderboard.clear();
        self.active_store = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricedIngredient;
    use crate::services::client::mock::MockPricing;
    use std::collections::BTreeMap;

    fn item(name: &str) -> BasketItem {
        BasketItem {
            name: name.to_string(),
            quantity: "1".to_string(),
            count: 1,
        }
    }

    fn priced(name: &str, prices: &[(&str, f64)]) -> PricedIngredient {
        PricedIngredient {
            name: name.to_string(),
            quantity: "1".to_string(),
            prices: prices
                .iter()
                .map(|(s, p)| (s.to_string(), Some(*p)))
                .collect::<BTreeMap<_, _>>(),
            cheapest_store: String::new(),
            cheapest_price: None,
        }
    }

    /// A {s1:10, s2:12}, B {s1:20, s2:15}; the service suggests s1
    fn two_store_result() -> RecommendationResult {
        RecommendationResult {
            recommended_store: "s1".to_string(),
            total_cost: 25.0,
            within_budget: true,
            adjusted_budget: None,
            ingredients: vec![
                priced("A", &[("s1", 10.0), ("s2", 12.0)]),
                priced("B", &[("s1", 20.0), ("s2", 15.0)]),
            ],
        }
    }

    fn reconciler(responses: Vec<Result<RecommendationResult, ServiceError>>) -> (SessionManager, Arc<MockPricing>, RecommendationReconciler) {
        let session = SessionManager::spawn();
        let pricing = Arc::new(MockPricing::new(responses));
        let reconciler = RecommendationReconciler::new(session.clone(), pricing.clone());
        (session, pricing, reconciler)
    }

    fn unavailable() -> ServiceError {
        ServiceError::ApiError {
            status: 503,
            message: "down".to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_selection_is_cheapest_not_service_pick() {
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);

        let commit = reconciler
            .request_recommendation(vec![item("A"), item("B")], 2, 100.0)
            .await
            .unwrap();
        assert!(commit.is_applied());
        assert_eq!(reconciler.phase(), ReconcilePhase::Ready);
        assert_eq!(reconciler.leaderboard()[0].store, "s2");
        assert_eq!(reconciler.active_store(), Some("s2"));
        assert_eq!(reconciler.current().unwrap().recommended_store, "s1");

        let stored = session.read().await.unwrap().recommendation.unwrap();
        assert_eq!(stored, two_store_result());
    }

    #[tokio::test]
    async fn test_over_budget_verdict() {
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);
        session.set_budget(25.0).await.unwrap();

        reconciler
            .request_recommendation(vec![item("A"), item("B")], 2, 25.0)
            .await
            .unwrap();
        let verdict = reconciler.verdict().await.unwrap().unwrap();
        assert_eq!(verdict.store, "s2");
        assert_eq!(verdict.total, 27.0);
        assert!(!verdict.within_budget);
        assert_eq!(verdict.overage(), Some(2.0));
    }

    #[tokio::test]
    async fn test_select_store_recomputes_without_request() {
        let (session, pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);
        session.set_budget(28.0).await.unwrap();
        reconciler
            .request_recommendation(vec![item("A"), item("B")], 2, 28.0)
            .await
            .unwrap();

        let verdict = reconciler.select_store("s1").await.unwrap();
        assert_eq!(verdict.total, 30.0);
        assert!(!verdict.within_budget);
        assert_eq!(verdict.difference, -2.0);

        let verdict = reconciler.select_store("s2").await.unwrap();
        assert!(verdict.within_budget);
        assert_eq!(verdict.remaining(), Some(1.0));

        assert_eq!(pricing.call_count(), 1);
        assert_eq!(reconciler.phase(), ReconcilePhase::Ready);
    }

    #[tokio::test]
    async fn test_select_unknown_store_and_not_ready() {
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);
        session.set_budget(50.0).await.unwrap();

        assert!(matches!(
            reconciler.select_store("s1").await,
            Err(ReconcileError::NotReady(ReconcilePhase::Idle))
        ));

        reconciler
            .request_recommendation(vec![item("A")], 2, 50.0)
            .await
            .unwrap();
        assert!(matches!(
            reconciler.select_store("s9").await,
            Err(ReconcileError::UnknownStore(_))
        ));
        assert_eq!(reconciler.active_store(), Some("s2"));
    }

    #[tokio::test]
    async fn test_preconditions_skip_service() {
        let (_session, pricing, mut reconciler) = reconciler(vec![]);

        let err = reconciler.request_recommendation(vec![], 2, 50.0).await.unwrap_err();
        assert!(matches!(err, ReconcileError::EmptyBasket));

        for budget in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = reconciler
                .request_recommendation(vec![item("A")], 2, budget)
                .await
                .unwrap_err();
            assert!(matches!(err, ReconcileError::InvalidBudget));
            assert_eq!(err.kind(), FailureKind::InputValidation);
        }

        let err = reconciler
            .request_recommendation(vec![item("A")], 0, 50.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidPeopleCount));

        assert_eq!(pricing.call_count(), 0);
        assert_eq!(reconciler.phase(), ReconcilePhase::Idle);
    }

    #[tokio::test]
    async fn test_service_error_fails_and_keeps_prior_result() {
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(two_store_result()), Err(unavailable())]);

        reconciler
            .request_recommendation(vec![item("A"), item("B")], 2, 30.0)
            .await
            .unwrap();
        let err = reconciler
            .request_recommendation(vec![item("A")], 2, 30.0)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::ServiceError);
        assert_eq!(reconciler.phase(), ReconcilePhase::Failed);
        assert!(reconciler.last_error().is_some());
        assert_eq!(session.read().await.unwrap().recommendation, Some(two_store_result()));
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let (_session, _pricing, mut reconciler) = reconciler(vec![Err(unavailable()), Ok(two_store_result())]);

        assert!(
            reconciler
                .request_recommendation(vec![item("A")], 2, 30.0)
                .await
                .is_err()
        );
        assert_eq!(reconciler.phase(), ReconcilePhase::Failed);

        reconciler
            .request_recommendation(vec![item("A")], 2, 30.0)
            .await
            .unwrap();
        assert_eq!(reconciler.phase(), ReconcilePhase::Ready);
        assert!(reconciler.last_error().is_none());
    }

    #[tokio::test]
    async fn test_empty_price_list_is_no_prices() {
        let empty = RecommendationResult {
            recommended_store: "osave".to_string(),
            total_cost: 0.0,
            within_budget: true,
            adjusted_budget: None,
            ingredients: vec![],
        };
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(empty)]);

        let err = reconciler
            .request_recommendation(vec![item("A")], 2, 30.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NoPrices));
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(reconciler.phase(), ReconcilePhase::Failed);
        assert!(session.read().await.unwrap().recommendation.is_none());
    }

    #[tokio::test]
    async fn test_request_from_session_reads_inputs() {
        let (session, pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);
        session.set_people_count(4).await.unwrap();
        session.set_budget(40.0).await.unwrap();
        session
            .update(SessionUpdate::Basket(vec![item("A"), item("B")]))
            .await
            .unwrap();

        reconciler.request_from_session().await.unwrap();
        let request = &pricing.requests()[0];
        assert_eq!(request.people_count, 4);
        assert_eq!(request.budget, 40.0);
        assert_eq!(request.ingredients.len(), 2);
    }

    #[tokio::test]
    async fn test_request_from_session_without_budget() {
        let (session, _pricing, mut reconciler) = reconciler(vec![]);
        session.set_people_count(4).await.unwrap();
        session.update(SessionUpdate::Basket(vec![item("A")])).await.unwrap();

        let err = reconciler.request_from_session().await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidBudget));
    }

    #[tokio::test]
    async fn test_sync_rebuilds_from_session() {
        let (session, _pricing, mut reconciler) = reconciler(vec![]);
        session.set_budget(25.0).await.unwrap();
        session
            .update(SessionUpdate::Recommendation(Some(two_store_result())))
            .await
            .unwrap();

        reconciler.sync(&session.read().await.unwrap());
        assert_eq!(reconciler.phase(), ReconcilePhase::Ready);
        assert_eq!(reconciler.active_store(), Some("s2"));
        assert_eq!(reconciler.verdict().await.unwrap().unwrap().overage(), Some(2.0));

        reconciler.sync(&SessionRecord::new());
        assert_eq!(reconciler.phase(), ReconcilePhase::Idle);
        assert!(reconciler.leaderboard().is_empty());
    }

    #[tokio::test]
    async fn test_verdict_follows_budget_changes() {
        let (session, _pricing, mut reconciler) = reconciler(vec![Ok(two_store_result())]);
        session.set_budget(30.0).await.unwrap();
        session
            .update(SessionUpdate::Basket(vec![item("A"), item("B")]))
            .await
            .unwrap();
        session.set_people_count(2).await.unwrap();
        reconciler.request_from_session().await.unwrap();
        assert!(reconciler.verdict().await.unwrap().unwrap().within_budget);

        session.set_budget(20.0).await.unwrap();
        let verdict = reconciler.select_store("s2").await.unwrap();
        assert_eq!(verdict.budget, 20.0);
        assert_eq!(verdict.total, 27.0);
        assert!(!verdict.within_budget);
        assert_eq!(verdict.overage(), Some(7.0));

        session.set_budget(-1.0).await.unwrap();
        assert!(reconciler.verdict().await.unwrap().is_none());
        assert!(matches!(
            reconciler.select_store("s1").await,
            Err(ReconcileError::InvalidBudget)
        ));
    }
}
