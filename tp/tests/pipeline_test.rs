//! End-to-end tests of the planning pipeline over stub services

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tripplanner::address::ResolveError;
use tripplanner::config::RegionConfig;
use tripplanner::domain::{FailureKind, GeoPoint, Ingredient, PricedIngredient, RecommendationResult};
use tripplanner::recommend::{ReconcileError, ReconcilePhase};
use tripplanner::services::{
    ForwardGeocoder, GenerationRequest, GeocodeCandidate, IngredientGenerator, LocationError, LocationProvider,
    PricingRequest, PricingService, RegionFilter, ReverseGeocode, ReverseGeocoder, ServiceError, Services,
};
use tripplanner::session::{Commit, SessionManager};
use tripplanner::{Component, Outcome, TripPlanner};

// =============================================================================
// Stub services
// =============================================================================

struct StubGenerator;

#[async_trait]
impl IngredientGenerator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<Ingredient>, ServiceError> {
        match request.dish.as_str() {
            "Adobo" => Ok(vec![Ingredient::new("Pork", "1kg"), Ingredient::new("Soy sauce", "1 cup")]),
            other => Err(ServiceError::Rejected(format!("unknown dish {}", other))),
        }
    }
}

#[derive(Default)]
struct StubPricing {
    requests: Mutex<Vec<PricingRequest>>,
}

fn priced(name: &str, s1: f64, s2: f64) -> PricedIngredient {
    let (cheapest_store, cheapest_price) = if s1 <= s2 { ("s1", s1) } else { ("s2", s2) };
    PricedIngredient {
        name: name.to_string(),
        quantity: "1".to_string(),
        prices: BTreeMap::from([("s1".to_string(), Some(s1)), ("s2".to_string(), Some(s2))]),
        cheapest_store: cheapest_store.to_string(),
        cheapest_price: Some(cheapest_price),
    }
}

#[async_trait]
impl PricingService for StubPricing {
    async fn recommend(&self, request: PricingRequest) -> Result<RecommendationResult, ServiceError> {
        let budget = request.budget;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        Ok(RecommendationResult {
            recommended_store: "s1".to_string(),
            total_cost: 30.0,
            within_budget: 30.0 <= budget,
            adjusted_budget: None,
            ingredients: vec![priced("Pork", 20.0, 15.0), priced("Soy sauce", 10.0, 12.0)],
        })
    }
}

struct StubForward;

#[async_trait]
impl ForwardGeocoder for StubForward {
    async fn search(&self, query: &str, filter: &RegionFilter) -> Result<Vec<GeocodeCandidate>, ServiceError> {
        assert_eq!(filter.code, "ph");
        if query.eq_ignore_ascii_case("cebu city") {
            Ok(vec![
                GeocodeCandidate {
                    lat: 10.3157,
                    lng: 123.8854,
                    label: "Cebu City, Central Visayas, Philippines".to_string(),
                },
                GeocodeCandidate {
                    lat: 10.3,
                    lng: 123.9,
                    label: "Cebu, Philippines".to_string(),
                },
            ])
        } else {
            Ok(vec![])
        }
    }
}

/// Reports "ph" everywhere except a strip of sea west of Palawan
struct StubReverse;

#[async_trait]
impl ReverseGeocoder for StubReverse {
    async fn reverse(&self, point: GeoPoint) -> Result<ReverseGeocode, ServiceError> {
        if point.lng < 117.5 {
            return Ok(ReverseGeocode {
                display_name: "South China Sea".to_string(),
                region_code: None,
            });
        }
        Ok(ReverseGeocode {
            display_name: format!("Somewhere near {}", point),
            region_code: Some("ph".to_string()),
        })
    }
}

struct StubLocation(Option<GeoPoint>);

#[async_trait]
impl LocationProvider for StubLocation {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        self.0.ok_or(LocationError::Denied)
    }
}

fn planner_with(location: Option<GeoPoint>) -> (TripPlanner, Arc<StubPricing>) {
    let pricing = Arc::new(StubPricing::default());
    let services = Services {
        generator: Arc::new(StubGenerator),
        pricing: pricing.clone(),
        forward: Arc::new(StubForward),
        reverse: Arc::new(StubReverse),
        location: Arc::new(StubLocation(location)),
    };
    let planner = TripPlanner::new(SessionManager::spawn(), services, RegionConfig::default());
    (planner, pricing)
}

async fn planned(budget: f64) -> (TripPlanner, Arc<StubPricing>) {
    let (mut planner, pricing) = planner_with(None);
    planner.set_dish("Adobo").await.unwrap();
    planner.set_people_count(4).await.unwrap();
    planner.set_budget(budget).await.unwrap();
    planner.resolve_address("Cebu City").await.unwrap();
    planner.generate_ingredients().await.unwrap();
    planner.select_all().await.unwrap();
    (planner, pricing)
}

// =============================================================================
// Full pipeline
// =============================================================================

#[tokio::test]
async fn test_full_plan_picks_cheapest_store() {
    let (mut planner, pricing) = planned(28.0).await;
    planner.adjust_count("Pork", 1).await.unwrap();

    let commit = planner.recommend().await.unwrap();
    assert!(commit.is_applied());
    assert_eq!(planner.phase(), ReconcilePhase::Ready);

    let stores: Vec<(&str, f64)> = planner.leaderboard().iter().map(|e| (e.store.as_str(), e.total)).collect();
    assert_eq!(stores, vec![("s2", 27.0), ("s1", 30.0)]);
    assert_eq!(planner.active_store(), Some("s2"));

    let verdict = planner.verdict().await.unwrap().unwrap();
    assert!(verdict.within_budget);
    assert_eq!(verdict.remaining(), Some(1.0));

    let requests = pricing.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].people_count, 4);
    assert_eq!(requests[0].budget, 28.0);
    let pork = requests[0].ingredients.iter().find(|i| i.name == "Pork").unwrap();
    assert_eq!(pork.count, 2);
}

#[tokio::test]
async fn test_switching_store_goes_over_budget() {
    let (mut planner, _) = planned(28.0).await;
    planner.recommend().await.unwrap();

    let verdict = planner.select_store("s1").await.unwrap();
    assert!(!verdict.within_budget);
    assert_eq!(verdict.overage(), Some(2.0));
    assert_eq!(planner.active_store(), Some("s1"));

    let err = planner.select_store("s9").await.unwrap_err();
    assert!(matches!(err, ReconcileError::UnknownStore(_)));
    assert_eq!(planner.active_store(), Some("s1"));
}

#[tokio::test]
async fn test_budget_edit_after_plan_updates_verdict() {
    let (mut planner, pricing) = planned(30.0).await;
    planner.recommend().await.unwrap();
    assert!(planner.verdict().await.unwrap().unwrap().within_budget);

    planner.set_budget(20.0).await.unwrap();
    let verdict = planner.verdict().await.unwrap().unwrap();
    assert_eq!(verdict.budget, 20.0);
    assert!(!verdict.within_budget);
    assert_eq!(verdict.overage(), Some(7.0));

    let verdict = planner.select_store("s2").await.unwrap();
    assert!(!verdict.within_budget);

    let breakdown = planner.breakdown().await.unwrap().unwrap();
    let shown = breakdown.verdict.unwrap();
    assert_eq!(shown.budget, 20.0);
    assert!(!shown.within_budget);
    assert_eq!(pricing.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_breakdown_and_summary_after_plan() {
    let (mut planner, _) = planned(100.0).await;
    planner.add_custom("Bay leaves", "3 pcs").await.unwrap();
    planner.recommend().await.unwrap();

    let summary = planner.summary().await.unwrap();
    assert_eq!(summary.get("Dish"), Some("Adobo"));
    assert_eq!(summary.get("Address"), Some("Cebu City, Central Visayas, Philippines"));
    assert_eq!(summary.get("Budget"), Some("100.00"));

    let breakdown = planner.breakdown().await.unwrap().unwrap();
    assert_eq!(breakdown.stores, vec!["s2", "s1"]);
    assert_eq!(breakdown.rows.len(), 2);
    assert_eq!(breakdown.rows[0].prices, vec![Some(15.0), Some(20.0)]);
    assert_eq!(breakdown.recommended_store, "s1");
    assert_eq!(breakdown.active_store.as_deref(), Some("s2"));
}

#[tokio::test]
async fn test_recommend_with_empty_basket_is_rejected() {
    let (mut planner, pricing) = planned(50.0).await;
    planner.deselect_all().await.unwrap();

    let err = planner.recommend().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::InputValidation);
    assert!(pricing.requests.lock().unwrap().is_empty());
    assert!(matches!(
        planner.last_outcome(Component::Recommendation),
        Some(Outcome::Failed {
            kind: FailureKind::InputValidation,
            ..
        })
    ));
}

// =============================================================================
// Location
// =============================================================================

#[tokio::test]
async fn test_unknown_place_is_not_found() {
    let (mut planner, _) = planner_with(None);
    let err = planner.resolve_address("Atlantis").await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
    assert!(planner.snapshot().await.unwrap().address.is_none());
}

#[tokio::test]
async fn test_point_outside_region_is_rejected() {
    let (mut planner, _) = planner_with(None);

    // Tokyo: outside the bounding box
    let err = planner.resolve_point(GeoPoint::new(35.6762, 139.6503)).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::OutOfRegion);

    // Inside the box, but the reverse lookup names no region
    let err = planner.resolve_point(GeoPoint::new(10.0, 117.0)).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::OutOfRegion);

    let commit = planner.resolve_point(GeoPoint::new(14.5995, 120.9842)).await.unwrap();
    let address = commit.applied().unwrap();
    assert_eq!(address.point(), GeoPoint::new(14.5995, 120.9842));
}

#[tokio::test]
async fn test_device_location() {
    let (mut planner, _) = planner_with(Some(GeoPoint::new(10.3157, 123.8854)));
    let commit = planner.resolve_here().await.unwrap();
    assert!(matches!(commit, Commit::Applied(_)));

    let (mut planner, _) = planner_with(None);
    let err = planner.resolve_here().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::LocationUnavailable);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_restart_after_plan() {
    let (mut planner, _) = planned(28.0).await;
    planner.recommend().await.unwrap();

    let record = planner.restart().await.unwrap();
    assert!(record.is_blank());
    assert_eq!(planner.phase(), ReconcilePhase::Idle);
    assert!(planner.leaderboard().is_empty());
    assert!(planner.breakdown().await.unwrap().is_none());
}

#[tokio::test]
async fn test_generation_failure_reported() {
    let (mut planner, _) = planner_with(None);
    planner.set_dish("Mystery stew").await.unwrap();
    planner.set_people_count(2).await.unwrap();

    let err = planner.generate_ingredients().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::ServiceError);
    assert!(err.kind().is_retryable());
    assert!(planner.snapshot().await.unwrap().generated_ingredients.is_empty());
}
