//! Store leaderboard: pure projections of a recommendation result

use std::collections::BTreeSet;

use crate::domain::{BudgetVerdict, RecommendationResult, StoreLeaderboardEntry, round_cents};

/// Every store named in any ingredient's price map, in name order
pub fn known_stores(result: &RecommendationResult) -> BTreeSet<String> {
    result
        .ingredients
        .iter()
        .flat_map(|ingredient| ingredient.prices.keys().cloned())
        .collect()
}

/// Sum of `store`'s prices over all ingredients; a missing or null price adds zero
pub fn store_total(result: &RecommendationResult, store: &str) -> f64 {
    round_cents(result.ingredients.iter().map(|i| i.price_at(store)).sum())
}

/// Stores ranked by total ascending, equal totals by name ascending
pub fn compute_leaderboard(result: &RecommendationResult) -> Vec<StoreLeaderboardEntry> {
    let mut entries: Vec<StoreLeaderboardEntry> = known_stores(result)
        .into_iter()
        .map(|store| {
            let total = store_total(result, &store);
            StoreLeaderboardEntry { store, total }
        })
        .collect();
    entries.sort_by(|a, b| a.total.total_cmp(&b.total).then_with(|| a.store.cmp(&b.store)));
    entries
}

/// Verdict for `store` against `budget`
pub fn verdict_for(result: &RecommendationResult, store: &str, budget: f64) -> BudgetVerdict {
    BudgetVerdict::evaluate(store, store_total(result, store), budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricedIngredient;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn priced(name: &str, prices: &[(&str, Option<f64>)]) -> PricedIngredient {
        PricedIngredient {
            name: name.to_string(),
            quantity: "1".to_string(),
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect::<BTreeMap<_, _>>(),
            cheapest_store: String::new(),
            cheapest_price: None,
        }
    }

    fn result(ingredients: Vec<PricedIngredient>) -> RecommendationResult {
        RecommendationResult {
            recommended_store: "s1".to_string(),
            total_cost: 0.0,
            within_budget: true,
            adjusted_budget: None,
            ingredients,
        }
    }

    fn entry(store: &str, total: f64) -> StoreLeaderboardEntry {
        StoreLeaderboardEntry {
            store: store.to_string(),
            total,
        }
    }

    #[test]
    fn test_two_store_scenario() {
        let result = result(vec![
            priced("A", &[("s1", Some(10.0)), ("s2", Some(12.0))]),
            priced("B", &[("s1", Some(20.0)), ("s2", Some(15.0))]),
        ]);
        assert_eq!(compute_leaderboard(&result), vec![entry("s2", 27.0), entry("s1", 30.0)]);
    }

    #[test]
    fn test_missing_and_null_prices_count_as_zero() {
        let result = result(vec![
            priced("A", &[("osave", Some(10.0)), ("dali", None)]),
            priced("B", &[("osave", Some(5.0)), ("dti", Some(7.5))]),
        ]);
        let board = compute_leaderboard(&result);
        assert_eq!(board, vec![entry("dali", 0.0), entry("dti", 7.5), entry("osave", 15.0)]);
    }

    #[test]
    fn test_ties_break_by_name() {
        let result = result(vec![priced("A", &[("zeta", Some(5.0)), ("alpha", Some(5.0)), ("mid", Some(5.0))])]);
        let stores: Vec<String> = compute_leaderboard(&result).into_iter().map(|e| e.store).collect();
        assert_eq!(stores, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_no_prices_gives_empty_board() {
        assert!(compute_leaderboard(&result(vec![])).is_empty());
        assert!(compute_leaderboard(&result(vec![priced("A", &[])])).is_empty());
    }

    #[test]
    fn test_totals_are_rounded_to_cents() {
        let result = result(vec![
            priced("A", &[("s1", Some(0.1))]),
            priced("B", &[("s1", Some(0.2))]),
        ]);
        assert_eq!(store_total(&result, "s1"), 0.3);
    }

    #[test]
    fn test_verdict_for_store() {
        let result = result(vec![
            priced("A", &[("s1", Some(10.0)), ("s2", Some(12.0))]),
            priced("B", &[("s1", Some(20.0)), ("s2", Some(15.0))]),
        ]);
        let verdict = verdict_for(&result, "s2", 25.0);
        assert!(!verdict.within_budget);
        assert_eq!(verdict.overage(), Some(2.0));
    }

    fn arb_result() -> impl Strategy<Value = RecommendationResult> {
        let store = prop::sample::select(vec!["osave", "dali", "dti", "puregold"]);
        let price = prop::option::of(0u32..5000).prop_map(|p| p.map(|c| f64::from(c) / 100.0));
        let prices = prop::collection::btree_map(store.prop_map(|s| s.to_string()), price, 0..4);
        prop::collection::vec(prices, 0..8).prop_map(|maps| RecommendationResult {
            recommended_store: String::new(),
            total_cost: 0.0,
            within_budget: false,
            adjusted_budget: None,
            ingredients: maps
                .into_iter()
                .enumerate()
                .map(|(i, prices)| PricedIngredient {
                    name: format!("item-{}", i),
                    quantity: "1".to_string(),
                    prices,
                    cheapest_store: String::new(),
                    cheapest_price: None,
                })
                .collect(),
        })
    }

    proptest! {
        #[test]
        fn prop_leaderboard_is_deterministic_and_sorted(result in arb_result()) {
            let first = compute_leaderboard(&result);
            let second = compute_leaderboard(&result);
            prop_assert_eq!(&first, &second);
            for pair in first.windows(2) {
                prop_assert!(
                    pair[0].total < pair[1].total
                        || (pair[0].total == pair[1].total && pair[0].store < pair[1].store)
                );
            }
            prop_assert_eq!(first.len(), known_stores(&result).len());
        }
    }
}
