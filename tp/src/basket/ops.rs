//! Pure basket operations over a session record
//!
//! Each returns the session fields it changed (empty for a no-op). They run
//! inside the session actor, so a whole operation applies atomically.

use crate::domain::{BasketItem, Ingredient, SessionField, SessionRecord};

/// Add a source ingredient; no-op when its name is already in the basket
pub fn add_generated(record: &mut SessionRecord, ingredient: &Ingredient) -> Vec<SessionField> {
    if record.in_basket(&ingredient.name) {
        return vec![];
    }
    record.basket.push(BasketItem::from_ingredient(ingredient));
    vec![SessionField::Basket]
}

/// Append to the source list and to the basket
///
/// The source list accepts duplicate names. The basket line is only added
/// when the name is not already there.
pub fn add_custom(record: &mut SessionRecord, ingredient: Ingredient) -> Vec<SessionField> {
    let mut changed = add_generated(record, &ingredient);
    record.generated_ingredients.push(ingredient);
    changed.insert(0, SessionField::GeneratedIngredients);
    changed
}

/// Delete the basket line with `name`, if present
pub fn remove(record: &mut SessionRecord, name: &str) -> Vec<SessionField> {
    let before = record.basket.len();
    record.basket.retain(|item| item.name != name);
    if record.basket.len() == before {
        vec![]
    } else {
        vec![SessionField::Basket]
    }
}

/// `count = max(1, count + delta)`; never removes the line
pub fn adjust_count(record: &mut SessionRecord, name: &str, delta: i64) -> Vec<SessionField> {
    let Some(item) = record.basket.iter_mut().find(|item| item.name == name) else {
        return vec![];
    };
    let next = (i64::from(item.count) + delta).clamp(1, i64::from(u32::MAX)) as u32;
    if next == item.count {
        return vec![];
    }
    item.count = next;
    vec![SessionField::Basket]
}

/// Add every source ingredient not yet in the basket, in source order
pub fn select_all(record: &mut SessionRecord) -> Vec<SessionField> {
    let sources = record.generated_ingredients.clone();
    let mut changed = vec![];
    for ingredient in &sources {
        if !add_generated(record, ingredient).is_empty() {
            changed = vec![SessionField::Basket];
        }
    }
    changed
}

/// Remove every basket line whose name matches a source ingredient
///
/// Lines with no matching source ingredient stay.
pub fn deselect_all(record: &mut SessionRecord) -> Vec<SessionField> {
    let before = record.basket.len();
    let sources: Vec<String> = record.generated_ingredients.iter().map(|i| i.name.clone()).collect();
    record.basket.retain(|item| !sources.contains(&item.name));
    if record.basket.len() == before {
        vec![]
    } else {
        vec![SessionField::Basket]
    }
}
