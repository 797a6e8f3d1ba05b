//! BasketManager - basket edits through the session actor

use thiserror::Error;
use tracing::{debug, info};

use super::ops;
use crate::domain::{BasketItem, FailureKind, Ingredient};
use crate::session::{SessionError, SessionManager};

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No generated ingredient named '{0}'")]
    UnknownIngredient(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl BasketError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BasketError::InvalidInput(_) => FailureKind::InputValidation,
            BasketError::UnknownIngredient(_) => FailureKind::NotFound,
            BasketError::Session(_) => FailureKind::Internal,
        }
    }
}

/// Handle for basket edits
///
/// Every method returns the basket as it stands after the edit.
#[derive(Clone)]
pub struct BasketManager {
    session: SessionManager,
}

impl BasketManager {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub async fn items(&self) -> Result<Vec<BasketItem>, BasketError> {
        Ok(self.session.read().await?.basket)
    }

    /// Add the first source ingredient called `name`
    pub async fn add_generated(&self, name: &str) -> Result<Vec<BasketItem>, BasketError> {
        debug!(%name, "add_generated: called");
        let wanted = name.to_string();
        let modified = self
            .session
            .modify(move |record| {
                let source = record.ingredient(&wanted).cloned();
                match source {
                    Some(ingredient) => ops::add_generated(record, &ingredient),
                    None => vec![],
                }
            })
            .await?;
        if modified.record.ingredient(name).is_none() {
            return Err(BasketError::UnknownIngredient(name.to_string()));
        }
        Ok(modified.record.basket)
    }

    /// Add a user-entered item to both the source list and the basket
    pub async fn add_custom(&self, name: &str, quantity: &str) -> Result<Vec<BasketItem>, BasketError> {
        debug!(%name, %quantity, "add_custom: called");
        let name = name.trim();
        let quantity = quantity.trim();
        if name.is_empty() {
            return Err(BasketError::InvalidInput("item name is empty".to_string()));
        }
        if quantity.is_empty() {
            return Err(BasketError::InvalidInput("item quantity is empty".to_string()));
        }

        let ingredient = Ingredient::new(name, quantity);
        let modified = self
            .session
            .modify(move |record| ops::add_custom(record, ingredient))
            .await?;
        info!(%name, %quantity, "Custom item added");
        Ok(modified.record.basket)
    }

    pub async fn remove(&self, name: &str) -> Result<Vec<BasketItem>, BasketError> {
        debug!(%name, "remove: called");
        let name = name.to_string();
        let modified = self.session.modify(move |record| ops::remove(record, &name)).await?;
        Ok(modified.record.basket)
    }

    pub async fn adjust_count(&self, name: &str, delta: i64) -> Result<Vec<BasketItem>, BasketError> {
        debug!(%name, delta, "adjust_count: called");
        let name = name.to_string();
        let modified = self
            .session
            .modify(move |record| ops::adjust_count(record, &name, delta))
            .await?;
        Ok(modified.record.basket)
    }

    pub async fn select_all(&self) -> Result<Vec<BasketItem>, BasketError> {
        debug!("select_all: called");
        let modified = self.session.modify(ops::select_all).await?;
        Ok(modified.record.basket)
    }

    pub async fn deselect_all(&self) -> Result<Vec<BasketItem>, BasketError> {
        debug!("deselect_all: called");
        let modified = self.session.modify(ops::deselect_all).await?;
        Ok(modified.record.basket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionField;
    use crate::session::{SessionEvent, SessionUpdate, Slot};

    async fn seeded() -> (SessionManager, BasketManager) {
        let session = SessionManager::spawn();
        session
            .update(SessionUpdate::GeneratedIngredients(vec![
                Ingredient::new("Rice", "1kg"),
                Ingredient::new("Egg", "6 pcs"),
            ]))
            .await
            .unwrap();
        let basket = BasketManager::new(session.clone());
        (session, basket)
    }

    #[tokio::test]
    async fn test_round_trip_through_session() {
        let (session, basket) = seeded().await;

        let items = basket.add_generated("Rice").await.unwrap();
        assert_eq!(items.len(), 1);

        let items = basket.adjust_count("Rice", 2).await.unwrap();
        assert_eq!(items[0].count, 3);

        let items = basket.remove("Rice").await.unwrap();
        assert!(items.is_empty());
        assert!(session.read().await.unwrap().basket.is_empty());
    }

    #[tokio::test]
    async fn test_add_generated_unknown_name() {
        let (_session, basket) = seeded().await;

        let err = basket.add_generated("Saffron").await.unwrap_err();
        assert!(matches!(err, BasketError::UnknownIngredient(_)));
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(basket.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_custom_rejects_blank_fields() {
        let (session, basket) = seeded().await;

        for (name, quantity) in [("", "1"), ("  ", "1"), ("Salt", ""), ("Salt", "   ")] {
            let err = basket.add_custom(name, quantity).await.unwrap_err();
            assert_eq!(err.kind(), FailureKind::InputValidation);
        }

        let record = session.read().await.unwrap();
        assert_eq!(record.generated_ingredients.len(), 2);
        assert!(record.basket.is_empty());
    }

    #[tokio::test]
    async fn test_add_custom_trims_and_appends_twice() {
        let (session, basket) = seeded().await;

        let items = basket.add_custom("  Fish sauce ", " 1 bottle ").await.unwrap();
        assert_eq!(items[0].name, "Fish sauce");
        assert_eq!(items[0].quantity, "1 bottle");

        let record = session.read().await.unwrap();
        assert_eq!(record.generated_ingredients.last().unwrap().name, "Fish sauce");
    }

    #[tokio::test]
    async fn test_custom_add_supersedes_pending_generation() {
        let (session, basket) = seeded().await;
        let mut events = session.subscribe();
        let ticket = session.begin(Slot::Ingredients).await.unwrap();

        basket.add_custom("Salt", "1 tsp").await.unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Updated {
                field: SessionField::GeneratedIngredients
            }
        );

        let applied = session
            .commit(ticket, SessionUpdate::GeneratedIngredients(vec![]))
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_select_all_then_deselect_all_keeps_custom_only_lines() {
        let (session, basket) = seeded().await;
        session
            .update(SessionUpdate::Basket(vec![BasketItem {
                name: "Foil".to_string(),
                quantity: "1 roll".to_string(),
                count: 2,
            }]))
            .await
            .unwrap();

        let items = basket.select_all().await.unwrap();
        assert_eq!(items.len(), 3);

        let items = basket.deselect_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Foil");
        assert_eq!(items[0].count, 2);
    }
}
