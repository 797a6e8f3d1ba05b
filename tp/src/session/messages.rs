//! Session manager messages
//!
//! Commands, updates and generation tickets for the session actor.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Address, BasketItem, Ingredient, RecommendationResult, SessionField, SessionRecord};

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session actor is not running")]
    ChannelError,
}

/// Response from session operations
pub type SessionResponse<T> = Result<T, SessionError>;

/// A logical slot filled by an asynchronous request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Address,
    Ingredients,
    Recommendation,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Address, Slot::Ingredients, Slot::Recommendation];

    pub(crate) fn index(self) -> usize {
        match self {
            Slot::Address => 0,
            Slot::Ingredients => 1,
            Slot::Recommendation => 2,
        }
    }

    /// The slot a field belongs to, if it is filled asynchronously
    pub fn for_field(field: SessionField) -> Option<Slot> {
        match field {
            SessionField::Address => Some(Slot::Address),
            SessionField::GeneratedIngredients => Some(Slot::Ingredients),
            SessionField::Recommendation => Some(Slot::Recommendation),
            _ => None,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Address => write!(f, "address"),
            Slot::Ingredients => write!(f, "ingredients"),
            Slot::Recommendation => write!(f, "recommendation"),
        }
    }
}

/// Proof that a request was started; only the latest ticket per slot may commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub generation: u64,
}

/// Outcome of committing an async result
#[derive(Debug, Clone, PartialEq)]
pub enum Commit<T> {
    /// The result was written to the session
    Applied(T),
    /// A newer request or write superseded this one; nothing was written
    Stale,
}

impl<T> Commit<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Commit::Applied(value) => Some(value),
            Commit::Stale => None,
        }
    }
}

/// Field-level replacement of the session record
///
/// No validation happens here; consumers validate what they read.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Dish(String),
    PeopleCount(Option<u32>),
    Budget(Option<f64>),
    Address(Option<Address>),
    GeneratedIngredients(Vec<Ingredient>),
    Basket(Vec<BasketItem>),
    Recommendation(Option<RecommendationResult>),
}

impl SessionUpdate {
    pub fn field(&self) -> SessionField {
        match self {
            SessionUpdate::Dish(_) => SessionField::Dish,
            SessionUpdate::PeopleCount(_) => SessionField::PeopleCount,
            SessionUpdate::Budget(_) => SessionField::Budget,
            SessionUpdate::Address(_) => SessionField::Address,
            SessionUpdate::GeneratedIngredients(_) => SessionField::GeneratedIngredients,
            SessionUpdate::Basket(_) => SessionField::Basket,
            SessionUpdate::Recommendation(_) => SessionField::Recommendation,
        }
    }

    pub(crate) fn apply(self, record: &mut SessionRecord) {
        match self {
            SessionUpdate::Dish(dish) => record.dish = dish,
            SessionUpdate::PeopleCount(count) => record.people_count = count,
            SessionUpdate::Budget(budget) => record.budget = budget,
            SessionUpdate::Address(address) => record.address = address,
            SessionUpdate::GeneratedIngredients(items) => record.generated_ingredients = items,
            SessionUpdate::Basket(items) => record.basket = items,
            SessionUpdate::Recommendation(result) => record.recommendation = result,
        }
    }
}

/// In-place edit run inside the actor; returns the fields it changed
pub type Mutation = Box<dyn FnOnce(&mut SessionRecord) -> Vec<SessionField> + Send>;

/// Result of a [`Mutation`]: changed fields and the record afterwards
#[derive(Debug, Clone)]
pub struct Modified {
    pub changed: Vec<SessionField>,
    pub record: SessionRecord,
}

/// Commands sent to the session actor
pub enum SessionCommand {
    Read {
        reply: oneshot::Sender<SessionRecord>,
    },
    Update {
        update: SessionUpdate,
        reply: oneshot::Sender<()>,
    },
    Modify {
        mutation: Mutation,
        reply: oneshot::Sender<Modified>,
    },

    // Generation tickets
    Begin {
        slot: Slot,
        reply: oneshot::Sender<Ticket>,
    },
    Commit {
        ticket: Ticket,
        update: SessionUpdate,
        reply: oneshot::Sender<bool>,
    },

    Reset {
        reply: oneshot::Sender<SessionRecord>,
    },

    Shutdown,
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionCommand::Read { .. } => write!(f, "Read"),
            SessionCommand::Update { update, .. } => write!(f, "Update({})", update.field()),
            SessionCommand::Modify { .. } => write!(f, "Modify"),
            SessionCommand::Begin { slot, .. } => write!(f, "Begin({})", slot),
            SessionCommand::Commit { ticket, .. } => write!(f, "Commit({}#{})", ticket.slot, ticket.generation),
            SessionCommand::Reset { .. } => write!(f, "Reset"),
            SessionCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}
