//! SessionManager - actor that owns the SessionRecord
//!
//! Processes commands via channels. The actor is the only place the record
//! is mutated, and it also tracks the latest generation issued per slot so
//! that out-of-order async results can be discarded.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{SessionField, SessionRecord};

use super::messages::{
    Modified, Mutation, SessionCommand, SessionError, SessionResponse, SessionUpdate, Slot, Ticket,
};

/// Event broadcast when the session changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A field was written
    Updated { field: SessionField },
    /// The session was restarted
    Reset { session_id: String },
    /// A superseded async result was dropped
    StaleDiscarded { slot: Slot, generation: u64 },
}

/// Handle to send commands to the session actor
#[derive(Clone)]
pub struct SessionManager {
    tx: mpsc::Sender<SessionCommand>,
    /// Broadcast sender for change notifications
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Spawn a new session actor with an empty record
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);

        let actor = SessionActor::new(event_tx.clone());
        tokio::spawn(actor_loop(actor, rx));

        info!("SessionManager spawned");
        Self { tx, event_tx }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> SessionResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    /// Snapshot of the current record
    pub async fn read(&self) -> SessionResponse<SessionRecord> {
        debug!("read: called");
        self.request(|reply| SessionCommand::Read { reply }).await
    }

    /// Replace one field
    ///
    /// Writing a slotted field supersedes any request in flight for that slot.
    pub async fn update(&self, update: SessionUpdate) -> SessionResponse<()> {
        debug!(field = %update.field(), "update: called");
        self.request(|reply| SessionCommand::Update { update, reply }).await
    }

    /// Run an in-place edit atomically inside the actor
    pub async fn modify<F>(&self, f: F) -> SessionResponse<Modified>
    where
        F: FnOnce(&mut SessionRecord) -> Vec<SessionField> + Send + 'static,
    {
        debug!("modify: called");
        let mutation: Mutation = Box::new(f);
        self.request(|reply| SessionCommand::Modify { mutation, reply }).await
    }

    /// Start an async request for `slot`, superseding any earlier one
    pub async fn begin(&self, slot: Slot) -> SessionResponse<Ticket> {
        debug!(%slot, "begin: called");
        self.request(|reply| SessionCommand::Begin { slot, reply }).await
    }

    /// Apply `update` only if `ticket` is still the latest for its slot
    ///
    /// Returns `true` when applied. A ticket commits at most once.
    pub async fn commit(&self, ticket: Ticket, update: SessionUpdate) -> SessionResponse<bool> {
        debug!(slot = %ticket.slot, generation = ticket.generation, "commit: called");
        self.request(|reply| SessionCommand::Commit { ticket, update, reply })
            .await
    }

    /// Restart the session: empty record, new id, every in-flight request superseded
    pub async fn reset(&self) -> SessionResponse<SessionRecord> {
        debug!("reset: called");
        self.request(|reply| SessionCommand::Reset { reply }).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SessionResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ChannelError)
    }

    // === Convenience setters ===

    pub async fn set_dish(&self, dish: impl Into<String>) -> SessionResponse<()> {
        self.update(SessionUpdate::Dish(dish.into())).await
    }

    pub async fn set_people_count(&self, count: u32) -> SessionResponse<()> {
        self.update(SessionUpdate::PeopleCount(Some(count))).await
    }

    pub async fn set_budget(&self, budget: f64) -> SessionResponse<()> {
        self.update(SessionUpdate::Budget(Some(budget))).await
    }
}

struct SessionActor {
    record: SessionRecord,
    /// Latest generation issued per slot
    generations: [u64; 3],
    /// Monotonic source for generations
    counter: u64,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionActor {
    fn new(event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            record: SessionRecord::new(),
            generations: [0; 3],
            counter: 0,
            event_tx,
        }
    }

    fn advance(&mut self, slot: Slot) -> u64 {
        self.counter += 1;
        self.generations[slot.index()] = self.counter;
        self.counter
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn written(&mut self, field: SessionField) {
        if let Some(slot) = Slot::for_field(field) {
            self.advance(slot);
        }
        self.notify(SessionEvent::Updated { field });
    }

    fn commit(&mut self, ticket: Ticket, update: SessionUpdate) -> bool {
        let current = self.generations[ticket.slot.index()];
        if current != ticket.generation {
            warn!(
                slot = %ticket.slot,
                generation = ticket.generation,
                current,
                "commit: discarding stale result"
            );
            self.notify(SessionEvent::StaleDiscarded {
                slot: ticket.slot,
                generation: ticket.generation,
            });
            return false;
        }
        let field = update.field();
        update.apply(&mut self.record);
        // Advancing also retires the ticket
        self.written(field);
        true
    }

    fn reset(&mut self) -> SessionRecord {
        self.record = SessionRecord::new();
        for slot in Slot::ALL {
            self.advance(slot);
        }
        info!(session_id = %self.record.id, "Session reset");
        self.notify(SessionEvent::Reset {
            session_id: self.record.id.clone(),
        });
        self.record.clone()
    }
}

async fn actor_loop(mut actor: SessionActor, mut rx: mpsc::Receiver<SessionCommand>) {
    debug!(session_id = %actor.record.id, "Session actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Read { reply } => {
                let _ = reply.send(actor.record.clone());
            }

            SessionCommand::Update { update, reply } => {
                let field = update.field();
                debug!(%field, "actor_loop: Update command");
                update.apply(&mut actor.record);
                actor.written(field);
                let _ = reply.send(());
            }

            SessionCommand::Modify { mutation, reply } => {
                let changed = mutation(&mut actor.record);
                debug!(?changed, "actor_loop: Modify command");
                for field in &changed {
                    actor.written(*field);
                }
                let _ = reply.send(Modified {
                    changed,
                    record: actor.record.clone(),
                });
            }

            SessionCommand::Begin { slot, reply } => {
                let generation = actor.advance(slot);
                debug!(%slot, generation, "actor_loop: Begin command");
                let _ = reply.send(Ticket { slot, generation });
            }

            SessionCommand::Commit { ticket, update, reply } => {
                let applied = actor.commit(ticket, update);
                let _ = reply.send(applied);
            }

            SessionCommand::Reset { reply } => {
                let _ = reply.send(actor.reset());
            }

            SessionCommand::Shutdown => {
                info!("Session actor shutting down");
                break;
            }
        }
    }

    debug!("Session actor stopped");
}
