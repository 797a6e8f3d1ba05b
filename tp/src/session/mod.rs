//! Session state with actor pattern
//!
//! SessionManager owns the single SessionRecord and processes commands
//! via channels, so updates apply strictly in the order they are issued.

mod manager;
mod messages;

pub use manager::{SessionEvent, SessionManager};
pub use messages::{
    Commit, Modified, Mutation, SessionCommand, SessionError, SessionResponse, SessionUpdate, Slot, Ticket,
};
