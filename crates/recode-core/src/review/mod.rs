//! Review Module
//!
//! - Selector: which items are due right now
//! - Store: where items live and how reviews are committed
//! - Session: present one item at a time, commit the chosen outcome

mod selector;
mod session;
mod store;

pub use selector::{due_count, due_items, first_due};
pub use session::{Presentation, ReviewSession, SessionError, SessionState};
pub use store::{InMemoryStore, ReviewStore, StoreError};
