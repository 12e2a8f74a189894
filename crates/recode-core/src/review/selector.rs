//! Review Selector
//!
//! Pull-based: the due set is recomputed on every call, never cached.

use chrono::{DateTime, Utc};

use crate::memory::Reviewable;

/// Items due at `now` that are not suspended, in input order
pub fn due_items<T: Reviewable>(items: &[T], now: DateTime<Utc>) -> Vec<&T> {
    items.iter().filter(|item| is_due(*item, now)).collect()
}

/// Number of items [`due_items`] would return
pub fn due_count<T: Reviewable>(items: &[T], now: DateTime<Utc>) -> usize {
    items.iter().filter(|item| is_due(*item, now)).count()
}

/// First due item, taking ownership of the snapshot
pub fn first_due<T: Reviewable>(items: Vec<T>, now: DateTime<Utc>) -> Option<T> {
    items.into_iter().find(|item| is_due(item, now))
}

fn is_due<T: Reviewable>(item: &T, now: DateTime<Utc>) -> bool {
    !item.is_suspended() && item.memory_state().is_due_at(now)
}
