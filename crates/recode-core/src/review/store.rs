//! Review stores
//!
//! A store owns the item records. Commits replace an item's whole
//! `MemoryState` or leave it untouched, and are serialized per store.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::fsrs::{ReviewLog, ScheduledReview};
use crate::memory::{Reviewable, TrackedQuestion};

/// Source of reviewable items and sink for committed reviews
pub trait ReviewStore {
    /// Item view handed to the selector
    type Item: Reviewable;
    /// Store failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every tracked item, freshly read
    fn review_items(&self) -> Result<Vec<Self::Item>, Self::Error>;

    /// Atomically replace the item's memory state with `review.state`
    /// and record `review.log`
    fn commit_review(&self, item_id: &str, review: &ScheduledReview) -> Result<(), Self::Error>;
}

/// In-memory store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A writer panicked while holding the lock
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Mutex-guarded store for embedders and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<Vec<TrackedQuestion>>,
    logs: Mutex<HashMap<String, Vec<ReviewLog>>>,
}

impl InMemoryStore {
    /// Store holding `items`
    pub fn new(items: Vec<TrackedQuestion>) -> Self {
        Self {
            items: Mutex::new(items),
            logs: Mutex::new(HashMap::new()),
        }
    }

    /// Add an item
    pub fn insert(&self, item: TrackedQuestion) -> Result<(), StoreError> {
        self.items.lock().map_err(|_| StoreError::Poisoned)?.push(item);
        Ok(())
    }

    /// Snapshot of one item
    pub fn get(&self, item_id: &str) -> Result<Option<TrackedQuestion>, StoreError> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.iter().find(|i| i.item_id() == item_id).cloned())
    }

    /// Pause or resume an item
    pub fn set_suspended(&self, item_id: &str, suspended: bool) -> Result<(), StoreError> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        let item = items
            .iter_mut()
            .find(|i| i.item_id() == item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))?;
        item.suspended = suspended;
        Ok(())
    }

    /// Review history for one item, oldest first
    pub fn logs(&self, item_id: &str) -> Result<Vec<ReviewLog>, StoreError> {
        let logs = self.logs.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(logs.get(item_id).cloned().unwrap_or_default())
    }
}

impl ReviewStore for InMemoryStore {
    type Item = TrackedQuestion;
    type Error = StoreError;

    fn review_items(&self) -> Result<Vec<TrackedQuestion>, StoreError> {
        Ok(self.items.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn commit_review(&self, item_id: &str, review: &ScheduledReview) -> Result<(), StoreError> {
        // Hold the item lock across both writes so readers never see half a commit
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        let mut logs = self.logs.lock().map_err(|_| StoreError::Poisoned)?;

        let item = items
            .iter_mut()
            .find(|i| i.item_id() == item_id)
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))?;

        item.memory = review.state.clone();
        logs.entry(item_id.to_string())
            .or_default()
            .push(review.log.clone());
        Ok(())
    }
}
