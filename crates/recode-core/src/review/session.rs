//! Review Session Controller
//!
//! `Idle -> Presenting(item) -> commit -> Presenting(next) -> ... -> Idle`
//!
//! The due queue is re-read from the store after every commit, so an item
//! whose new due date is still in the past would be presented again.
//!
//! An item that cannot be scheduled, or that the learner skips, is set aside
//! for the rest of the session so the items behind it stay reachable.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::selector::{due_count, first_due};
use super::store::ReviewStore;
use crate::fsrs::{Rating, Scheduler, SchedulerError, SchedulingCandidates};
use crate::memory::Reviewable;

/// Session error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The presented item could not be scheduled
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// The store failed to read or commit
    #[error("Store error: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> SessionError {
    SessionError::Store(Box::new(e))
}

/// The item being reviewed with its candidate outcomes
#[derive(Debug)]
pub struct Presentation<I> {
    pub item: I,
    /// Computed when the item was presented
    pub candidates: SchedulingCandidates,
}

/// Where the session is
#[derive(Debug)]
pub enum SessionState<I> {
    /// Nothing presented; the queue was empty at the last check
    Idle,
    Presenting(Presentation<I>),
}

/// One interactive pass over the due queue
pub struct ReviewSession<'a, S: ReviewStore> {
    store: &'a S,
    scheduler: Scheduler,
    state: SessionState<S::Item>,
    reviewed: usize,
    set_aside: HashSet<String>,
}

impl<'a, S: ReviewStore> ReviewSession<'a, S> {
    /// Idle session over `store`
    pub fn new(store: &'a S, scheduler: Scheduler) -> Self {
        Self {
            store,
            scheduler,
            state: SessionState::Idle,
            reviewed: 0,
            set_aside: HashSet::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState<S::Item> {
        &self.state
    }

    /// Item being presented, if any
    pub fn current(&self) -> Option<&Presentation<S::Item>> {
        match &self.state {
            SessionState::Presenting(p) => Some(p),
            SessionState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    /// Reviews committed in this session
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    /// Items skipped or found unschedulable in this session
    pub fn set_aside(&self) -> usize {
        self.set_aside.len()
    }

    /// Items due at `now`, including the one being presented
    pub fn remaining(&self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        Ok(due_count(&self.queue()?, now))
    }

    /// Present the next due item.
    ///
    /// Returns `None` when nothing is due ("nothing to review"). If an item
    /// is already presented it is returned unchanged. A scheduling error
    /// leaves the session idle with the failing item set aside, so the next
    /// call moves on to the rest of the queue.
    pub fn present(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<&Presentation<S::Item>>, SessionError> {
        if self.is_idle() {
            self.advance(now)?;
        }
        Ok(self.current())
    }

    /// Commit the candidate for `rating` and move to the next due item.
    ///
    /// A no-op returning `None` while idle. If the commit fails the item
    /// stays presented and nothing is written.
    pub fn answer(
        &mut self,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<Option<&Presentation<S::Item>>, SessionError> {
        let presentation = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Presenting(p) => p,
            SessionState::Idle => return Ok(None),
        };

        let review = presentation.candidates.get(rating);
        if let Err(e) = self.store.commit_review(presentation.item.item_id(), review) {
            self.state = SessionState::Presenting(presentation);
            return Err(store_error(e));
        }

        self.reviewed += 1;
        tracing::debug!(
            item = presentation.item.item_id(),
            %rating,
            status = %review.state.status,
            scheduled_days = review.state.scheduled_days,
            "Review committed"
        );

        self.advance(now)?;
        Ok(self.current())
    }

    /// Set the presented item aside without committing and move on.
    ///
    /// A no-op returning `None` while idle.
    pub fn skip(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<&Presentation<S::Item>>, SessionError> {
        let presentation = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Presenting(p) => p,
            SessionState::Idle => return Ok(None),
        };

        let id = presentation.item.item_id().to_string();
        tracing::debug!(item = %id, "Review skipped");
        self.set_aside.insert(id);

        self.advance(now)?;
        Ok(self.current())
    }

    /// Store contents minus the items set aside
    fn queue(&self) -> Result<Vec<S::Item>, SessionError> {
        let mut items = self.store.review_items().map_err(store_error)?;
        items.retain(|item| !self.set_aside.contains(item.item_id()));
        Ok(items)
    }

    fn advance(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.state = SessionState::Idle;

        let Some(item) = first_due(self.queue()?, now) else {
            tracing::debug!(reviewed = self.reviewed, "Review queue empty");
            return Ok(());
        };

        let candidates = match self.scheduler.schedule(item.memory_state(), now) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(item = item.item_id(), error = %e, "Item set aside");
                self.set_aside.insert(item.item_id().to_string());
                return Err(e.into());
            }
        };
        self.state = SessionState::Presenting(Presentation { item, candidates });
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
