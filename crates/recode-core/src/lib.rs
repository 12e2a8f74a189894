//! # Recode Core
//!
//! Spaced repetition engine for practicing coding-interview questions.
//!
//! - **FSRS scheduling**: power-law forgetting curve, per-item stability and
//!   difficulty, four-way rating with learning and relearning steps
//! - **Review sessions**: pull-based due queue, one item presented at a time,
//!   every rating committed atomically
//! - **Local deck**: SQLite catalog of questions, tracked review cards, review history
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recode_core::{load_catalog, Rating, ReviewSession, Scheduler, Storage};
//! use chrono::Utc;
//!
//! let storage = Storage::new(None)?;
//! storage.import_catalog(load_catalog("questions.json".as_ref())?, Utc::now())?;
//!
//! let question = storage.find_question("Two Sum")?.unwrap();
//! storage.track(&question.id, Utc::now())?;
//!
//! let mut session = ReviewSession::new(&storage, Scheduler::default());
//! if let Some(presentation) = session.present(Utc::now())? {
//!     println!("{}", presentation.item.question.name);
//!     session.answer(Rating::Good, Utc::now())?;
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod catalog;
pub mod fsrs;
pub mod memory;
pub mod review;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    initial_memory_state, reset_memory_state, LearningState, MemoryState, Pattern, Question,
    QuestionDifficulty, Reviewable, TrackedQuestion,
};

// FSRS
pub use fsrs::{
    retrievability, schedule, Rating, ReviewLog, ScheduledReview, Scheduler, SchedulerError,
    SchedulerParameters, SchedulingCandidates,
};

// Catalog
pub use catalog::{filter_questions, load_catalog, parse_catalog, CatalogEntry, CatalogError};

// Review
pub use review::{
    due_count, due_items, InMemoryStore, Presentation, ReviewSession, ReviewStore, SessionError,
    SessionState,
};

// Storage
pub use storage::{DeckStats, ImportSummary, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scheduler model implemented by this crate
pub const FSRS_VERSION: u8 = 4;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        LearningState, MemoryState, Question, Rating, ReviewSession, ReviewStore, Scheduler,
        SchedulerParameters, Storage, StorageError, TrackedQuestion,
    };
}
