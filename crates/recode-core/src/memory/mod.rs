//! Memory Module
//!
//! Per-item review data:
//! - `MemoryState` and its lifecycle (`LearningState`)
//! - The question catalog model and the tracked-question record
//! - The `Reviewable` view consumed by the review selector

mod question;
mod state;

pub use question::{Pattern, Question, QuestionDifficulty, Reviewable, TrackedQuestion};
pub use state::{initial_memory_state, reset_memory_state, LearningState, MemoryState};
