//! Memory State - per-item belief about forgetting dynamics
//!
//! A `MemoryState` is plain data. It is evolved only by the scheduler
//! (`crate::fsrs::schedule`) and replaced wholesale when a review is committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::retrievability;

// ============================================================================
// LEARNING STATE
// ============================================================================

/// Lifecycle stage of a reviewable item.
///
/// ```text
/// New ──▶ Learning ──▶ Review ◀──▶ Relearning
///  └───────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningState {
    /// Never reviewed
    #[default]
    New,
    /// Walking through the fixed learning steps
    Learning,
    /// Long-term, model-driven scheduling
    Review,
    /// Walking through the relearning steps after a lapse
    Relearning,
}

impl LearningState {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningState::New => "new",
            LearningState::Learning => "learning",
            LearningState::Review => "review",
            LearningState::Relearning => "relearning",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(LearningState::New),
            "learning" => Some(LearningState::Learning),
            "review" => Some(LearningState::Review),
            "relearning" => Some(LearningState::Relearning),
            _ => None,
        }
    }
}

impl std::fmt::Display for LearningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MEMORY STATE
// ============================================================================

/// Scheduling state of a single reviewable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Next moment this item becomes eligible for review
    pub due: DateTime<Utc>,
    /// Days until retrievability decays to 90% absent review
    pub stability: f64,
    /// Resistance to stabilization gain (1.0 = easy, 10.0 = hard)
    pub difficulty: f64,
    /// Days since the previous review, as of the last scheduling computation
    pub elapsed_days: u32,
    /// Interval chosen at the last scheduling computation
    pub scheduled_days: u32,
    /// Completed reviews
    pub reps: u32,
    /// Reviews rated Forgot
    pub lapses: u32,
    /// Lifecycle stage
    pub status: LearningState,
    /// Time of the most recent committed review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    /// Position in the learning or relearning step sequence
    #[serde(default)]
    pub learning_step: u32,
}

impl MemoryState {
    /// A fresh, never-reviewed state that is due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            status: LearningState::New,
            last_review: None,
            learning_step: 0,
        }
    }

    /// Whether the item may be reviewed at `now`
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Whole days since the last review (0 if never reviewed or clock skew)
    pub fn days_since_review(&self, now: DateTime<Utc>) -> u32 {
        self.last_review
            .map(|last| (now - last).num_days().max(0))
            .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    /// Modeled recall probability at `now`.
    ///
    /// New items have no memory trace yet and report 0.0.
    pub fn retrievability_at(&self, now: DateTime<Utc>) -> f64 {
        if self.status == LearningState::New || self.stability <= 0.0 {
            return 0.0;
        }
        retrievability(f64::from(self.days_since_review(now)), self.stability)
    }
}

/// State assigned when an item is opted into review tracking.
pub fn initial_memory_state(now: DateTime<Utc>) -> MemoryState {
    MemoryState::new(now)
}

/// Discard all review progress while keeping the item.
pub fn reset_memory_state(now: DateTime<Utc>) -> MemoryState {
    MemoryState::new(now)
}

// ============================================================================
// TESTS
// ============================================================================
