//! Question - the unit the learner practices
//!
//! Each question carries catalog metadata (name, link, difficulty, pattern).
//! Once the learner opts it into review it becomes a `TrackedQuestion`
//! that owns a note, hints, a pause flag and its `MemoryState`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::MemoryState;

// ============================================================================
// CATALOG ENUMS
// ============================================================================

/// Published difficulty of a coding question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestionDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuestionDifficulty {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionDifficulty::Easy => "Easy",
            QuestionDifficulty::Medium => "Medium",
            QuestionDifficulty::Hard => "Hard",
        }
    }

    /// Parse from string name (case-insensitive)
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(QuestionDifficulty::Easy),
            "medium" => Some(QuestionDifficulty::Medium),
            "hard" => Some(QuestionDifficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Problem-solving pattern a question exercises
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Pattern {
    #[serde(rename = "Array & Hashing")]
    ArrayAndHashing,
    #[serde(rename = "Two Pointers")]
    TwoPointers,
    #[serde(rename = "Sliding Window")]
    SlidingWindow,
    #[serde(rename = "Stack")]
    Stack,
    #[serde(rename = "Binary Search")]
    BinarySearch,
    #[serde(rename = "Linked List")]
    LinkedList,
    #[serde(rename = "Tree")]
    Tree,
    #[serde(rename = "Trie")]
    Trie,
    #[serde(rename = "Heap/Priority Queue")]
    Heap,
    #[serde(rename = "Backtracking")]
    Backtracking,
    #[serde(rename = "Graphs")]
    Graphs,
    #[serde(rename = "1D Dynamic Programming")]
    OneDimensionalDp,
    #[serde(rename = "2D Dynamic Programming")]
    TwoDimensionalDp,
    #[serde(rename = "Greedy")]
    Greedy,
    #[serde(rename = "Intervals")]
    Intervals,
    #[serde(rename = "Math & Geometry")]
    MathAndGeometry,
    #[serde(rename = "Bitwise")]
    Bitwise,
    #[serde(rename = "String")]
    String,
    #[serde(rename = "Cyclic Sort")]
    CyclicSort,
    #[serde(rename = "Top K Element")]
    TopKElement,
    #[serde(rename = "K-way Merge")]
    KWayMerge,
    #[serde(rename = "0/1 Knapsack")]
    ZeroOneKnapsack,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl Pattern {
    /// Every pattern, in catalog order
    pub const ALL: [Pattern; 23] = [
        Pattern::ArrayAndHashing,
        Pattern::TwoPointers,
        Pattern::SlidingWindow,
        Pattern::Stack,
        Pattern::BinarySearch,
        Pattern::LinkedList,
        Pattern::Tree,
        Pattern::Trie,
        Pattern::Heap,
        Pattern::Backtracking,
        Pattern::Graphs,
        Pattern::OneDimensionalDp,
        Pattern::TwoDimensionalDp,
        Pattern::Greedy,
        Pattern::Intervals,
        Pattern::MathAndGeometry,
        Pattern::Bitwise,
        Pattern::String,
        Pattern::CyclicSort,
        Pattern::TopKElement,
        Pattern::KWayMerge,
        Pattern::ZeroOneKnapsack,
        Pattern::Other,
    ];

    /// Human-readable name, identical to the catalog wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::ArrayAndHashing => "Array & Hashing",
            Pattern::TwoPointers => "Two Pointers",
            Pattern::SlidingWindow => "Sliding Window",
            Pattern::Stack => "Stack",
            Pattern::BinarySearch => "Binary Search",
            Pattern::LinkedList => "Linked List",
            Pattern::Tree => "Tree",
            Pattern::Trie => "Trie",
            Pattern::Heap => "Heap/Priority Queue",
            Pattern::Backtracking => "Backtracking",
            Pattern::Graphs => "Graphs",
            Pattern::OneDimensionalDp => "1D Dynamic Programming",
            Pattern::TwoDimensionalDp => "2D Dynamic Programming",
            Pattern::Greedy => "Greedy",
            Pattern::Intervals => "Intervals",
            Pattern::MathAndGeometry => "Math & Geometry",
            Pattern::Bitwise => "Bitwise",
            Pattern::String => "String",
            Pattern::CyclicSort => "Cyclic Sort",
            Pattern::TopKElement => "Top K Element",
            Pattern::KWayMerge => "K-way Merge",
            Pattern::ZeroOneKnapsack => "0/1 Knapsack",
            Pattern::Other => "Other",
        }
    }

    /// Parse from display name (case-insensitive), unknown names map to `Other`
    pub fn parse_name(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(Pattern::Other)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// QUESTION
// ============================================================================

/// A catalog question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Title, unique within the catalog
    pub name: String,
    /// Link to the problem statement
    pub link: String,
    pub difficulty: QuestionDifficulty,
    pub pattern: Pattern,
    /// When the question entered the catalog
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Create a question with a fresh id
    pub fn new(
        name: impl Into<String>,
        link: impl Into<String>,
        difficulty: QuestionDifficulty,
        pattern: Pattern,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            link: link.into(),
            difficulty,
            pattern,
            created_at,
        }
    }
}

/// A question the learner has opted into review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedQuestion {
    pub question: Question,
    /// Free-form note shown during review
    #[serde(default)]
    pub note: String,
    /// Hints revealed one by one during review
    #[serde(default)]
    pub hints: Vec<String>,
    /// Paused questions never enter the review queue
    #[serde(default)]
    pub suspended: bool,
    pub memory: MemoryState,
}

impl TrackedQuestion {
    /// Start tracking `question` with a fresh memory state due at `now`
    pub fn new(question: Question, now: DateTime<Utc>) -> Self {
        Self {
            question,
            note: String::new(),
            hints: Vec::new(),
            suspended: false,
            memory: super::state::initial_memory_state(now),
        }
    }
}

// ============================================================================
// REVIEWABLE VIEW
// ============================================================================

/// The view of an item the review selector and session need.
///
/// Suspension belongs to the owning record, not to `MemoryState`.
pub trait Reviewable {
    /// Stable identifier used to commit reviews
    fn item_id(&self) -> &str;
    /// Current scheduling state
    fn memory_state(&self) -> &MemoryState;
    /// Whether the item is excluded from review
    fn is_suspended(&self) -> bool;
}

impl Reviewable for TrackedQuestion {
    fn item_id(&self) -> &str {
        &self.question.id
    }

    fn memory_state(&self) -> &MemoryState {
        &self.memory
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl<T: Reviewable> Reviewable for &T {
    fn item_id(&self) -> &str {
        (*self).item_id()
    }

    fn memory_state(&self) -> &MemoryState {
        (*self).memory_state()
    }

    fn is_suspended(&self) -> bool {
        (*self).is_suspended()
    }
}

// ============================================================================
// TESTS
// ============================================================================
