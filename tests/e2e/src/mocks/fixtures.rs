//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Catalog JSON in the published question-list format
//! - Tracked questions with hand-set memory states
//! - A clock the tests move forward explicitly

use chrono::{DateTime, Duration, TimeZone, Utc};
use recode_core::{
    CatalogEntry, LearningState, MemoryState, Pattern, Question, QuestionDifficulty,
    TrackedQuestion,
};

/// Questions used by the sample catalog: (name, difficulty, pattern)
const SAMPLE_QUESTIONS: &[(&str, &str, &str)] = &[
    ("Two Sum", "Easy", "Array & Hashing"),
    ("Valid Anagram", "Easy", "Array & Hashing"),
    ("Valid Palindrome", "Easy", "Two Pointers"),
    ("Best Time to Buy and Sell Stock", "Easy", "Sliding Window"),
    ("Valid Parentheses", "Easy", "Stack"),
    ("Binary Search", "Easy", "Binary Search"),
    ("Reverse Linked List", "Easy", "Linked List"),
    ("Invert Binary Tree", "Easy", "Tree"),
    ("Implement Trie", "Medium", "Trie"),
    ("Kth Largest Element in an Array", "Medium", "Heap/Priority Queue"),
    ("Subsets", "Medium", "Backtracking"),
    ("Number of Islands", "Medium", "Graphs"),
    ("Climbing Stairs", "Easy", "1D Dynamic Programming"),
    ("Unique Paths", "Medium", "2D Dynamic Programming"),
    ("Jump Game", "Medium", "Greedy"),
    ("Merge Intervals", "Medium", "Intervals"),
    ("Rotate Image", "Medium", "Math & Geometry"),
    ("Counting Bits", "Easy", "Bitwise"),
    ("Merge k Sorted Lists", "Hard", "K-way Merge"),
    ("Trapping Rain Water", "Hard", "Two Pointers"),
];

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let json = TestDataFactory::sample_catalog_json();
/// let entries = TestDataFactory::catalog_entries(5);
/// let card = TestDataFactory::review_card("Two Sum", 12.0, due, now);
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    // ========================================================================
    // CATALOG
    // ========================================================================

    /// The full sample catalog as JSON
    pub fn sample_catalog_json() -> String {
        let entries: Vec<serde_json::Value> = SAMPLE_QUESTIONS
            .iter()
            .map(|(name, difficulty, pattern)| {
                serde_json::json!({
                    "name": name,
                    "link": Self::link_for(name),
                    "difficulty": difficulty,
                    "pattern": pattern,
                })
            })
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    /// Number of questions in the sample catalog
    pub fn sample_catalog_len() -> usize {
        SAMPLE_QUESTIONS.len()
    }

    /// `count` generated catalog entries with unique names
    pub fn catalog_entries(count: usize) -> Vec<CatalogEntry> {
        (0..count)
            .map(|i| CatalogEntry {
                name: format!("Generated Question {}", i),
                link: format!("https://example.com/problems/{}", i),
                difficulty: match i % 3 {
                    0 => QuestionDifficulty::Easy,
                    1 => QuestionDifficulty::Medium,
                    _ => QuestionDifficulty::Hard,
                },
                pattern: Pattern::ALL[i % Pattern::ALL.len()],
            })
            .collect()
    }

    fn link_for(name: &str) -> String {
        let slug = name.to_lowercase().replace(' ', "-");
        format!("https://leetcode.com/problems/{}/", slug)
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// A catalog question added at `now` and never tracked
    pub fn question(name: &str, now: DateTime<Utc>) -> Question {
        Question::new(
            name,
            Self::link_for(name),
            QuestionDifficulty::Medium,
            Pattern::Other,
            now,
        )
    }

    /// A freshly tracked question due at `now`
    pub fn new_card(name: &str, now: DateTime<Utc>) -> TrackedQuestion {
        TrackedQuestion::new(Self::question(name, now), now)
    }

    /// A mature card in Review, last reviewed `stability` days before `due`
    pub fn review_card(
        name: &str,
        stability: f64,
        due: DateTime<Utc>,
        last_review: DateTime<Utc>,
    ) -> TrackedQuestion {
        let mut card = Self::new_card(name, last_review);
        let scheduled_days = u32::try_from((due - last_review).num_days().max(1)).unwrap_or(1);
        card.memory = MemoryState {
            due,
            stability,
            difficulty: 5.0,
            elapsed_days: 0,
            scheduled_days,
            reps: 4,
            lapses: 0,
            status: LearningState::Review,
            last_review: Some(last_review),
            learning_step: 0,
        };
        card
    }
}

/// Clock the tests advance by hand
#[derive(Debug, Clone, Copy)]
pub struct TestClock {
    now: DateTime<Utc>,
}

impl TestClock {
    /// Clock at 2024-01-01 09:00 UTC
    pub fn start() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn advance_days(&mut self, days: i64) -> DateTime<Utc> {
        self.now += Duration::days(days);
        self.now
    }

    pub fn advance_hours(&mut self, hours: i64) -> DateTime<Utc> {
        self.now += Duration::hours(hours);
        self.now
    }

    /// Jump to `to`; never moves backwards
    pub fn jump_to(&mut self, to: DateTime<Utc>) -> DateTime<Utc> {
        self.now = self.now.max(to);
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recode_core::parse_catalog;

    #[test]
    fn test_sample_catalog_parses() {
        let entries = parse_catalog(&TestDataFactory::sample_catalog_json()).unwrap();
        assert_eq!(entries.len(), TestDataFactory::sample_catalog_len());
        assert_eq!(entries[0].link, "https://leetcode.com/problems/two-sum/");
        assert_eq!(entries[18].pattern, Pattern::KWayMerge);
    }

    #[test]
    fn test_generated_entries_are_unique() {
        let entries = TestDataFactory::catalog_entries(30);
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 30);
    }

    #[test]
    fn test_clock_never_rewinds() {
        let mut clock = TestClock::start();
        let start = clock.now();
        clock.advance_days(2);
        assert_eq!(clock.jump_to(start), start + Duration::days(2));
        assert_eq!(clock.advance_hours(6), start + Duration::hours(54));
    }
}
