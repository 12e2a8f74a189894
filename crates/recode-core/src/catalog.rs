//! Question catalog
//!
//! Parses the JSON question list format:
//!
//! ```json
//! [{"name": "Two Sum", "link": "https://...", "difficulty": "Easy", "pattern": "Array & Hashing"}]
//! ```
//!
//! and provides the case-insensitive search used to find questions by name
//! or pattern.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::{Pattern, Question, QuestionDifficulty};

/// Catalog error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Malformed catalog JSON
    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One question as published in a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub link: String,
    pub difficulty: QuestionDifficulty,
    pub pattern: Pattern,
}

impl CatalogEntry {
    /// Materialize as a catalog question with a fresh id, added at `now`
    pub fn into_question(self, now: DateTime<Utc>) -> Question {
        Question::new(self.name, self.link, self.difficulty, self.pattern, now)
    }
}

/// Parse a JSON catalog
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .filter(|e| !e.name.trim().is_empty())
        .collect())
}

/// Read and parse a JSON catalog file
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let json = std::fs::read_to_string(path)?;
    let entries = parse_catalog(&json)?;
    tracing::debug!(path = %path.display(), count = entries.len(), "Catalog loaded");
    Ok(entries)
}

/// Whether `question` matches the search text.
///
/// Case-insensitive substring match on the name or the pattern name.
/// Blank text matches nothing.
pub fn matches_search(question: &Question, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    question.name.to_lowercase().contains(&needle)
        || question.pattern.as_str().to_lowercase().contains(&needle)
}

/// Questions matching the search text, in input order
pub fn filter_questions<'a>(questions: &'a [Question], text: &str) -> Vec<&'a Question> {
    questions.iter().filter(|q| matches_search(q, text)).collect()
}

// ============================================================================
// TESTS
// ============================================================================
