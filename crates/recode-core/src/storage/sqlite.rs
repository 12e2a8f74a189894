//! SQLite Storage Implementation
//!
//! Question catalog, review cards and review history in one local database.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::catalog::{matches_search, CatalogEntry};
use crate::fsrs::{Rating, ReviewLog, ScheduledReview};
use crate::memory::{
    initial_memory_state, reset_memory_state, LearningState, MemoryState, Pattern, Question,
    QuestionDifficulty, TrackedQuestion,
};
use crate::review::ReviewStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Question or card not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Another question already uses this name
    #[error("Duplicate question name: {0}")]
    DuplicateName(String),
    /// Rejected question fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// JSON column could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Outcome of a catalog import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// New questions added
    pub imported: usize,
    /// Entries whose name was already in the catalog
    pub skipped: usize,
}

/// Deck overview
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub total_questions: i64,
    pub tracked: i64,
    /// Tracked, not suspended and due now
    pub due: i64,
    pub suspended: i64,
    pub new: i64,
    pub learning: i64,
    pub review: i64,
    pub relearning: i64,
    pub total_reviews: i64,
    /// Mean retrievability over reviewed cards (0.0 if none)
    pub average_retrievability: f64,
}

// ============================================================================
// STORAGE
// ============================================================================

const CARD_COLUMNS: &str = "q.id, q.name, q.link, q.difficulty, q.pattern, q.created_at,
    c.note, c.hints, c.suspended, c.due, c.stability, c.difficulty AS card_difficulty,
    c.elapsed_days, c.scheduled_days, c.reps, c.lapses, c.status, c.last_review, c.learning_step";

/// Local storage
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, so `Storage` is `Send + Sync`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

/// Platform data directory for the default database and `params.json`
pub fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "recode", "core").ok_or_else(|| {
        StorageError::Init("Could not determine project directories".to_string())
    })?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create new storage instance
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let data_dir = default_data_dir()?;
                std::fs::create_dir_all(&data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(&data_dir, perms);
                }
                data_dir.join("recode.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        tracing::debug!(path = %path.display(), "Storage opened");

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    // ========================================================================
    // CATALOG
    // ========================================================================

    /// Add catalog entries at `now`, skipping names already present
    pub fn import_catalog(
        &self,
        entries: Vec<CatalogEntry>,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        for entry in entries {
            let q = entry.into_question(now);
            let rows = tx.execute(
                "INSERT OR IGNORE INTO questions (id, name, link, difficulty, pattern, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    q.id,
                    q.name,
                    q.link,
                    q.difficulty.as_str(),
                    q.pattern.as_str(),
                    timestamp(&q.created_at),
                ],
            )?;
            if rows > 0 {
                summary.imported += 1;
            } else {
                summary.skipped += 1;
            }
        }
        tx.commit()?;

        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "Catalog imported"
        );
        Ok(summary)
    }

    /// All catalog questions in import order
    pub fn list_questions(&self) -> Result<Vec<Question>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT id, name, link, difficulty, pattern, created_at FROM questions ORDER BY rowid",
        )?;
        let questions = stmt
            .query_map([], Self::row_to_question)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }

    /// Add a custom question at `now`. Names are unique, ignoring case.
    pub fn add_question(&self, entry: CatalogEntry, now: DateTime<Utc>) -> Result<Question> {
        let entry = Self::checked_entry(entry)?;
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        Self::ensure_name_free(&tx, &entry.name, None)?;

        let q = entry.into_question(now);
        tx.execute(
            "INSERT INTO questions (id, name, link, difficulty, pattern, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                q.id,
                q.name,
                q.link,
                q.difficulty.as_str(),
                q.pattern.as_str(),
                timestamp(&q.created_at),
            ],
        )?;
        tx.commit()?;

        tracing::info!(question = %q.id, name = %q.name, "Question added");
        Ok(q)
    }

    /// Replace a question's name, link, difficulty and pattern.
    ///
    /// The review card and history stay attached.
    pub fn update_question(&self, id: &str, entry: CatalogEntry) -> Result<Question> {
        let entry = Self::checked_entry(entry)?;
        {
            let mut writer = self.writer()?;
            let tx = writer.transaction()?;
            Self::ensure_name_free(&tx, &entry.name, Some(id))?;
            let rows = tx.execute(
                "UPDATE questions SET name = ?1, link = ?2, difficulty = ?3, pattern = ?4
                 WHERE id = ?5",
                params![
                    entry.name,
                    entry.link,
                    entry.difficulty.as_str(),
                    entry.pattern.as_str(),
                    id,
                ],
            )?;
            if rows == 0 {
                return Err(StorageError::NotFound(id.to_string()));
            }
            tx.commit()?;
        }

        tracing::debug!(question = id, "Question updated");
        self.get_question(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Remove a question together with its card and history
    pub fn delete_question(&self, id: &str) -> Result<bool> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        tx.execute("DELETE FROM review_logs WHERE question_id = ?1", params![id])?;
        tx.execute("DELETE FROM review_cards WHERE question_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM questions WHERE id = ?1", params![id])?;
        tx.commit()?;

        if rows > 0 {
            tracing::info!(question = id, "Question deleted");
        }
        Ok(rows > 0)
    }

    /// Get a question by ID
    pub fn get_question(&self, id: &str) -> Result<Option<Question>> {
        let reader = self.reader()?;
        let question = reader
            .query_row(
                "SELECT id, name, link, difficulty, pattern, created_at FROM questions
                 WHERE id = ?1",
                params![id],
                Self::row_to_question,
            )
            .optional()?;
        Ok(question)
    }

    /// Look up a question by ID or by name (case-insensitive)
    pub fn find_question(&self, key: &str) -> Result<Option<Question>> {
        let reader = self.reader()?;
        let question = reader
            .query_row(
                "SELECT id, name, link, difficulty, pattern, created_at FROM questions
                 WHERE id = ?1 OR lower(name) = lower(?1)
                 ORDER BY id = ?1 DESC
                 LIMIT 1",
                params![key.trim()],
                Self::row_to_question,
            )
            .optional()?;
        Ok(question)
    }

    /// Questions whose name or pattern contains `text`
    pub fn search_questions(&self, text: &str) -> Result<Vec<Question>> {
        Ok(self
            .list_questions()?
            .into_iter()
            .filter(|q| matches_search(q, text))
            .collect())
    }

    // ========================================================================
    // DECK
    // ========================================================================

    /// Opt a question into review. Already tracked questions are returned unchanged.
    pub fn track(&self, question_id: &str, now: DateTime<Utc>) -> Result<TrackedQuestion> {
        if self.get_question(question_id)?.is_none() {
            return Err(StorageError::NotFound(question_id.to_string()));
        }

        {
            let writer = self.writer()?;
            let memory = initial_memory_state(now);
            let rows = writer.execute(
                "INSERT OR IGNORE INTO review_cards (
                    question_id, due, stability, difficulty, elapsed_days, scheduled_days,
                    reps, lapses, status, last_review, learning_step, tracked_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    question_id,
                    timestamp(&memory.due),
                    memory.stability,
                    memory.difficulty,
                    memory.elapsed_days,
                    memory.scheduled_days,
                    memory.reps,
                    memory.lapses,
                    memory.status.as_str(),
                    memory.last_review.as_ref().map(timestamp),
                    memory.learning_step,
                    timestamp(&now),
                ],
            )?;
            if rows > 0 {
                tracing::debug!(question = question_id, "Question tracked");
            }
        }

        self.get_tracked(question_id)?
            .ok_or_else(|| StorageError::NotFound(question_id.to_string()))
    }

    /// Stop tracking a question and drop its history
    pub fn untrack(&self, question_id: &str) -> Result<bool> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        tx.execute(
            "DELETE FROM review_logs WHERE question_id = ?1",
            params![question_id],
        )?;
        let rows = tx.execute(
            "DELETE FROM review_cards WHERE question_id = ?1",
            params![question_id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Reset a card to a fresh memory state due at `now`, keeping notes and hints
    pub fn forget(&self, question_id: &str, now: DateTime<Utc>) -> Result<TrackedQuestion> {
        {
            let writer = self.writer()?;
            let rows = Self::write_memory(&writer, question_id, &reset_memory_state(now))?;
            if rows == 0 {
                return Err(StorageError::NotFound(question_id.to_string()));
            }
        }
        self.get_tracked(question_id)?
            .ok_or_else(|| StorageError::NotFound(question_id.to_string()))
    }

    /// Pause or resume a card
    pub fn set_suspended(&self, question_id: &str, suspended: bool) -> Result<()> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "UPDATE review_cards SET suspended = ?1 WHERE question_id = ?2",
            params![suspended, question_id],
        )?;
        if rows == 0 {
            return Err(StorageError::NotFound(question_id.to_string()));
        }
        Ok(())
    }

    /// Replace a card's note and hints
    pub fn update_notes(&self, question_id: &str, note: &str, hints: &[String]) -> Result<()> {
        let hints_json = serde_json::to_string(hints)?;
        let writer = self.writer()?;
        let rows = writer.execute(
            "UPDATE review_cards SET note = ?1, hints = ?2 WHERE question_id = ?3",
            params![note, hints_json, question_id],
        )?;
        if rows == 0 {
            return Err(StorageError::NotFound(question_id.to_string()));
        }
        Ok(())
    }

    /// Get a tracked question by question ID
    pub fn get_tracked(&self, question_id: &str) -> Result<Option<TrackedQuestion>> {
        let reader = self.reader()?;
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM review_cards c
             JOIN questions q ON q.id = c.question_id
             WHERE c.question_id = ?1"
        );
        let tracked = reader
            .query_row(&sql, params![question_id], Self::row_to_tracked)
            .optional()?;
        Ok(tracked)
    }

    /// Every tracked question, soonest due first
    pub fn tracked_questions(&self) -> Result<Vec<TrackedQuestion>> {
        let reader = self.reader()?;
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM review_cards c
             JOIN questions q ON q.id = c.question_id
             ORDER BY c.due, q.name"
        );
        let mut stmt = reader.prepare(&sql)?;
        let tracked = stmt
            .query_map([], Self::row_to_tracked)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracked)
    }

    /// Review history for one question, oldest first
    pub fn review_logs(&self, question_id: &str) -> Result<Vec<ReviewLog>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT rating, status, elapsed_days, scheduled_days, reviewed_at
             FROM review_logs WHERE question_id = ?1
             ORDER BY reviewed_at, id",
        )?;
        let logs = stmt
            .query_map(params![question_id], Self::row_to_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// Deck overview at `now`
    pub fn deck_stats(&self, now: DateTime<Utc>) -> Result<DeckStats> {
        let cards = self.tracked_questions()?;

        let (total_questions, total_reviews) = {
            let reader = self.reader()?;
            let questions: i64 =
                reader.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
            let reviews: i64 =
                reader.query_row("SELECT COUNT(*) FROM review_logs", [], |row| row.get(0))?;
            (questions, reviews)
        };

        let mut stats = DeckStats {
            total_questions,
            total_reviews,
            tracked: cards.len() as i64,
            ..Default::default()
        };

        let mut retrievability_sum = 0.0;
        let mut reviewed_cards = 0u32;
        for card in &cards {
            match card.memory.status {
                LearningState::New => stats.new += 1,
                LearningState::Learning => stats.learning += 1,
                LearningState::Review => stats.review += 1,
                LearningState::Relearning => stats.relearning += 1,
            }
            if card.suspended {
                stats.suspended += 1;
            } else if card.memory.is_due_at(now) {
                stats.due += 1;
            }
            if card.memory.status != LearningState::New {
                retrievability_sum += card.memory.retrievability_at(now);
                reviewed_cards += 1;
            }
        }
        if reviewed_cards > 0 {
            stats.average_retrievability = retrievability_sum / f64::from(reviewed_cards);
        }

        Ok(stats)
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    fn checked_entry(mut entry: CatalogEntry) -> Result<CatalogEntry> {
        entry.name = entry.name.trim().to_string();
        entry.link = entry.link.trim().to_string();
        if entry.name.is_empty() {
            return Err(StorageError::InvalidInput(
                "question name must not be empty".to_string(),
            ));
        }
        Ok(entry)
    }

    /// Fails if a question other than `except` already uses `name`
    fn ensure_name_free(conn: &Connection, name: &str, except: Option<&str>) -> Result<()> {
        let taken: Option<String> = conn
            .query_row(
                "SELECT id FROM questions WHERE lower(name) = lower(?1) AND id IS NOT ?2 LIMIT 1",
                params![name, except],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(StorageError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn write_memory(conn: &Connection, question_id: &str, memory: &MemoryState) -> Result<usize> {
        let rows = conn.execute(
            "UPDATE review_cards SET
                due = ?1,
                stability = ?2,
                difficulty = ?3,
                elapsed_days = ?4,
                scheduled_days = ?5,
                reps = ?6,
                lapses = ?7,
                status = ?8,
                last_review = ?9,
                learning_step = ?10
            WHERE question_id = ?11",
            params![
                timestamp(&memory.due),
                memory.stability,
                memory.difficulty,
                memory.elapsed_days,
                memory.scheduled_days,
                memory.reps,
                memory.lapses,
                memory.status.as_str(),
                memory.last_review.as_ref().map(timestamp),
                memory.learning_step,
                question_id,
            ],
        )?;
        Ok(rows)
    }

    fn insert_log(tx: &Transaction, question_id: &str, log: &ReviewLog) -> Result<()> {
        tx.execute(
            "INSERT INTO review_logs (
                question_id, rating, status, elapsed_days, scheduled_days, reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                question_id,
                log.rating.as_i32(),
                log.status.as_str(),
                log.elapsed_days,
                log.scheduled_days,
                timestamp(&log.reviewed_at),
            ],
        )?;
        Ok(())
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                invalid_column(format!(
                    "Invalid {} timestamp '{}': {}",
                    field_name, value, e
                ))
            })
    }

    fn row_to_question(row: &rusqlite::Row) -> rusqlite::Result<Question> {
        let difficulty: String = row.get("difficulty")?;
        let pattern: String = row.get("pattern")?;
        let created_at: String = row.get("created_at")?;

        Ok(Question {
            id: row.get("id")?,
            name: row.get("name")?,
            link: row.get("link")?,
            difficulty: QuestionDifficulty::parse_name(&difficulty)
                .ok_or_else(|| invalid_column(format!("Unknown difficulty '{}'", difficulty)))?,
            pattern: Pattern::parse_name(&pattern),
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    fn row_to_tracked(row: &rusqlite::Row) -> rusqlite::Result<TrackedQuestion> {
        let question = Self::row_to_question(row)?;

        let hints_json: String = row.get("hints")?;
        let hints: Vec<String> = serde_json::from_str(&hints_json)
            .map_err(|e| invalid_column(format!("Invalid hints '{}': {}", hints_json, e)))?;

        let due: String = row.get("due")?;
        let status: String = row.get("status")?;
        let last_review: Option<String> = row.get("last_review")?;

        let memory = MemoryState {
            due: Self::parse_timestamp(&due, "due")?,
            stability: row.get("stability")?,
            difficulty: row.get("card_difficulty")?,
            elapsed_days: row.get("elapsed_days")?,
            scheduled_days: row.get("scheduled_days")?,
            reps: row.get("reps")?,
            lapses: row.get("lapses")?,
            status: LearningState::parse_name(&status)
                .ok_or_else(|| invalid_column(format!("Unknown status '{}'", status)))?,
            last_review: last_review
                .map(|s| Self::parse_timestamp(&s, "last_review"))
                .transpose()?,
            learning_step: row.get("learning_step")?,
        };

        Ok(TrackedQuestion {
            question,
            note: row.get("note")?,
            hints,
            suspended: row.get("suspended")?,
            memory,
        })
    }

    fn row_to_log(row: &rusqlite::Row) -> rusqlite::Result<ReviewLog> {
        let rating: i32 = row.get("rating")?;
        let status: String = row.get("status")?;
        let reviewed_at: String = row.get("reviewed_at")?;

        Ok(ReviewLog {
            rating: Rating::from_i32(rating)
                .ok_or_else(|| invalid_column(format!("Unknown rating {}", rating)))?,
            status: LearningState::parse_name(&status)
                .ok_or_else(|| invalid_column(format!("Unknown status '{}'", status)))?,
            elapsed_days: row.get("elapsed_days")?,
            scheduled_days: row.get("scheduled_days")?,
            reviewed_at: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
        })
    }
}

impl ReviewStore for Storage {
    type Item = TrackedQuestion;
    type Error = StorageError;

    fn review_items(&self) -> Result<Vec<TrackedQuestion>> {
        self.tracked_questions()
    }

    fn commit_review(&self, item_id: &str, review: &ScheduledReview) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;

        // Dropping the transaction without commit rolls back
        if Self::write_memory(&tx, item_id, &review.state)? == 0 {
            return Err(StorageError::NotFound(item_id.to_string()));
        }
        Self::insert_log(&tx, item_id, &review.log)?;
        tx.commit()?;

        tracing::debug!(
            question = item_id,
            rating = %review.log.rating,
            due = %review.state.due,
            "Review stored"
        );
        Ok(())
    }
}

/// Fixed-width RFC3339 so text order matches time order
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn invalid_column(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

// ============================================================================
// TESTS
// ============================================================================
