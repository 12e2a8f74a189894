//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded catalogs and tracked decks
//! - Reopening the same file to check persistence

use chrono::{DateTime, Utc};
use recode_core::{parse_catalog, Storage};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::mocks::TestDataFactory;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = TestDatabaseManager::new_temp();
/// let ids = db.seed_tracked(5, clock.now());
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Storage,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_recode.db");

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Create a test database at a specific path
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::new(Some(path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close and reopen the database file
    pub fn reopen(&mut self) {
        let fresh = Storage::new(Some(self.db_path.clone())).expect("Failed to reopen storage");
        // Replacing drops the old connections
        self.storage = fresh;
    }

    /// Number of catalog questions
    pub fn question_count(&self) -> usize {
        self.storage.list_questions().map(|q| q.len()).unwrap_or(0)
    }

    /// Number of tracked questions
    pub fn tracked_count(&self) -> usize {
        self.storage
            .tracked_questions()
            .map(|t| t.len())
            .unwrap_or(0)
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.question_count() == 0
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Import the sample catalog, returning question IDs in catalog order
    pub fn seed_catalog(&mut self) -> Vec<String> {
        let entries = parse_catalog(&TestDataFactory::sample_catalog_json())
            .expect("Sample catalog should parse");
        self.storage
            .import_catalog(entries, Utc::now())
            .expect("Failed to import catalog");
        self.storage
            .list_questions()
            .expect("Failed to list questions")
            .into_iter()
            .map(|q| q.id)
            .collect()
    }

    /// Import `count` generated questions and track all of them at `now`
    pub fn seed_tracked(&mut self, count: usize, now: DateTime<Utc>) -> Vec<String> {
        let entries = TestDataFactory::catalog_entries(count);
        let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        self.storage
            .import_catalog(entries, now)
            .expect("Failed to import generated entries");

        let mut ids = Vec::with_capacity(count);
        for name in names {
            if let Ok(Some(question)) = self.storage.find_question(&name) {
                if let Ok(card) = self.storage.track(&question.id, now) {
                    ids.push(card.question.id);
                }
            }
        }
        ids
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Recreate the database (useful for testing migrations)
    pub fn recreate(&mut self) {
        // Park on a scratch file so the old connections close before deletion
        let scratch = self.db_path.with_extension("scratch.db");
        self.storage = Storage::new(Some(scratch)).expect("Failed to open scratch storage");

        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.db_path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(file));
        }

        self.storage = Storage::new(Some(self.db_path.clone()))
            .expect("Failed to recreate storage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::TestClock;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_catalog() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_catalog();
        assert_eq!(ids.len(), TestDataFactory::sample_catalog_len());
        assert_eq!(db.tracked_count(), 0);
    }

    #[test]
    fn test_seed_tracked() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_tracked(8, TestClock::start().now());
        assert_eq!(ids.len(), 8);
        assert_eq!(db.tracked_count(), 8);
    }

    #[test]
    fn test_recreate_empties_database() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_catalog();
        db.recreate();
        assert!(db.is_empty());
    }
}
