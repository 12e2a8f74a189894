//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Question catalog import and search
//! - Review cards holding each tracked question's memory state
//! - Review history written in the same transaction as the state change

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{default_data_dir, DeckStats, ImportSummary, Result, Storage, StorageError};
