//! End-to-end test support for Recode
//!
//! - `harness`: isolated temporary databases
//! - `mocks`: catalog fixtures, seeded decks and a controllable clock

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::{TestClock, TestDataFactory};
