//! Test data

mod fixtures;

pub use fixtures::{TestClock, TestDataFactory};
