//! Scheduler parameters
//!
//! Tuning knobs for the scheduler, loadable from JSON. Missing fields take
//! their defaults, and every set of parameters is validated before use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::algorithm::{
    DEFAULT_RETENTION, DEFAULT_WEIGHTS, MAX_DIFFICULTY, MAX_STABILITY, MIN_DIFFICULTY,
    WEIGHT_COUNT,
};
use super::scheduler::SchedulerError;

/// Default lower bound on any scheduled interval (days)
pub const DEFAULT_MIN_INTERVAL: u32 = 1;

/// Default upper bound on any scheduled interval (days)
pub const DEFAULT_MAX_INTERVAL: u32 = 36500;

/// Largest accepted `maxInterval`: no memory outlasts `MAX_STABILITY` days
pub const INTERVAL_LIMIT: u32 = MAX_STABILITY as u32;

/// Default model interval a New item needs to skip the learning steps
pub const DEFAULT_GRADUATING_INTERVAL: u32 = 4;

/// Parameters for [`super::Scheduler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SchedulerParameters {
    /// FSRS weights w0..w16
    pub weights: [f64; WEIGHT_COUNT],
    /// Target probability of recall when an item comes due
    pub desired_retention: f64,
    /// Shortest interval ever scheduled (days)
    pub min_interval: u32,
    /// Longest interval ever scheduled (days)
    pub max_interval: u32,
    /// Step lengths (days) walked while Learning
    pub learning_steps: Vec<u32>,
    /// Step lengths (days) walked while Relearning
    pub relearning_steps: Vec<u32>,
    /// A New item rated Good/Easy goes straight to Review when its model
    /// interval reaches this many days
    pub graduating_interval: u32,
    /// Spread review-state intervals over a small seeded band
    pub enable_fuzz: bool,
}

impl Default for SchedulerParameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            learning_steps: vec![1],
            relearning_steps: vec![1],
            graduating_interval: DEFAULT_GRADUATING_INTERVAL,
            enable_fuzz: false,
        }
    }
}

impl SchedulerParameters {
    /// Parse parameters from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        let params: Self = serde_json::from_str(json).map_err(|e| {
            SchedulerError::InvalidParameters(format!("malformed parameters: {}", e))
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a JSON file and validate them
    pub fn from_file(path: &Path) -> Result<Self, SchedulerError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::InvalidParameters(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Copy with fuzz switched on or off
    pub fn with_fuzz(mut self, enabled: bool) -> Self {
        self.enable_fuzz = enabled;
        self
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let w = &self.weights;
        let invalid = |msg: String| -> Result<(), SchedulerError> {
            Err(SchedulerError::InvalidParameters(msg))
        };

        if let Some(i) = w.iter().position(|v| !v.is_finite()) {
            return invalid(format!("weight w{} is not finite", i));
        }
        if let Some(i) = w.iter().position(|v| *v < 0.0) {
            return invalid(format!("weight w{} is negative ({})", i, w[i]));
        }
        if let Some(i) = w[..4].iter().position(|v| *v <= 0.0) {
            return invalid(format!("base stability w{} must be positive", i));
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&w[4]) {
            return invalid(format!("initial difficulty w4 must lie in [1, 10], got {}", w[4]));
        }
        if w[7] > 1.0 {
            return invalid(format!("mean reversion w7 must lie in [0, 1], got {}", w[7]));
        }
        for i in [11, 13, 15] {
            if w[i] <= 0.0 {
                return invalid(format!("weight w{} must be positive", i));
            }
        }
        if w[16] < 1.0 {
            return invalid(format!("easy bonus w16 must be at least 1, got {}", w[16]));
        }

        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return invalid(format!(
                "desired retention must lie in (0, 1), got {}",
                self.desired_retention
            ));
        }
        if self.min_interval < 1 {
            return invalid("minimum interval must be at least 1 day".to_string());
        }
        if self.max_interval < self.min_interval {
            return invalid(format!(
                "maximum interval {} is below minimum interval {}",
                self.max_interval, self.min_interval
            ));
        }
        if self.max_interval > INTERVAL_LIMIT {
            return invalid(format!(
                "maximum interval {} exceeds {} days",
                self.max_interval, INTERVAL_LIMIT
            ));
        }
        if self.graduating_interval < 1 {
            return invalid("graduating interval must be at least 1 day".to_string());
        }

        for (name, steps) in [
            ("learning", &self.learning_steps),
            ("relearning", &self.relearning_steps),
        ] {
            if steps.is_empty() {
                return invalid(format!("{} steps must not be empty", name));
            }
            if steps.iter().any(|&s| s < 1) {
                return invalid(format!("{} steps must each be at least 1 day", name));
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
