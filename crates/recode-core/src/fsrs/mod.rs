//! FSRS (Free Spaced Repetition Scheduler) Module
//!
//! Memory-model-based scheduling for reviewable items.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY with DECAY = -0.5, FACTOR = 19/81
//! - Interval: t = S/FACTOR * (R^(1/DECAY) - 1)
//!
//! ## Two tiers
//! - Learning / Relearning: short fixed steps while the memory is fragile
//! - Review: stability-driven intervals targeting the desired retention

mod algorithm;
mod params;
mod scheduler;

pub use algorithm::{
    fuzz_interval,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    // Core functions
    retrievability,
    // Constants
    DECAY,
    DEFAULT_RETENTION,
    DEFAULT_WEIGHTS,
    FACTOR,
    MAX_DIFFICULTY,
    MAX_STABILITY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
    WEIGHT_COUNT,
};

pub use params::{
    SchedulerParameters, DEFAULT_GRADUATING_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL,
    INTERVAL_LIMIT,
};

pub use scheduler::{
    schedule, Rating, ReviewLog, ScheduledReview, Scheduler, SchedulerError, SchedulingCandidates,
};
