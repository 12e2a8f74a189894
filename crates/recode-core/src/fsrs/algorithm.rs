//! FSRS formulas
//!
//! Pure functions over `f64`. Nothing in here reads the clock or keeps state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::scheduler::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of FSRS weights
pub const WEIGHT_COUNT: usize = 17;

/// Default FSRS v4 weights
pub const DEFAULT_WEIGHTS: [f64; WEIGHT_COUNT] = [
    0.4, 0.6, 2.4, 5.8, // w0-w3: initial stability per rating
    4.93, 0.94, 0.86, 0.01, // w4-w7: difficulty
    1.49, 0.14, 0.94, // w8-w10: recall stability
    2.18, 0.05, 0.34, 1.26, // w11-w14: post-lapse stability
    0.29, 2.61, // w15-w16: hard penalty, easy bonus
];

/// Forgetting curve exponent
pub const DECAY: f64 = -0.5;

/// Chosen so that R(S, S) = 0.9
pub const FACTOR: f64 = 19.0 / 81.0;

/// Default target recall probability
pub const DEFAULT_RETENTION: f64 = 0.9;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

pub const MIN_STABILITY: f64 = 0.01;
pub const MAX_STABILITY: f64 = 36500.0;

/// Post-lapse stability never exceeds this fraction of the pre-lapse value
pub const LAPSE_STABILITY_CEILING: f64 = 0.95;

/// Floor applied to initial stability
const INITIAL_STABILITY_FLOOR: f64 = 0.1;

/// Intervals shorter than this are never fuzzed
const FUZZ_THRESHOLD: f64 = 2.5;

/// (start, end, factor) fuzz bands
const FUZZ_RANGES: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

// ============================================================================
// FORGETTING MODEL
// ============================================================================

/// Probability of recall after `elapsed_days` for a memory of `stability`.
///
/// `R = (1 + FACTOR * t / S) ^ DECAY`. Returns 1.0 at `t <= 0`.
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    if elapsed_days <= 0.0 {
        return 1.0;
    }
    if stability <= 0.0 {
        return 0.0;
    }
    (1.0 + FACTOR * elapsed_days / stability).powf(DECAY)
}

/// Days until retrievability falls to `desired_retention` (inverse curve, unrounded)
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    stability / FACTOR * (desired_retention.powf(1.0 / DECAY) - 1.0)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Difficulty assigned on the first review
pub fn initial_difficulty(w: &[f64; WEIGHT_COUNT], rating: Rating) -> f64 {
    let g = f64::from(rating.as_i32());
    clamp_difficulty(w[4] - w[5] * (g - 3.0))
}

/// Difficulty after a review, mean-reverted toward the Good initial difficulty
pub fn next_difficulty(w: &[f64; WEIGHT_COUNT], difficulty: f64, rating: Rating) -> f64 {
    let g = f64::from(rating.as_i32());
    let shifted = difficulty - w[6] * (g - 3.0);
    clamp_difficulty(w[7] * w[4] + (1.0 - w[7]) * shifted)
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability assigned on the first review
pub fn initial_stability(w: &[f64; WEIGHT_COUNT], rating: Rating) -> f64 {
    let idx = (rating.as_i32() - 1) as usize;
    w[idx].max(INITIAL_STABILITY_FLOOR)
}

/// Stability after a successful recall (Hard, Good or Easy).
///
/// Growth shrinks as `retrievability` approaches 1: expected recalls teach little.
pub fn next_recall_stability(
    w: &[f64; WEIGHT_COUNT],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };

    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    (stability * (1.0 + growth)).min(MAX_STABILITY.max(stability))
}

/// Stability after a lapse; always strictly below `stability`.
pub fn next_forget_stability(
    w: &[f64; WEIGHT_COUNT],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let post_lapse = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - retrievability)).exp();

    post_lapse
        .max(MIN_STABILITY)
        .min(stability * LAPSE_STABILITY_CEILING)
}

// ============================================================================
// FUZZ
// ============================================================================

/// Spread a model interval over a small band so due dates don't cluster.
///
/// The RNG is seeded from `seed`, so the same inputs always give the same
/// result. The returned interval lies within `[min_interval, max_interval]`.
pub fn fuzz_interval(
    interval: u32,
    elapsed_days: u32,
    min_interval: u32,
    max_interval: u32,
    seed: u64,
) -> u32 {
    let ivl = f64::from(interval);
    if ivl < FUZZ_THRESHOLD {
        return interval.clamp(min_interval, max_interval);
    }

    let delta = FUZZ_RANGES.iter().fold(1.0, |acc, &(start, end, factor)| {
        acc + factor * (ivl.min(end) - start).max(0.0)
    });

    let max_ivl = f64::from(max_interval);
    let ivl = ivl.min(max_ivl);
    let mut lower = (ivl - delta).round().max(2.0).max(f64::from(min_interval));
    let upper = (ivl + delta).round().min(max_ivl);
    if ivl > f64::from(elapsed_days) {
        lower = lower.max(f64::from(elapsed_days) + 1.0);
    }
    let lower = lower.min(upper);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let roll: f64 = rng.gen_range(0.0..1.0);
    let fuzzed = (roll * (upper - lower + 1.0) + lower).floor().min(upper);

    (fuzzed as u32).clamp(min_interval, max_interval)
}

// ============================================================================
// TESTS
// ============================================================================
