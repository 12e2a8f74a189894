//! FSRS Scheduler
//!
//! Turns a `MemoryState` plus the current time into one candidate next
//! state per rating. The caller commits exactly one of them.
//!
//! Two tiers:
//! - Learning / Relearning walk a short, fixed sequence of step lengths
//! - Review uses the stability model and the desired-retention target

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    fuzz_interval, initial_difficulty, initial_stability, next_difficulty, next_forget_stability,
    next_interval, next_recall_stability, retrievability,
};
use super::params::SchedulerParameters;
use crate::memory::{LearningState, MemoryState};

// ============================================================================
// ERRORS
// ============================================================================

/// Scheduling error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    /// The memory state violates a precondition
    #[error("Invalid memory state: {0}")]
    InvalidState(String),
    /// The scheduler parameters are out of range
    #[error("Invalid scheduler parameters: {0}")]
    InvalidParameters(String),
}

/// Scheduler result type
pub type Result<T> = std::result::Result<T, SchedulerError>;

// ============================================================================
// RATING
// ============================================================================

/// The learner's self-assessed recall for a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Failed to recall (a lapse)
    Forgot = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    /// All ratings in ascending order
    pub const ALL: [Rating; 4] = [Rating::Forgot, Rating::Hard, Rating::Good, Rating::Easy];

    /// Numeric value (1-4)
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parse the numeric value (1-4)
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Forgot),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Forgot => "forgot",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// Parse from a name ("good") or a number ("3")
    pub fn parse_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "forgot" | "again" => Some(Rating::Forgot),
            "hard" => Some(Rating::Hard),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => s.parse().ok().and_then(Self::from_i32),
        }
    }

    /// Whether this rating counts as successful recall
    pub fn is_success(self) -> bool {
        self != Rating::Forgot
    }

    fn index(self) -> usize {
        (self.as_i32() - 1) as usize
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Record of one review, kept by stores as history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub rating: Rating,
    /// Status before the review
    pub status: LearningState,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub reviewed_at: DateTime<Utc>,
}

/// The state that results from committing one rating, plus its log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReview {
    pub state: MemoryState,
    pub log: ReviewLog,
}

/// One `ScheduledReview` per rating, computed at a single instant.
///
/// Never persisted; the caller commits one and discards the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulingCandidates {
    reviews: [ScheduledReview; 4],
}

impl SchedulingCandidates {
    /// Candidate for `rating`
    pub fn get(&self, rating: Rating) -> &ScheduledReview {
        &self.reviews[rating.index()]
    }

    /// Resulting memory state for `rating`
    pub fn state(&self, rating: Rating) -> &MemoryState {
        &self.get(rating).state
    }

    /// Take ownership of the candidate for `rating`
    pub fn into_review(self, rating: Rating) -> ScheduledReview {
        let [forgot, hard, good, easy] = self.reviews;
        match rating {
            Rating::Forgot => forgot,
            Rating::Hard => hard,
            Rating::Good => good,
            Rating::Easy => easy,
        }
    }

    /// Iterate candidates in rating order
    pub fn iter(&self) -> impl Iterator<Item = (Rating, &ScheduledReview)> {
        Rating::ALL.into_iter().zip(self.reviews.iter())
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Scheduler bound to a validated parameter set
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    params: SchedulerParameters,
}

impl Scheduler {
    /// Validate `params` and build a scheduler
    pub fn new(params: SchedulerParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use
    pub fn params(&self) -> &SchedulerParameters {
        &self.params
    }

    /// Compute all candidates for `state` reviewed at `now`
    pub fn schedule(
        &self,
        state: &MemoryState,
        now: DateTime<Utc>,
    ) -> Result<SchedulingCandidates> {
        schedule_validated(state, now, &self.params)
    }
}

/// Compute all candidates for `state` reviewed at `now`.
///
/// Pure: identical inputs give identical output, fuzz included.
pub fn schedule(
    state: &MemoryState,
    now: DateTime<Utc>,
    params: &SchedulerParameters,
) -> Result<SchedulingCandidates> {
    params.validate()?;
    schedule_validated(state, now, params)
}

fn validate_state(state: &MemoryState, now: DateTime<Utc>) -> Result<()> {
    if let Some(last) = state.last_review {
        if now < last {
            return Err(SchedulerError::InvalidState(format!(
                "review time {} precedes last review {}",
                now.to_rfc3339(),
                last.to_rfc3339()
            )));
        }
    }

    // New states carry a zero placeholder; everything else needs a real trace
    if state.status != LearningState::New {
        if !(state.stability.is_finite() && state.stability > 0.0) {
            return Err(SchedulerError::InvalidState(format!(
                "stability must be positive, got {}",
                state.stability
            )));
        }
        if !state.difficulty.is_finite() {
            return Err(SchedulerError::InvalidState(format!(
                "difficulty must be finite, got {}",
                state.difficulty
            )));
        }
    }

    Ok(())
}

/// How a candidate's interval is chosen
#[derive(Debug, Clone, Copy)]
enum Interval {
    /// Fixed learning/relearning step
    Step(u32),
    /// Derived from stability and desired retention
    Model(u32),
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    difficulty: f64,
    stability: f64,
    status: LearningState,
    learning_step: u32,
    interval: Interval,
}

fn schedule_validated(
    state: &MemoryState,
    now: DateTime<Utc>,
    params: &SchedulerParameters,
) -> Result<SchedulingCandidates> {
    validate_state(state, now)?;

    let elapsed_days = state.days_since_review(now);
    let r = if state.status == LearningState::New {
        1.0
    } else {
        retrievability(f64::from(elapsed_days), state.stability)
    };

    let transitions = Rating::ALL.map(|rating| transition(state, rating, r, params));
    let mut days = Rating::ALL.map(|rating| {
        let t = &transitions[rating.index()];
        match t.interval {
            Interval::Step(d) => d,
            Interval::Model(d) if params.enable_fuzz && t.status == LearningState::Review => {
                fuzz_interval(
                    d,
                    elapsed_days,
                    params.min_interval,
                    params.max_interval,
                    fuzz_seed(state, now, rating),
                )
            }
            Interval::Model(d) => d,
        }
    });

    // Review successes: a harder rating never earns a longer interval
    if state.status == LearningState::Review {
        let (h, g, e) = (Rating::Hard.index(), Rating::Good.index(), Rating::Easy.index());
        days[h] = days[h].min(days[g]);
        days[g] = days[g].max(days[h].saturating_add(1));
        days[e] = days[e].max(days[g].saturating_add(1));
    }

    let reviews = Rating::ALL.map(|rating| -> Result<ScheduledReview> {
        let t = &transitions[rating.index()];
        let scheduled_days = days[rating.index()].clamp(params.min_interval, params.max_interval);
        let due = now
            .checked_add_signed(Duration::days(i64::from(scheduled_days)))
            .ok_or_else(|| {
                SchedulerError::InvalidState(format!(
                    "due date {} days after {} is out of range",
                    scheduled_days,
                    now.to_rfc3339()
                ))
            })?;

        Ok(ScheduledReview {
            state: MemoryState {
                due,
                stability: t.stability,
                difficulty: t.difficulty,
                elapsed_days,
                scheduled_days,
                reps: state.reps.saturating_add(1),
                lapses: if rating.is_success() {
                    state.lapses
                } else {
                    state.lapses.saturating_add(1)
                },
                status: t.status,
                last_review: Some(now),
                learning_step: t.learning_step,
            },
            log: ReviewLog {
                rating,
                status: state.status,
                elapsed_days,
                scheduled_days,
                reviewed_at: now,
            },
        })
    });

    let [forgot, hard, good, easy] = reviews;
    Ok(SchedulingCandidates {
        reviews: [forgot?, hard?, good?, easy?],
    })
}

fn transition(
    state: &MemoryState,
    rating: Rating,
    r: f64,
    params: &SchedulerParameters,
) -> Transition {
    let w = &params.weights;

    match state.status {
        LearningState::New => {
            let difficulty = initial_difficulty(w, rating);
            let stability = initial_stability(w, rating);
            let model = model_days(stability, params);

            let passed = matches!(rating, Rating::Good | Rating::Easy);
            if passed && model >= params.graduating_interval {
                Transition {
                    difficulty,
                    stability,
                    status: LearningState::Review,
                    learning_step: 0,
                    interval: Interval::Model(model),
                }
            } else {
                Transition {
                    difficulty,
                    stability,
                    status: LearningState::Learning,
                    learning_step: 0,
                    interval: Interval::Step(step_days(&params.learning_steps, 0, params)),
                }
            }
        }

        LearningState::Learning | LearningState::Relearning => {
            let steps = if state.status == LearningState::Learning {
                &params.learning_steps
            } else {
                &params.relearning_steps
            };
            let difficulty = next_difficulty(w, state.difficulty, rating);

            let graduate = |stability: f64| Transition {
                difficulty,
                stability,
                status: LearningState::Review,
                learning_step: 0,
                interval: Interval::Model(model_days(stability, params)),
            };

            match rating {
                Rating::Forgot => Transition {
                    difficulty,
                    stability: next_forget_stability(w, difficulty, state.stability, r),
                    status: state.status,
                    learning_step: 0,
                    interval: Interval::Step(step_days(steps, 0, params)),
                },
                Rating::Hard | Rating::Good => {
                    let next_step = state.learning_step.saturating_add(1);
                    if next_step as usize >= steps.len() {
                        graduate(state.stability)
                    } else {
                        Transition {
                            difficulty,
                            stability: state.stability,
                            status: state.status,
                            learning_step: next_step,
                            interval: Interval::Step(step_days(steps, next_step, params)),
                        }
                    }
                }
                Rating::Easy => graduate(state.stability),
            }
        }

        LearningState::Review => {
            let difficulty = next_difficulty(w, state.difficulty, rating);

            if !rating.is_success() {
                Transition {
                    difficulty,
                    stability: next_forget_stability(w, difficulty, state.stability, r),
                    status: LearningState::Relearning,
                    learning_step: 0,
                    interval: Interval::Step(step_days(&params.relearning_steps, 0, params)),
                }
            } else {
                let stability = next_recall_stability(w, difficulty, state.stability, r, rating);
                Transition {
                    difficulty,
                    stability,
                    status: LearningState::Review,
                    learning_step: 0,
                    interval: Interval::Model(model_days(stability, params)),
                }
            }
        }
    }
}

/// Model interval in whole days, bounded to the configured range
fn model_days(stability: f64, params: &SchedulerParameters) -> u32 {
    let raw = next_interval(stability, params.desired_retention).round();
    raw.clamp(f64::from(params.min_interval), f64::from(params.max_interval)) as u32
}

/// Step length at `index`, bounded to the configured range
fn step_days(steps: &[u32], index: u32, params: &SchedulerParameters) -> u32 {
    steps
        .get(index as usize)
        .or(steps.last())
        .copied()
        .unwrap_or(params.min_interval)
        .clamp(params.min_interval, params.max_interval)
}

/// FNV-1a over the inputs that identify this scheduling call
fn fuzz_seed(state: &MemoryState, now: DateTime<Utc>, rating: Rating) -> u64 {
    [
        now.timestamp_millis() as u64,
        u64::from(state.reps),
        state.difficulty.to_bits(),
        state.stability.to_bits(),
        rating.as_i32() as u64,
    ]
    .iter()
    .fold(0xcbf2_9ce4_8422_2325, |hash, word| {
        (hash ^ word).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

// ============================================================================
// TESTS
// ============================================================================
