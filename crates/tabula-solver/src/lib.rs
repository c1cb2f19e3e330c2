//! Tabula Solver - Constraint-based search engine for course timetabling
//!
//! The engine consumes a read-only [`ProblemRepository`] and produces a
//! [`Timetable`] in two phases:
//! - A construction heuristic assigns every class-unit a room, a time and
//!   its teachers, resolving hard conflicts by unassignment as it goes.
//! - A simulated-annealing optimizer refines the complete schedule
//!   through constrained re-assignment moves under a cooling schedule.
//!
//! [`SolverManager`] hosts independent generation requests on background
//! worker threads with cooperative cancellation and non-blocking progress
//! reads; [`generate_initial`] and [`optimize`] are the synchronous
//! entry points for callers that manage their own threading.

pub mod annealing;
pub mod candidates;
pub mod config;
pub mod construction;
pub mod manager;
pub mod schedule;
pub mod selector;

#[cfg(test)]
pub(crate) mod test_utils;

use std::time::Instant;

use tabula_model::{ProblemRepository, Result, Timetable};

pub use annealing::{AnnealingConfig, SimulatedAnnealing};
pub use candidates::{candidate_lessons, CandidateLessons};
pub use config::{ConfigError, SolverConfig};
pub use construction::{ConstructionConfig, ConstructionHeuristic};
pub use manager::{solve, JobHandle, SolveOutcome, SolveStatus, SolverControl, SolverManager};
pub use schedule::Schedule;
pub use selector::{SelectorConfig, ValueSelector};

/// Builds an initial, possibly partial, schedule with default selector
/// tuning. Returns `None` only on cancellation, which cannot happen here;
/// kept symmetric with the managed pipeline.
pub fn generate_initial(repo: &ProblemRepository, max_iterations: u64) -> Option<Schedule<'_>> {
    let control = SolverControl::new();
    ConstructionHeuristic::new(
        ConstructionConfig { max_iterations },
        SelectorConfig::default(),
        None,
    )
    .build(repo, &control)
}

/// Refines a complete valid schedule and returns the final timetable.
///
/// Fails when `initial` is not valid; `Ok(None)` is unreachable without
/// an external cancellation source but kept for signature symmetry.
pub fn optimize(
    initial: Schedule<'_>,
    initial_temperature: f64,
    min_temperature: f64,
    cooling_rate: f64,
    steps_per_temperature: usize,
) -> Result<Option<Timetable>> {
    let control = SolverControl::new();
    let started = Instant::now();
    let annealing = SimulatedAnnealing::new(
        AnnealingConfig {
            initial_temperature,
            min_temperature,
            cooling_rate,
            steps_per_temperature,
        },
        None,
    );
    Ok(annealing
        .optimize(initial, &control)?
        .map(|schedule| schedule.into_timetable(started.elapsed())))
}
