//! Simulated-annealing refinement of a complete schedule.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tabula_model::{Lesson, Result, TabulaError};
use tracing::{debug, info, trace};

use crate::candidates::candidate_lessons;
use crate::manager::SolverControl;
use crate::schedule::Schedule;

/// How many random assigned classes a mutation probes before giving up
/// and returning the neighbor unchanged.
const MOVE_RETRIES: usize = 8;

/// Fixed probability of mutating room and time together.
const BOTH_AXES_PROBABILITY: f64 = 0.2;

/// Cooling schedule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// The run ends when the temperature falls to this value.
    pub min_temperature: f64,
    /// Exponential cooling rate per outer iteration.
    pub cooling_rate: f64,
    /// Mutations evaluated at each temperature.
    pub steps_per_temperature: usize,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1_000.0,
            min_temperature: 1.0,
            cooling_rate: 0.01,
            steps_per_temperature: 100,
        }
    }
}

/// Which part of an assignment a mutation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Room,
    Time,
    Both,
}

/// Refines a complete valid schedule through constrained re-assignment
/// moves under an exponential cooling schedule.
///
/// Improving neighbors are always accepted; worsening ones with the
/// Metropolis probability `exp((cost − neighbor) / T)`. The best-found
/// snapshot is restored at the end, so the result never costs more than
/// the input.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    config: AnnealingConfig,
    seed: Option<u64>,
}

impl SimulatedAnnealing {
    pub fn new(config: AnnealingConfig, seed: Option<u64>) -> Self {
        Self { config, seed }
    }

    /// Upper bound on cooling steps, used only for progress reporting.
    pub fn max_outer_iterations(&self) -> u64 {
        let ratio = self.config.min_temperature / self.config.initial_temperature;
        ((-ratio.ln()) / self.config.cooling_rate).ceil().max(1.0) as u64
    }

    /// Runs the cooling loop.
    ///
    /// Fails with [`TabulaError::InvalidState`] when the input schedule is
    /// not valid; returns `Ok(None)` on cooperative cancellation.
    pub fn optimize<'p>(
        &self,
        mut schedule: Schedule<'p>,
        control: &SolverControl,
    ) -> Result<Option<Schedule<'p>>> {
        if !schedule.is_valid() {
            return Err(TabulaError::InvalidState(
                "simulated annealing requires a complete valid schedule".into(),
            ));
        }
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let mut current_cost = schedule.total_cost();
        schedule.save_best();

        let max_outer = self.max_outer_iterations();
        let mut temperature = self.config.initial_temperature;
        let mut outer = 0u64;
        info!(
            start_cost = current_cost,
            temperature, max_outer, "starting annealing"
        );

        while temperature > self.config.min_temperature {
            for _ in 0..self.config.steps_per_temperature {
                if control.is_cancelled() {
                    info!(outer, "annealing cancelled");
                    return Ok(None);
                }
                let mut neighbor = schedule.clone();
                move_class(&mut neighbor, &mut rng);
                let neighbor_cost = neighbor.total_cost();

                let accept = if neighbor_cost < current_cost {
                    true
                } else {
                    // self-loops land here with delta 0 and always pass
                    let delta = current_cost - neighbor_cost;
                    rng.random::<f64>() < (delta / temperature).exp()
                };
                if accept {
                    schedule = neighbor;
                    current_cost = neighbor_cost;
                    if schedule.best_cost().map_or(true, |best| current_cost < best) {
                        schedule.save_best();
                        trace!(cost = current_cost, "new best");
                    }
                }
            }
            outer += 1;
            temperature = self.config.initial_temperature
                * (-(self.config.cooling_rate) * outer as f64).exp();
            control.set_progress((outer as f64 / max_outer as f64).min(1.0));
            debug!(outer, temperature, cost = current_cost, "cooling step");
        }

        schedule.restore_best()?;
        if !schedule.is_valid() {
            return Err(TabulaError::InvalidState(
                "best annealing snapshot failed validation".into(),
            ));
        }
        info!(final_cost = schedule.total_cost(), "annealing finished");
        Ok(Some(schedule))
    }
}

/// One constrained re-assignment: pick a mutation axis biased toward the
/// dominant soft-penalty category, then probe random assigned classes for
/// a conflict-free candidate on that axis. Leaves the schedule untouched
/// (a self-loop) when no such candidate turns up.
fn move_class<R: Rng>(schedule: &mut Schedule<'_>, rng: &mut R) -> bool {
    let axis = pick_axis(schedule, rng);
    let assigned: Vec<usize> = schedule.assigned_classes().collect();
    if assigned.is_empty() {
        return false;
    }
    for _ in 0..MOVE_RETRIES {
        let class = assigned[rng.random_range(0..assigned.len())];
        let Some(current) = schedule.lesson(class).cloned() else {
            continue;
        };
        let matching: Vec<Lesson> = candidate_lessons(schedule.repo(), class)
            .filter(|candidate| {
                candidate.variant != current.variant
                    && matches_axis(candidate, &current, axis)
                    && schedule.conflict_ids(candidate).is_empty()
            })
            .collect();
        if matching.is_empty() {
            continue;
        }
        let pick = matching[rng.random_range(0..matching.len())].clone();
        trace!(class, axis = ?axis, variant = pick.variant, "move");
        schedule.assign(class, pick);
        return true;
    }
    false
}

fn pick_axis<R: Rng>(schedule: &Schedule<'_>, rng: &mut R) -> Axis {
    if rng.random::<f64>() < BOTH_AXES_PROBABILITY {
        return Axis::Both;
    }
    let (room_penalty, time_penalty) = schedule.cost_breakdown();
    let total = room_penalty + time_penalty;
    let room_share = if total > 0.0 {
        room_penalty / total
    } else {
        0.5
    };
    if rng.random::<f64>() < room_share {
        Axis::Room
    } else {
        Axis::Time
    }
}

fn matches_axis(candidate: &Lesson, current: &Lesson, axis: Axis) -> bool {
    match axis {
        Axis::Room => candidate.time == current.time && candidate.room != current.room,
        Axis::Time => candidate.room == current.room && candidate.time != current.time,
        Axis::Both => candidate.room != current.room && candidate.time != current.time,
    }
}
