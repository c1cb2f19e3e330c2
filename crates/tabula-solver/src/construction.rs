//! The constructive initial-solution heuristic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tabula_model::ProblemRepository;
use tracing::{debug, info};

use crate::manager::SolverControl;
use crate::schedule::Schedule;
use crate::selector::{SelectorConfig, ValueSelector};

/// Budget of the construction phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Maximum number of assignment steps.
    pub max_iterations: u64,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20_000,
        }
    }
}

/// Builds an initial, possibly incomplete, schedule by repeatedly
/// assigning unassigned classes and resolving the hard conflicts each
/// assignment creates.
///
/// The loop stops at feasibility (no unassigned classes left), when the
/// iteration budget runs out, or on cooperative cancellation; cost
/// improvement beyond feasibility is the optimizer's job.
#[derive(Debug, Clone)]
pub struct ConstructionHeuristic {
    config: ConstructionConfig,
    selector: SelectorConfig,
    seed: Option<u64>,
}

impl ConstructionHeuristic {
    pub fn new(config: ConstructionConfig, selector: SelectorConfig, seed: Option<u64>) -> Self {
        Self {
            config,
            selector,
            seed,
        }
    }

    /// Runs the construction loop.
    ///
    /// Returns the best-saved snapshot, which may still contain
    /// unassigned classes when the budget was too small, or `None` when
    /// cancelled before any snapshot was saved.
    pub fn build<'p>(
        &self,
        repo: &'p ProblemRepository,
        control: &SolverControl,
    ) -> Option<Schedule<'p>> {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let mut selector = ValueSelector::new(self.selector.clone());
        let mut schedule = Schedule::new(repo);
        let budget = self.config.max_iterations.max(1);
        info!(
            classes = repo.classes().len(),
            budget, "starting construction"
        );

        let mut iterations = 0u64;
        while iterations < budget && !schedule.unassigned().is_empty() {
            if control.is_cancelled() {
                info!(iterations, "construction cancelled");
                if !schedule.has_best() {
                    return None;
                }
                break;
            }
            iterations += 1;
            control.set_progress(iterations as f64 / budget as f64);

            let nth = rng.random_range(0..schedule.unassigned().len());
            let Some(&class) = schedule.unassigned().iter().nth(nth) else {
                break;
            };
            let Some(value) = selector.select(&schedule, class, &mut rng) else {
                // no available candidate at all; the class stays unassigned
                continue;
            };
            schedule.assign(class, value);

            let unassigned = schedule.unassigned().len();
            let cost = schedule.total_cost();
            let improved = match (schedule.best_unassigned_count(), schedule.best_cost()) {
                (Some(best_unassigned), Some(best_cost)) => {
                    unassigned < best_unassigned
                        || (unassigned == best_unassigned && cost < best_cost)
                }
                _ => true,
            };
            if improved {
                schedule.save_best();
                debug!(iterations, unassigned, cost, "construction improved");
            }
        }

        if !schedule.has_best() {
            schedule.save_best();
        }
        if schedule.restore_best().is_err() {
            return None;
        }
        control.set_progress(1.0);
        info!(
            iterations,
            unassigned = schedule.unassigned().len(),
            "construction finished"
        );
        Some(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{different_room_repo, small_repo, trivial_repo};

    fn heuristic(max_iterations: u64) -> ConstructionHeuristic {
        ConstructionHeuristic::new(
            ConstructionConfig { max_iterations },
            SelectorConfig::default(),
            Some(42),
        )
    }

    #[test]
    fn assigns_every_class_of_a_feasible_problem() {
        let repo = small_repo();
        let control = SolverControl::new();
        let schedule = heuristic(5_000).build(&repo, &control).unwrap();
        assert!(schedule.unassigned().is_empty());
        assert!(schedule.is_valid());
        assert_eq!(control.progress(), 1.0);
    }

    #[test]
    fn different_room_scenario_leaves_at_most_one_assigned() {
        let repo = different_room_repo();
        let control = SolverControl::new();
        let schedule = heuristic(200).build(&repo, &control).unwrap();
        // both classes compete for R1 at the same time under a required
        // DifferentRoom constraint; at most one can hold it
        assert!(schedule.assigned_count() <= 1);
        assert_eq!(schedule.unassigned().len() + schedule.assigned_count(), 2);
    }

    #[test]
    fn best_tracking_is_lexicographic() {
        let repo = small_repo();
        let control = SolverControl::new();
        let mut schedule = heuristic(5_000).build(&repo, &control).unwrap();
        let final_cost = schedule.total_cost();
        assert_eq!(schedule.best_unassigned_count(), Some(0));
        assert_eq!(schedule.best_cost(), Some(final_cost));
    }

    #[test]
    fn cancellation_before_any_snapshot_returns_none() {
        let repo = trivial_repo();
        let control = SolverControl::new();
        control.cancel();
        assert!(heuristic(100).build(&repo, &control).is_none());
    }

    #[test]
    fn exhausted_budget_returns_the_partial_best() {
        let repo = small_repo();
        let control = SolverControl::new();
        let schedule = heuristic(1).build(&repo, &control).unwrap();
        assert!(schedule.assigned_count() <= 1);
    }
}
