//! Value selection: which candidate lesson to try next for a class.

use std::collections::HashMap;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tabula_model::Lesson;

use crate::candidates::candidate_lessons;
use crate::schedule::Schedule;

/// Candidate sets at least this large are scored on the rayon pool.
/// Scoring is read-only; results are merged by a minimum-score reduction.
const PARALLEL_SCORING_THRESHOLD: usize = 256;

/// Tuning knobs of the default value-selection strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Probability of an unbiased random-walk pick.
    pub random_walk_probability: f64,
    /// Weight of the conflict count in the candidate score.
    pub conflict_weight: f64,
    /// Weight of the removal counter in the candidate score.
    pub removal_weight: f64,
    /// Maximum number of entries on the short-term tabu list.
    pub tabu_capacity: usize,
    /// How many iterations a picked value stays tabu.
    pub tabu_tenure: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            random_walk_probability: 0.02,
            conflict_weight: 1.0,
            removal_weight: 0.1,
            tabu_capacity: 64,
            tabu_tenure: 20,
        }
    }
}

/// Chooses the next value to try for a class.
///
/// Default strategy: with a small probability take an unbiased random
/// candidate; otherwise score every non-current, non-tabu candidate by
/// `conflict_weight · |conflicts| + removal_weight · removals`, choose
/// uniformly among the minimal scores, and put the winner on the tabu
/// list for a short tenure. Falls back to an unrestricted random pick
/// when every candidate is tabu.
#[derive(Debug)]
pub struct ValueSelector {
    config: SelectorConfig,
    tabu: HashMap<(usize, u32), u64>,
}

impl ValueSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            tabu: HashMap::new(),
        }
    }

    /// Selects a value for `class`, or `None` when the class has no
    /// available candidate at all.
    pub fn select<R: Rng>(
        &mut self,
        schedule: &Schedule<'_>,
        class: usize,
        rng: &mut R,
    ) -> Option<Lesson> {
        let candidates: Vec<Lesson> = candidate_lessons(schedule.repo(), class).collect();
        if candidates.is_empty() {
            return None;
        }
        if rng.random::<f64>() < self.config.random_walk_probability {
            return Some(candidates[rng.random_range(0..candidates.len())].clone());
        }

        let now = schedule.iteration();
        let current = schedule.lesson(class).map(|lesson| lesson.variant);
        let eligible: Vec<usize> = (0..candidates.len())
            .filter(|&i| {
                let variant = candidates[i].variant;
                Some(variant) != current && !self.is_tabu(class, variant, now)
            })
            .collect();
        if eligible.is_empty() {
            return Some(candidates[rng.random_range(0..candidates.len())].clone());
        }

        let score = |i: &usize| -> f64 {
            let candidate = &candidates[*i];
            self.config.conflict_weight * schedule.conflict_ids(candidate).len() as f64
                + self.config.removal_weight
                    * schedule.removal_count(class, candidate.variant) as f64
        };
        let scores: Vec<f64> = if eligible.len() >= PARALLEL_SCORING_THRESHOLD {
            eligible.par_iter().map(score).collect()
        } else {
            eligible.iter().map(score).collect()
        };

        let minimum = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let minimal: Vec<usize> = eligible
            .iter()
            .zip(&scores)
            .filter(|(_, &s)| s == minimum)
            .map(|(&i, _)| i)
            .collect();
        let winner = minimal[rng.random_range(0..minimal.len())];
        self.remember(class, candidates[winner].variant, now);
        Some(candidates[winner].clone())
    }

    fn is_tabu(&self, class: usize, variant: u32, now: u64) -> bool {
        self.tabu
            .get(&(class, variant))
            .is_some_and(|&until| until > now)
    }

    fn remember(&mut self, class: usize, variant: u32, now: u64) {
        let key = (class, variant);
        if !self.tabu.contains_key(&key) && self.tabu.len() >= self.config.tabu_capacity {
            // fixed capacity: evict the entry expiring soonest
            if let Some(&oldest) = self.tabu.iter().min_by_key(|(_, &until)| until).map(|(k, _)| k)
            {
                self.tabu.remove(&oldest);
            }
        }
        self.tabu.insert(key, now + self.config.tabu_tenure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{overlap_pair_repo, seeded_rng, small_repo};

    fn deterministic() -> SelectorConfig {
        SelectorConfig {
            random_walk_probability: 0.0,
            // keep repeated selections un-tabued so every pick is scored
            tabu_tenure: 0,
            ..SelectorConfig::default()
        }
    }

    #[test]
    fn prefers_conflict_free_values() {
        let repo = overlap_pair_repo();
        let mut schedule = Schedule::new(&repo);
        // book class 0 into the shared room
        let first = candidate_lessons(&repo, 0).next().unwrap();
        schedule.assign(0, first);

        let mut selector = ValueSelector::new(deterministic());
        let mut rng = seeded_rng(7);
        // class 1 has one clashing and one clean candidate; the selector
        // must consistently pick the clean one
        for _ in 0..10 {
            let picked = selector.select(&schedule, 1, &mut rng).unwrap();
            assert!(schedule.conflict_ids(&picked).is_empty());
        }
    }

    #[test]
    fn skips_the_current_value() {
        let repo = small_repo();
        let mut schedule = Schedule::new(&repo);
        let current = candidate_lessons(&repo, 0).next().unwrap();
        let current_variant = current.variant;
        schedule.assign(0, current);

        let mut selector = ValueSelector::new(deterministic());
        let mut rng = seeded_rng(11);
        for _ in 0..10 {
            let picked = selector.select(&schedule, 0, &mut rng).unwrap();
            assert_ne!(picked.variant, current_variant);
        }
    }

    #[test]
    fn falls_back_to_random_when_everything_is_tabu() {
        let repo = small_repo();
        let schedule = Schedule::new(&repo);
        let mut selector = ValueSelector::new(SelectorConfig {
            random_walk_probability: 0.0,
            tabu_tenure: 1_000,
            tabu_capacity: 1_000,
            ..SelectorConfig::default()
        });
        let mut rng = seeded_rng(13);
        for candidate in candidate_lessons(&repo, 0) {
            selector.remember(0, candidate.variant, schedule.iteration());
        }
        assert!(selector.select(&schedule, 0, &mut rng).is_some());
    }

    #[test]
    fn tabu_list_respects_its_capacity() {
        let mut config = SelectorConfig::default();
        config.tabu_capacity = 2;
        let mut selector = ValueSelector::new(config);
        selector.remember(0, 0, 0);
        selector.remember(0, 1, 1);
        selector.remember(0, 2, 2);
        assert_eq!(selector.tabu.len(), 2);
        assert!(!selector.tabu.contains_key(&(0, 0)));
    }
}
