//! The mutable state of one candidate schedule.
//!
//! A [`Schedule`] partitions the class-units into assigned and unassigned,
//! keeps per-resource conflict indices maintained incrementally on every
//! assignment, and carries an optional best-found snapshot. Values are
//! index-based: cloning a schedule copies small integer-indexed arrays and
//! maps, never a pointer graph, so the optimizer can afford one clone per
//! neighbor.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tabula_model::{Lesson, ProblemRepository, Result, TabulaError, Timetable};

#[derive(Debug, Clone)]
struct BestSnapshot {
    assigned: Vec<Option<Lesson>>,
    unassigned: BTreeSet<usize>,
    removals: Vec<HashMap<u32, u32>>,
    cost: f64,
}

/// One candidate schedule under construction or optimization.
///
/// All mutation happens on the owning worker; the conflict indices and the
/// best snapshot are not designed for concurrent writers. Read-only
/// queries ([`conflict_ids`], [`removal_count`]) are safe to share.
///
/// [`conflict_ids`]: Schedule::conflict_ids
/// [`removal_count`]: Schedule::removal_count
#[derive(Debug, Clone)]
pub struct Schedule<'p> {
    repo: &'p ProblemRepository,
    assigned: Vec<Option<Lesson>>,
    unassigned: BTreeSet<usize>,
    by_room: HashMap<usize, BTreeSet<usize>>,
    by_teacher: HashMap<usize, BTreeSet<usize>>,
    removals: Vec<HashMap<u32, u32>>,
    best: Option<BestSnapshot>,
    iteration: u64,
    cached_cost: Option<f64>,
}

impl<'p> Schedule<'p> {
    /// Creates an empty schedule: every class-unit unassigned.
    pub fn new(repo: &'p ProblemRepository) -> Self {
        let count = repo.classes().len();
        Self {
            repo,
            assigned: vec![None; count],
            unassigned: (0..count).collect(),
            by_room: HashMap::new(),
            by_teacher: HashMap::new(),
            removals: vec![HashMap::new(); count],
            best: None,
            iteration: 0,
            cached_cost: None,
        }
    }

    pub fn repo(&self) -> &'p ProblemRepository {
        self.repo
    }

    /// Classes currently without a lesson.
    pub fn unassigned(&self) -> &BTreeSet<usize> {
        &self.unassigned
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len() - self.unassigned.len()
    }

    /// Iterates the classes that currently hold a lesson.
    pub fn assigned_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.assigned
            .iter()
            .enumerate()
            .filter_map(|(class, lesson)| lesson.as_ref().map(|_| class))
    }

    /// The lesson currently held by a class, if any.
    pub fn lesson(&self, class: usize) -> Option<&Lesson> {
        self.assigned[class].as_ref()
    }

    /// Monotonically increasing assignment counter, used as the tabu
    /// clock.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// How often this (class, variant) value has been kicked out so far.
    pub fn removal_count(&self, class: usize, variant: u32) -> u32 {
        self.removals[class].get(&variant).copied().unwrap_or(0)
    }

    /// Every class whose current lesson clashes with `lesson`: required
    /// distribution conflicts, plus bookings of the same room or a shared
    /// teacher whose blocks overlap (teacher overlap respects inter-room
    /// travel). Resolved through the per-resource indices, so the work is
    /// proportional to the bookings on the touched resources.
    pub fn conflict_ids(&self, lesson: &Lesson) -> BTreeSet<usize> {
        let lesson_of = |class: usize| {
            if class == lesson.class {
                Some(lesson)
            } else {
                self.assigned[class].as_ref()
            }
        };

        let mut conflicts = BTreeSet::new();
        for &ci in &self.repo.class(lesson.class).constraints {
            let constraint = self.repo.constraint(ci);
            if constraint.required {
                conflicts.extend(constraint.compute_conflicts(lesson, self.repo, lesson_of));
            }
        }

        if let Some(room) = lesson.room {
            if let Some(booked) = self.by_room.get(&room) {
                for &other in booked {
                    if other == lesson.class {
                        continue;
                    }
                    if let Some(theirs) = self.assigned[other].as_ref() {
                        if theirs.time.overlaps(&lesson.time) {
                            conflicts.insert(other);
                        }
                    }
                }
            }
        }

        for &teacher in &lesson.teachers {
            if let Some(booked) = self.by_teacher.get(&teacher) {
                for &other in booked {
                    if other == lesson.class {
                        continue;
                    }
                    if let Some(theirs) = self.assigned[other].as_ref() {
                        let travel = self.repo.travel(lesson.room, theirs.room);
                        if theirs.time.overlaps_with_travel(&lesson.time, travel) {
                            conflicts.insert(other);
                        }
                    }
                }
            }
        }

        conflicts.remove(&lesson.class);
        conflicts
    }

    /// Binds `lesson` to its class and resolves the hard conflicts this
    /// creates by unassigning every clashing class.
    ///
    /// A re-assignment of the identical value is a no-op; a different
    /// value unassigns the old one first.
    pub fn assign(&mut self, class: usize, lesson: Lesson) {
        debug_assert_eq!(class, lesson.class);
        if let Some(current) = &self.assigned[class] {
            if *current == lesson {
                return;
            }
            self.remove_assignment(class);
        }
        self.iteration += 1;
        let conflicts = self.conflict_ids(&lesson);
        self.bind(class, lesson);
        for other in conflicts {
            if self.assigned[other].is_some() {
                self.remove_assignment(other);
            }
        }
    }

    /// Removes the class's current lesson, bumping its removal counter.
    pub fn unassign(&mut self, class: usize) -> Result<()> {
        if self.assigned[class].is_none() {
            return Err(TabulaError::NotAssigned(self.repo.class(class).id.clone()));
        }
        self.remove_assignment(class);
        Ok(())
    }

    fn bind(&mut self, class: usize, lesson: Lesson) {
        if let Some(room) = lesson.room {
            self.by_room.entry(room).or_default().insert(class);
        }
        for &teacher in &lesson.teachers {
            self.by_teacher.entry(teacher).or_default().insert(class);
        }
        self.assigned[class] = Some(lesson);
        self.unassigned.remove(&class);
        self.cached_cost = None;
    }

    fn remove_assignment(&mut self, class: usize) {
        let Some(lesson) = self.assigned[class].take() else {
            return;
        };
        if let Some(room) = lesson.room {
            if let Some(booked) = self.by_room.get_mut(&room) {
                booked.remove(&class);
            }
        }
        for &teacher in &lesson.teachers {
            if let Some(booked) = self.by_teacher.get_mut(&teacher) {
                booked.remove(&class);
            }
        }
        *self.removals[class].entry(lesson.variant).or_insert(0) += 1;
        self.unassigned.insert(class);
        self.cached_cost = None;
    }

    /// Total weighted cost: lesson preference costs plus soft-constraint
    /// penalties. Cached until the next mutation.
    pub fn total_cost(&mut self) -> f64 {
        if let Some(cost) = self.cached_cost {
            return cost;
        }
        let cost = self.recompute_cost();
        self.cached_cost = Some(cost);
        cost
    }

    /// Recomputes the total cost from scratch, bypassing the cache.
    pub fn recompute_cost(&self) -> f64 {
        let config = self.repo.config();
        let mut cost: f64 = self
            .assigned
            .iter()
            .flatten()
            .map(|lesson| lesson.cost(config))
            .sum();
        let mut distribution = 0u64;
        for constraint in self.repo.constraints() {
            if !constraint.required {
                distribution +=
                    constraint.compute_penalty(self.repo, |class| self.assigned[class].as_ref());
            }
        }
        cost += distribution as f64 * config.distribution_weight;
        cost
    }

    /// Weighted (room, time) preference totals of the assigned lessons,
    /// used to bias the optimizer's mutation axis.
    pub fn cost_breakdown(&self) -> (f64, f64) {
        let config = self.repo.config();
        let mut room = 0.0;
        let mut time = 0.0;
        for lesson in self.assigned.iter().flatten() {
            room += lesson.room_penalty as f64 * config.room_weight;
            time += lesson.time_penalty as f64 * config.time_weight;
        }
        (room, time)
    }

    /// True when every class is assigned and no hard conflict remains.
    pub fn is_valid(&self) -> bool {
        self.unassigned.is_empty()
            && self
                .assigned
                .iter()
                .flatten()
                .all(|lesson| self.conflict_ids(lesson).is_empty())
    }

    /// Deep-copies the current partition (and removal counters) as the
    /// best-found snapshot, recording its cost.
    pub fn save_best(&mut self) {
        let cost = self.total_cost();
        self.best = Some(BestSnapshot {
            assigned: self.assigned.clone(),
            unassigned: self.unassigned.clone(),
            removals: self.removals.clone(),
            cost,
        });
    }

    pub fn has_best(&self) -> bool {
        self.best.is_some()
    }

    /// Cost recorded by the last [`save_best`](Schedule::save_best).
    pub fn best_cost(&self) -> Option<f64> {
        self.best.as_ref().map(|best| best.cost)
    }

    /// Unassigned count of the best snapshot.
    pub fn best_unassigned_count(&self) -> Option<usize> {
        self.best.as_ref().map(|best| best.unassigned.len())
    }

    /// Restores the best snapshot, rebuilding the resource indices.
    pub fn restore_best(&mut self) -> Result<()> {
        let best = self
            .best
            .as_ref()
            .ok_or_else(|| TabulaError::InvalidState("no best snapshot saved".into()))?;
        self.assigned = best.assigned.clone();
        self.unassigned = best.unassigned.clone();
        self.removals = best.removals.clone();
        self.cached_cost = Some(best.cost);
        self.rebuild_indices();
        Ok(())
    }

    fn rebuild_indices(&mut self) {
        self.by_room.clear();
        self.by_teacher.clear();
        for class in 0..self.assigned.len() {
            let Some(lesson) = self.assigned[class].as_ref() else {
                continue;
            };
            if let Some(room) = lesson.room {
                self.by_room.entry(room).or_default().insert(class);
            }
            for &teacher in &lesson.teachers {
                self.by_teacher.entry(teacher).or_default().insert(class);
            }
        }
    }

    /// Converts the assigned set into a timetable.
    pub fn into_timetable(mut self, runtime: Duration) -> Timetable {
        let cost = self.total_cost();
        let lessons = self
            .assigned
            .iter()
            .enumerate()
            .filter_map(|(class, lesson)| {
                lesson
                    .as_ref()
                    .map(|l| (self.repo.class(class).id.clone(), l.clone()))
            })
            .collect();
        Timetable::new(self.repo.name(), runtime, lessons, cost)
    }
}
