//! Scheduled lessons: the search value bound to a class-unit.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::repository::{ProblemConfig, ProblemRepository};
use crate::time::TimeBlock;

/// A concrete room + time + instructor assignment for one class-unit.
///
/// `variant` is the ordinal of the (room, time) combination within the
/// owning class-unit's candidate enumeration; the tabu list and the removal
/// counters are keyed by it. A lesson is a pure value: it carries the
/// preference penalties of the choices it was built from and derives its
/// cost and availability from the read-only problem repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Arena index of the owning class-unit.
    pub class: usize,
    /// Ordinal of this (room, time) combination for the owning class.
    pub variant: u32,
    /// Arena index of the assigned room; `None` for room-less classes.
    pub room: Option<usize>,
    /// The weekly placement.
    pub time: TimeBlock,
    /// Preference penalty of the chosen room.
    pub room_penalty: u32,
    /// Preference penalty of the chosen time.
    pub time_penalty: u32,
    /// Arena indices of the assigned teachers.
    pub teachers: SmallVec<[usize; 4]>,
}

impl Lesson {
    /// Weighted preference cost of this assignment.
    pub fn cost(&self, config: &ProblemConfig) -> f64 {
        self.room_penalty as f64 * config.room_weight + self.time_penalty as f64 * config.time_weight
    }

    /// True when the time block avoids every blackout window of the room
    /// and of every assigned teacher.
    pub fn is_available(&self, repo: &ProblemRepository) -> bool {
        if let Some(room) = self.room {
            if repo
                .room(room)
                .blackouts
                .iter()
                .any(|b| b.overlaps(&self.time))
            {
                return false;
            }
        }
        self.teachers.iter().all(|&t| {
            repo.teacher(t)
                .blackouts
                .iter()
                .all(|b| !b.overlaps(&self.time))
        })
    }
}
