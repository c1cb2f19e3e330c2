//! Class-units: the assignable search variables.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::time::TimeBlock;

/// An admissible room for a class, with its preference penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChoice {
    /// Arena index of the room.
    pub room: usize,
    /// Preference penalty charged when this room is chosen.
    pub penalty: u32,
}

/// An admissible time block for a class, with its preference penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeChoice {
    /// The weekly placement.
    pub block: TimeBlock,
    /// Preference penalty charged when this time is chosen.
    pub penalty: u32,
}

/// One schedulable session of a course: the search *variable*.
///
/// Read-only for the duration of a search; the admissible room and time
/// sets span the candidate values, and `constraints` backs the conflict
/// queries with the indices of every constraint this class participates in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassUnit {
    /// External identifier.
    pub id: String,
    /// Arena index of the parent class within the course structure, if any.
    pub parent: Option<usize>,
    /// Admissible rooms; empty for room-less classes.
    pub rooms: Vec<RoomChoice>,
    /// Admissible time blocks.
    pub times: Vec<TimeChoice>,
    /// Arena indices of the assigned teachers.
    pub teachers: SmallVec<[usize; 4]>,
    /// Arena indices of every constraint this class participates in.
    pub constraints: Vec<usize>,
}

impl ClassUnit {
    /// Number of (room, time) combinations, before availability filtering.
    pub fn value_count(&self) -> usize {
        self.times.len() * self.rooms.len().max(1)
    }
}
