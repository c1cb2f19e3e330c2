//! The read-only problem repository and its validating builder.
//!
//! The engine never reads the structured problem file itself; whoever does
//! feeds a [`ProblemBuilder`], which validates every reference and every
//! time block up front (the search assumes a well-formed repository and
//! performs no input checking of its own).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::class_unit::{ClassUnit, RoomChoice, TimeChoice};
use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{Result, TabulaError};
use crate::time::TimeBlock;

/// Global scheduling configuration: the shape of the term and the cost
/// weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// Days per week, at most 7.
    pub days_per_week: u8,
    /// Weeks per term, at most 64.
    pub weeks_per_term: u8,
    /// Slots per day.
    pub slots_per_day: u16,
    /// Weight of time-preference penalties in the total cost.
    pub time_weight: f64,
    /// Weight of room-preference penalties in the total cost.
    pub room_weight: f64,
    /// Weight of soft distribution-constraint penalties in the total cost.
    pub distribution_weight: f64,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            days_per_week: 7,
            weeks_per_term: 16,
            slots_per_day: 48,
            time_weight: 1.0,
            room_weight: 1.0,
            distribution_weight: 1.0,
        }
    }
}

/// A room with its blackout windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// External identifier.
    pub id: String,
    /// Windows during which the room cannot be booked.
    pub blackouts: Vec<TimeBlock>,
}

/// A teacher with their blackout windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// External identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Windows during which the teacher is unavailable.
    pub blackouts: Vec<TimeBlock>,
}

/// The immutable problem definition: dense arenas of rooms, teachers,
/// classes and constraints, addressed by index during search.
#[derive(Debug, Clone)]
pub struct ProblemRepository {
    name: String,
    config: ProblemConfig,
    rooms: Vec<Room>,
    teachers: Vec<Teacher>,
    classes: Vec<ClassUnit>,
    constraints: Vec<Constraint>,
    class_index: HashMap<String, usize>,
    travel: HashMap<(usize, usize), u16>,
}

impl ProblemRepository {
    /// Problem name, carried into the produced timetable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global configuration.
    pub fn config(&self) -> &ProblemConfig {
        &self.config
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn classes(&self) -> &[ClassUnit] {
        &self.classes
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn room(&self, idx: usize) -> &Room {
        &self.rooms[idx]
    }

    pub fn teacher(&self, idx: usize) -> &Teacher {
        &self.teachers[idx]
    }

    pub fn class(&self, idx: usize) -> &ClassUnit {
        &self.classes[idx]
    }

    pub fn constraint(&self, idx: usize) -> &Constraint {
        &self.constraints[idx]
    }

    /// Resolves an external class id to its arena index.
    pub fn class_index(&self, id: &str) -> Option<usize> {
        self.class_index.get(id).copied()
    }

    /// Travel buffer in slots between two room assignments; 0 when either
    /// lesson is room-less or both use the same room.
    pub fn travel(&self, a: Option<usize>, b: Option<usize>) -> u16 {
        match (a, b) {
            (Some(a), Some(b)) if a != b => {
                let key = (a.min(b), a.max(b));
                self.travel.get(&key).copied().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Builds and validates a [`ProblemRepository`].
///
/// All malformed-input errors surface here, before any search starts.
///
/// # Examples
///
/// ```
/// use tabula_model::{ProblemBuilder, ProblemConfig};
///
/// let mut builder = ProblemBuilder::new("demo", ProblemConfig::default());
/// builder.add_room("R1", vec![]).unwrap();
/// builder.add_teacher("T1", "Prof. Benes", vec![]).unwrap();
/// let morning = builder.time_block("1000000", "1111", 8, 4).unwrap();
/// builder
///     .add_class("C1", None, vec![("R1".into(), 0)], vec![(morning, 0)], vec!["T1".into()])
///     .unwrap();
/// let repo = builder.build();
/// assert_eq!(repo.classes().len(), 1);
/// ```
#[derive(Debug)]
pub struct ProblemBuilder {
    name: String,
    config: ProblemConfig,
    rooms: Vec<Room>,
    teachers: Vec<Teacher>,
    classes: Vec<ClassUnit>,
    constraints: Vec<Constraint>,
    room_index: HashMap<String, usize>,
    teacher_index: HashMap<String, usize>,
    class_index: HashMap<String, usize>,
    constraint_ids: HashMap<String, usize>,
    travel: HashMap<(usize, usize), u16>,
}

impl ProblemBuilder {
    pub fn new(name: &str, config: ProblemConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            rooms: Vec::new(),
            teachers: Vec::new(),
            classes: Vec::new(),
            constraints: Vec::new(),
            room_index: HashMap::new(),
            teacher_index: HashMap::new(),
            class_index: HashMap::new(),
            constraint_ids: HashMap::new(),
            travel: HashMap::new(),
        }
    }

    /// Convenience constructor for a time block under this problem's
    /// configuration.
    pub fn time_block(&self, days: &str, weeks: &str, start: u16, length: u16) -> Result<TimeBlock> {
        TimeBlock::parse(days, weeks, start, length, &self.config)
    }

    pub fn add_room(&mut self, id: &str, blackouts: Vec<TimeBlock>) -> Result<usize> {
        if self.room_index.contains_key(id) {
            return Err(TabulaError::DuplicateId {
                entity: "room",
                id: id.to_string(),
            });
        }
        let idx = self.rooms.len();
        self.room_index.insert(id.to_string(), idx);
        self.rooms.push(Room {
            id: id.to_string(),
            blackouts,
        });
        Ok(idx)
    }

    /// Records the symmetric travel buffer in slots between two rooms.
    pub fn set_travel(&mut self, a: &str, b: &str, slots: u16) -> Result<()> {
        let a = self.lookup(&self.room_index, "room", a)?;
        let b = self.lookup(&self.room_index, "room", b)?;
        self.travel.insert((a.min(b), a.max(b)), slots);
        Ok(())
    }

    pub fn add_teacher(&mut self, id: &str, name: &str, blackouts: Vec<TimeBlock>) -> Result<usize> {
        if self.teacher_index.contains_key(id) {
            return Err(TabulaError::DuplicateId {
                entity: "teacher",
                id: id.to_string(),
            });
        }
        let idx = self.teachers.len();
        self.teacher_index.insert(id.to_string(), idx);
        self.teachers.push(Teacher {
            id: id.to_string(),
            name: name.to_string(),
            blackouts,
        });
        Ok(idx)
    }

    /// Adds a class-unit with its admissible rooms and times.
    ///
    /// An empty room list declares a room-less class. The parent, every
    /// room and every teacher must already exist.
    pub fn add_class(
        &mut self,
        id: &str,
        parent: Option<&str>,
        rooms: Vec<(String, u32)>,
        times: Vec<(TimeBlock, u32)>,
        teachers: Vec<String>,
    ) -> Result<usize> {
        if self.class_index.contains_key(id) {
            return Err(TabulaError::DuplicateId {
                entity: "class",
                id: id.to_string(),
            });
        }
        let parent = parent
            .map(|p| self.lookup(&self.class_index, "class", p))
            .transpose()?;
        let rooms = rooms
            .into_iter()
            .map(|(room, penalty)| {
                Ok(RoomChoice {
                    room: self.lookup(&self.room_index, "room", &room)?,
                    penalty,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let teachers = teachers
            .iter()
            .map(|t| self.lookup(&self.teacher_index, "teacher", t))
            .collect::<Result<SmallVec<[usize; 4]>>>()?;
        let times = times
            .into_iter()
            .map(|(block, penalty)| TimeChoice { block, penalty })
            .collect();

        let idx = self.classes.len();
        self.class_index.insert(id.to_string(), idx);
        self.classes.push(ClassUnit {
            id: id.to_string(),
            parent,
            rooms,
            times,
            teachers,
            constraints: Vec::new(),
        });
        Ok(idx)
    }

    /// Adds a distribution constraint and wires the back-references from
    /// every participating class.
    pub fn add_constraint(
        &mut self,
        id: &str,
        kind: ConstraintKind,
        required: bool,
        penalty: u32,
        classes: Vec<String>,
    ) -> Result<usize> {
        if self.constraint_ids.contains_key(id) {
            return Err(TabulaError::DuplicateId {
                entity: "constraint",
                id: id.to_string(),
            });
        }
        let participants = classes
            .iter()
            .map(|c| self.lookup(&self.class_index, "class", c))
            .collect::<Result<SmallVec<[usize; 4]>>>()?;

        let idx = self.constraints.len();
        self.constraint_ids.insert(id.to_string(), idx);
        for &class in &participants {
            self.classes[class].constraints.push(idx);
        }
        self.constraints.push(Constraint {
            id: id.to_string(),
            kind,
            required,
            penalty,
            classes: participants,
        });
        Ok(idx)
    }

    pub fn build(self) -> ProblemRepository {
        ProblemRepository {
            name: self.name,
            config: self.config,
            rooms: self.rooms,
            teachers: self.teachers,
            classes: self.classes,
            constraints: self.constraints,
            class_index: self.class_index,
            travel: self.travel,
        }
    }

    fn lookup(&self, index: &HashMap<String, usize>, entity: &'static str, id: &str) -> Result<usize> {
        index.get(id).copied().ok_or_else(|| TabulaError::UnknownId {
            entity,
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut builder = ProblemBuilder::new("dup", ProblemConfig::default());
        builder.add_room("R1", vec![]).unwrap();
        assert!(matches!(
            builder.add_room("R1", vec![]),
            Err(TabulaError::DuplicateId { entity: "room", .. })
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut builder = ProblemBuilder::new("refs", ProblemConfig::default());
        let t = builder.time_block("1", "1", 0, 2).unwrap();
        assert!(matches!(
            builder.add_class("C1", None, vec![("R9".into(), 0)], vec![(t, 0)], vec![]),
            Err(TabulaError::UnknownId { entity: "room", .. })
        ));
        assert!(matches!(
            builder.add_constraint(
                "X1",
                ConstraintKind::SameStart,
                true,
                0,
                vec!["C9".into()]
            ),
            Err(TabulaError::UnknownId { entity: "class", .. })
        ));
    }

    #[test]
    fn constraints_wire_back_references() {
        let mut builder = ProblemBuilder::new("wiring", ProblemConfig::default());
        builder.add_room("R1", vec![]).unwrap();
        let t = builder.time_block("1", "1", 0, 2).unwrap();
        for id in ["C1", "C2"] {
            builder
                .add_class(id, None, vec![("R1".into(), 0)], vec![(t, 0)], vec![])
                .unwrap();
        }
        builder
            .add_constraint(
                "D1",
                ConstraintKind::DifferentRoom,
                true,
                0,
                vec!["C1".into(), "C2".into()],
            )
            .unwrap();
        let repo = builder.build();
        assert_eq!(repo.class(0).constraints, vec![0]);
        assert_eq!(repo.class(1).constraints, vec![0]);
        assert_eq!(repo.constraint(0).classes.as_slice(), &[0, 1]);
    }

    #[test]
    fn travel_is_symmetric_and_defaults_to_zero() {
        let mut builder = ProblemBuilder::new("travel", ProblemConfig::default());
        builder.add_room("R1", vec![]).unwrap();
        builder.add_room("R2", vec![]).unwrap();
        builder.add_room("R3", vec![]).unwrap();
        builder.set_travel("R1", "R2", 4).unwrap();
        let repo = builder.build();
        assert_eq!(repo.travel(Some(0), Some(1)), 4);
        assert_eq!(repo.travel(Some(1), Some(0)), 4);
        assert_eq!(repo.travel(Some(0), Some(2)), 0);
        assert_eq!(repo.travel(Some(0), Some(0)), 0);
        assert_eq!(repo.travel(None, Some(1)), 0);
    }
}
