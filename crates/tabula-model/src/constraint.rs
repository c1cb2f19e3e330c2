//! The distribution-constraint taxonomy.
//!
//! Every constraint is a pairwise predicate over scheduled lessons of its
//! participating classes. Required constraints report *conflicts* that the
//! search resolves by unassignment; soft constraints contribute a penalty
//! per violated pair to the schedule cost.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, TabulaError};
use crate::lesson::Lesson;
use crate::repository::ProblemRepository;

/// The closed set of constraint kinds, each carrying its own parameters.
///
/// The pairwise predicate is selected by a single exhaustive `match` in
/// [`ConstraintKind::conflicts`]; adding a kind without a predicate is a
/// compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// All lessons start in the same slot.
    SameStart,
    /// All lessons use the identical time block.
    SameTime,
    /// No two lessons overlap in time.
    DifferentTime,
    /// Each pair's day sets are in a subset relation.
    SameDays,
    /// No two lessons share an active day.
    DifferentDays,
    /// Each pair's week sets are in a subset relation.
    SameWeeks,
    /// No two lessons share an active week.
    DifferentWeeks,
    /// All lessons use the same room.
    SameRoom,
    /// No two lessons share a room.
    DifferentRoom,
    /// Lessons share attendees: no overlap even after room travel.
    SameAttendees,
    /// Every pair of lessons overlaps in time.
    Overlap,
    /// No pair of lessons overlaps in time.
    NotOverlap,
    /// Lessons occur in their declared participation order.
    Precedence,
    /// On a shared day, the span from earliest start to latest end stays
    /// within the given number of slots.
    WorkDay(u16),
    /// On a shared day, lessons keep at least this many slots between them.
    MinGap(u16),
    /// The pair's combined day set stays within this many days.
    MaxDays(u8),
    /// On a shared day, the combined teaching load stays within this many
    /// slots.
    MaxDayLoad(u16),
    /// At most `max` breaks longer than `gap` slots on a shared day.
    MaxBreaks { max: u16, gap: u16 },
    /// Lessons at most `gap` slots apart form a block of at most `max`
    /// slots.
    MaxBlock { max: u16, gap: u16 },
}

impl ConstraintKind {
    /// Parses a constraint kind from its name and integer parameters.
    ///
    /// Fails with [`TabulaError::UnknownConstraintType`] for a name outside
    /// the taxonomy and [`TabulaError::InvalidParameters`] for the wrong
    /// parameter arity.
    pub fn parse(name: &str, params: &[u16]) -> Result<Self> {
        let arity = |expected: usize| -> Result<()> {
            if params.len() == expected {
                Ok(())
            } else {
                Err(TabulaError::InvalidParameters {
                    kind: name.to_string(),
                    expected,
                    got: params.len(),
                })
            }
        };
        let kind = match name {
            "SameStart" => ConstraintKind::SameStart,
            "SameTime" => ConstraintKind::SameTime,
            "DifferentTime" => ConstraintKind::DifferentTime,
            "SameDays" => ConstraintKind::SameDays,
            "DifferentDays" => ConstraintKind::DifferentDays,
            "SameWeeks" => ConstraintKind::SameWeeks,
            "DifferentWeeks" => ConstraintKind::DifferentWeeks,
            "SameRoom" => ConstraintKind::SameRoom,
            "DifferentRoom" => ConstraintKind::DifferentRoom,
            "SameAttendees" => ConstraintKind::SameAttendees,
            "Overlap" => ConstraintKind::Overlap,
            "NotOverlap" => ConstraintKind::NotOverlap,
            "Precedence" => ConstraintKind::Precedence,
            "WorkDay" => {
                arity(1)?;
                ConstraintKind::WorkDay(params[0])
            }
            "MinGap" => {
                arity(1)?;
                ConstraintKind::MinGap(params[0])
            }
            "MaxDays" => {
                arity(1)?;
                ConstraintKind::MaxDays(params[0] as u8)
            }
            "MaxDayLoad" => {
                arity(1)?;
                ConstraintKind::MaxDayLoad(params[0])
            }
            "MaxBreaks" => {
                arity(2)?;
                ConstraintKind::MaxBreaks {
                    max: params[0],
                    gap: params[1],
                }
            }
            "MaxBlock" => {
                arity(2)?;
                ConstraintKind::MaxBlock {
                    max: params[0],
                    gap: params[1],
                }
            }
            other => return Err(TabulaError::UnknownConstraintType(other.to_string())),
        };
        if !matches!(
            kind,
            ConstraintKind::WorkDay(_)
                | ConstraintKind::MinGap(_)
                | ConstraintKind::MaxDays(_)
                | ConstraintKind::MaxDayLoad(_)
                | ConstraintKind::MaxBreaks { .. }
                | ConstraintKind::MaxBlock { .. }
        ) {
            arity(0)?;
        }
        Ok(kind)
    }

    /// The pairwise predicate: true when the two scheduled lessons violate
    /// this constraint.
    ///
    /// For [`ConstraintKind::Precedence`] the arguments must be passed in
    /// declared participation order: `first` is the earlier-listed class.
    pub fn conflicts(&self, first: &Lesson, second: &Lesson, repo: &ProblemRepository) -> bool {
        let a = &first.time;
        let b = &second.time;
        match *self {
            ConstraintKind::SameStart => a.start() != b.start(),
            ConstraintKind::SameTime => a != b,
            ConstraintKind::DifferentTime => a.overlaps(b),
            ConstraintKind::SameDays => !subset(a.days() as u64, b.days() as u64),
            ConstraintKind::DifferentDays => a.days() & b.days() != 0,
            ConstraintKind::SameWeeks => !subset(a.weeks(), b.weeks()),
            ConstraintKind::DifferentWeeks => a.weeks() & b.weeks() != 0,
            ConstraintKind::SameRoom => first.room != second.room,
            ConstraintKind::DifferentRoom => {
                first.room.is_some() && first.room == second.room
            }
            ConstraintKind::SameAttendees => {
                a.overlaps_with_travel(b, repo.travel(first.room, second.room))
            }
            ConstraintKind::Overlap => !a.overlaps(b),
            ConstraintKind::NotOverlap => a.overlaps(b),
            ConstraintKind::Precedence => !a.is_earlier(b),
            ConstraintKind::WorkDay(span) => {
                a.shares_day_and_week(b) && a.span_with(b) > span
            }
            ConstraintKind::MinGap(gap) => {
                a.shares_day_and_week(b) && !a.overlaps(b) && a.gap_to(b) < gap
            }
            ConstraintKind::MaxDays(days) => {
                (a.days() | b.days()).count_ones() > days as u32
            }
            ConstraintKind::MaxDayLoad(load) => {
                a.shares_day_and_week(b) && a.length() + b.length() > load
            }
            ConstraintKind::MaxBreaks { max, gap } => {
                a.shares_day_and_week(b) && !a.overlaps(b) && a.gap_to(b) > gap && max == 0
            }
            ConstraintKind::MaxBlock { max, gap } => {
                a.shares_day_and_week(b) && a.gap_to(b) <= gap && a.span_with(b) > max
            }
        }
    }
}

/// A typed, parameterized rule bound to an ordered set of classes.
///
/// Created once from the problem definition and immutable thereafter;
/// referenced by index from every participating class-unit and from the
/// repository's global constraint list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    /// External identifier.
    pub id: String,
    /// The predicate kind with its parameters.
    pub kind: ConstraintKind,
    /// Required constraints must hold in any valid schedule.
    pub required: bool,
    /// Penalty per violated pair; meaningful only when not required.
    pub penalty: u32,
    /// Arena indices of the participating classes, in declared order.
    pub classes: SmallVec<[usize; 4]>,
}

impl Constraint {
    /// Collects every class in conflict with `candidate` under this
    /// required constraint, as if `candidate` were scheduled.
    ///
    /// `lesson_of` resolves a class index to its currently scheduled
    /// lesson; unscheduled participants are skipped, and the candidate's
    /// own class never appears in the result.
    pub fn compute_conflicts<'a, F>(
        &self,
        candidate: &Lesson,
        repo: &ProblemRepository,
        lesson_of: F,
    ) -> BTreeSet<usize>
    where
        F: Fn(usize) -> Option<&'a Lesson>,
    {
        let mut conflicts = BTreeSet::new();
        let Some(candidate_pos) = self.classes.iter().position(|&c| c == candidate.class) else {
            return conflicts;
        };
        for (pos, &class) in self.classes.iter().enumerate() {
            if class == candidate.class {
                continue;
            }
            let Some(other) = lesson_of(class) else {
                continue;
            };
            let violated = if pos < candidate_pos {
                self.kind.conflicts(other, candidate, repo)
            } else {
                self.kind.conflicts(candidate, other, repo)
            };
            if violated {
                conflicts.insert(class);
            }
        }
        conflicts
    }

    /// Penalty sum over every violated pair of scheduled participants.
    ///
    /// Only meaningful for soft constraints; the distribution weight is
    /// applied by the schedule's cost aggregation.
    pub fn compute_penalty<'a, F>(&self, repo: &ProblemRepository, lesson_of: F) -> u64
    where
        F: Fn(usize) -> Option<&'a Lesson>,
    {
        let mut violated_pairs = 0u64;
        for (i, &first) in self.classes.iter().enumerate() {
            let Some(a) = lesson_of(first) else { continue };
            for &second in &self.classes[i + 1..] {
                let Some(b) = lesson_of(second) else { continue };
                if self.kind.conflicts(a, b, repo) {
                    violated_pairs += 1;
                }
            }
        }
        violated_pairs * self.penalty as u64
    }
}

fn subset(a: u64, b: u64) -> bool {
    a & b == a || a & b == b
}
