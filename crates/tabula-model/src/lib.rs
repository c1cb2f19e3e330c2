//! Tabula Model - Problem data model for the Tabula timetabling engine
//!
//! This crate provides the read-only problem definition the search engine
//! consumes:
//! - Time blocks with the overlap and precedence predicates
//! - The closed distribution-constraint taxonomy
//! - Class-units (search variables) and scheduled lessons (search values)
//! - The validated problem repository and the timetable output type

pub mod class_unit;
pub mod constraint;
pub mod error;
pub mod lesson;
pub mod repository;
pub mod time;
pub mod timetable;

pub use class_unit::{ClassUnit, RoomChoice, TimeChoice};
pub use constraint::{Constraint, ConstraintKind};
pub use error::{Result, TabulaError};
pub use lesson::Lesson;
pub use repository::{ProblemBuilder, ProblemConfig, ProblemRepository, Room, Teacher};
pub use time::TimeBlock;
pub use timetable::Timetable;
