//! Error types for Tabula

use thiserror::Error;

/// Main error type for Tabula operations.
///
/// Malformed-input variants (`InvalidTime`, `UnknownConstraintType`,
/// `InvalidParameters`, `UnknownId`, `DuplicateId`) are raised while a
/// problem repository is being built, never during search. `NotAssigned`
/// and `InvalidState` indicate a broken invariant inside one search run
/// and abort that run.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// A time block bit-string or slot range is malformed.
    #[error("invalid time block: {0}")]
    InvalidTime(String),

    /// A constraint name does not belong to the closed taxonomy.
    #[error("unknown constraint type: {0}")]
    UnknownConstraintType(String),

    /// A constraint was given the wrong number of parameters.
    #[error("constraint {kind} expects {expected} parameter(s), got {got}")]
    InvalidParameters {
        kind: String,
        expected: usize,
        got: usize,
    },

    /// A reference to a room, teacher, class or constraint did not resolve.
    #[error("unknown {entity} id: {id}")]
    UnknownId { entity: &'static str, id: String },

    /// Two rooms, teachers, classes or constraints share an id.
    #[error("duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: String },

    /// An unassigned class was unassigned again.
    #[error("class {0} is not assigned")]
    NotAssigned(String),

    /// Invalid operation for the current search state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for Tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;
