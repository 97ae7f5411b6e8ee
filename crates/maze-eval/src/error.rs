//! Error types for layout loading, predicate compilation and evaluation.
//!
//! Everything here is fatal: skipped and failing states are ordinary
//! outcomes and never surface as errors.

use thiserror::Error;

/// Errors raised while turning layout text into a [`crate::Layout`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A door or forced-door directive named something outside `A`-`Z`.
    #[error("line {line}: '{found}' is not a door letter (expected A-Z)")]
    InvalidDoorLetter { line: usize, found: char },
}

/// Errors raised while parsing or binding a `?` predicate expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("unexpected character '{found}' at offset {offset} in predicate `{expr}`")]
    UnexpectedChar {
        expr: String,
        offset: usize,
        found: char,
    },

    #[error("unexpected {found} at offset {offset} in predicate `{expr}`")]
    UnexpectedToken {
        expr: String,
        offset: usize,
        found: String,
    },

    #[error("predicate `{expr}` ended unexpectedly")]
    UnexpectedEnd { expr: String },

    #[error("integer literal at offset {offset} does not fit in 64 bits in predicate `{expr}`")]
    IntegerOverflow { expr: String, offset: usize },

    #[error("unknown name '{name}' in predicate `{expr}`")]
    UnknownName { expr: String, name: String },

    #[error("unknown attribute '.{attribute}' on door {door} in predicate `{expr}`")]
    UnknownAttribute {
        expr: String,
        door: char,
        attribute: String,
    },

    /// The expression references a door letter that the layout never declares.
    #[error("predicate `{expr}` references door {door}, which the layout does not declare")]
    UndeclaredDoor { expr: String, door: char },
}

/// Fatal conditions that abort a whole evaluation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("predicate error: {0}")]
    Predicate(#[from] PredicateError),

    /// The layout has no `START` or `END` directive.
    #[error("layout does not declare an {0} cell")]
    MissingEndpoint(&'static str),

    /// `START`/`END` name a cell that no door touches.
    #[error("{role} cell '{name}' is not connected to any door")]
    UnknownCell { role: &'static str, name: String },

    /// A cell is linked to a door whose current endpoints do not include it.
    #[error("cell '{cell}' is linked to door {door}, but door {door} connects '{first}' and '{second}'")]
    DoorNotConnected {
        door: char,
        cell: String,
        first: String,
        second: String,
    },
}
