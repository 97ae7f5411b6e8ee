//! Maze layout evaluator.
//!
//! A layout is a graph of named cells joined by lettered doors. This crate
//! enumerates every open/closed assignment of the doors, checks whether the
//! whole maze is reachable from the start cell with a path to the end cell,
//! filters states through user predicates and classifies each one as
//! passing, failing or skipped.

pub mod collector;
pub mod enumerator;
pub mod error;
pub mod expr;
pub mod filter;
pub mod layout;
pub mod logging;
pub mod reachability;
pub mod report;

// Re-export main types
pub use collector::{Evaluation, Outcome, ResultCollector, ResultTuple};
pub use enumerator::{evaluate, EvalConfig, Session, State, StateEnumerator, Step};
pub use error::{EvalError, LayoutError, PredicateError};
pub use expr::{Predicate, StateFacts};
pub use filter::{PredicateFilter, Rejection};
pub use layout::{Cell, CellId, Door, DoorId, DoorLetter, Layout, LayoutRecord, LetterSet};
pub use reachability::{Reachability, Traversal};
pub use report::{render_report, write_report};
