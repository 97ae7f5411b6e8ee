//! Predicate filtering of evaluated states.
//!
//! The `?` expressions run in declaration order and the first false one
//! rejects the state; later ones are not evaluated. `CONTAINS`/`OMITS`
//! path-membership rules are checked afterwards when enabled.

use crate::error::PredicateError;
use crate::expr::{Predicate, StateFacts};
use crate::layout::{CellId, Layout};

/// Why a state was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Index of the first predicate that evaluated false.
    Predicate(usize),
    /// A `CONTAINS` cell is not on the path.
    MissingCell(usize),
    /// An `OMITS` cell is on the path.
    ExcludedCell(usize),
}

/// Membership requirement for one `CONTAINS` name.
#[derive(Debug, Clone, Copy)]
enum Required {
    Cell(CellId),
    /// The name matches no cell, so no path can contain it.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct PredicateFilter {
    predicates: Vec<Predicate>,
    required: Vec<Required>,
    /// Excluded names that match no cell can never be on a path and are
    /// dropped at compile time; the index into `layout.excluded_cells` is
    /// kept for reporting.
    excluded: Vec<(usize, CellId)>,
}

impl PredicateFilter {
    /// Parse every predicate of `layout` and bind door letters.
    ///
    /// With `path_constraints` off, `CONTAINS`/`OMITS` are ignored.
    pub fn compile(layout: &Layout, path_constraints: bool) -> Result<Self, PredicateError> {
        let declared = layout.letters();
        let mut predicates = Vec::with_capacity(layout.predicates.len());

        for source in &layout.predicates {
            let predicate = Predicate::parse(source)?;
            if let Some(door) = predicate
                .doors()
                .iter()
                .find(|letter| !declared.contains(*letter))
            {
                return Err(PredicateError::UndeclaredDoor {
                    expr: source.clone(),
                    door: door.as_char(),
                });
            }
            predicates.push(predicate);
        }

        let (required, excluded) = if path_constraints {
            let required = layout
                .required_cells
                .iter()
                .map(|name| layout.cell_id(name).map_or(Required::Unknown, Required::Cell))
                .collect();
            let excluded = layout
                .excluded_cells
                .iter()
                .enumerate()
                .filter_map(|(idx, name)| layout.cell_id(name).map(|cell| (idx, cell)))
                .collect();
            (required, excluded)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Self {
            predicates,
            required,
            excluded,
        })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Evaluate one state. `path` is the recorded start-to-end path.
    pub fn check(&self, facts: &StateFacts, path: &[CellId]) -> Result<(), Rejection> {
        for (idx, predicate) in self.predicates.iter().enumerate() {
            if !predicate.eval(facts) {
                return Err(Rejection::Predicate(idx));
            }
        }

        for (idx, required) in self.required.iter().enumerate() {
            let present = match required {
                Required::Cell(cell) => path.contains(cell),
                Required::Unknown => false,
            };
            if !present {
                return Err(Rejection::MissingCell(idx));
            }
        }

        for &(idx, cell) in &self.excluded {
            if path.contains(&cell) {
                return Err(Rejection::ExcludedCell(idx));
            }
        }

        Ok(())
    }

    pub fn accepts(&self, facts: &StateFacts, path: &[CellId]) -> bool {
        self.check(facts, path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DoorLetter, LetterSet};

    const BASE: &str = "A X Y\nB Y Z\nC X Z\nSTART X\nEND Z\n";

    fn layout(extra: &str) -> Layout {
        Layout::parse(&format!("{BASE}{extra}")).unwrap()
    }

    fn facts(open: &str, path_length: i64) -> StateFacts {
        let mut open_doors = LetterSet::new();
        for c in open.chars() {
            open_doors.insert(DoorLetter::from_char(c).unwrap());
        }
        let open_count = open.len() as i64;
        StateFacts {
            open_count,
            closed_count: 3 - open_count,
            path_length,
            open_doors,
        }
    }

    fn cells(layout: &Layout, names: &[&str]) -> Vec<CellId> {
        names.iter().map(|n| layout.cell_id(n).unwrap()).collect()
    }

    #[test]
    fn test_no_predicates_accepts() {
        let layout = layout("");
        let filter = PredicateFilter::compile(&layout, true).unwrap();
        assert!(filter.accepts(&facts("", 0), &[]));
    }

    #[test]
    fn test_first_false_predicate_short_circuits() {
        let layout = layout("? open >= 1\n? A.open\n? path < 3\n");
        let filter = PredicateFilter::compile(&layout, true).unwrap();

        assert_eq!(filter.check(&facts("", 0), &[]), Err(Rejection::Predicate(0)));
        assert_eq!(filter.check(&facts("B", 0), &[]), Err(Rejection::Predicate(1)));
        assert_eq!(filter.check(&facts("AB", 3), &[]), Err(Rejection::Predicate(2)));
        assert_eq!(filter.check(&facts("AB", 2), &[]), Ok(()));
    }

    #[test]
    fn test_path_membership() {
        let layout = layout("CONTAINS Y\nOMITS W X\n");
        let filter = PredicateFilter::compile(&layout, true).unwrap();
        let through_y = cells(&layout, &["X", "Y", "Z"]);
        let direct = cells(&layout, &["X", "Z"]);

        assert_eq!(filter.check(&facts("ABC", 3), &direct), Err(Rejection::MissingCell(0)));
        // `W` is not a cell; `X` is index 1 of the OMITS list.
        assert_eq!(
            filter.check(&facts("AB", 3), &through_y),
            Err(Rejection::ExcludedCell(1))
        );
    }

    #[test]
    fn test_predicates_run_before_membership() {
        let layout = layout("? C.closed\nCONTAINS Y\n");
        let filter = PredicateFilter::compile(&layout, true).unwrap();
        let direct = cells(&layout, &["X", "Z"]);
        assert_eq!(filter.check(&facts("C", 2), &direct), Err(Rejection::Predicate(0)));
        assert_eq!(filter.check(&facts("", 2), &direct), Err(Rejection::MissingCell(0)));
    }

    #[test]
    fn test_unknown_required_cell_always_fails() {
        let layout = layout("CONTAINS Nowhere\n");
        let filter = PredicateFilter::compile(&layout, true).unwrap();
        let path = cells(&layout, &["X", "Y", "Z"]);
        assert_eq!(filter.check(&facts("AB", 3), &path), Err(Rejection::MissingCell(0)));
    }

    #[test]
    fn test_path_constraints_can_be_disabled() {
        let layout = layout("CONTAINS Y\nOMITS X\n");
        let filter = PredicateFilter::compile(&layout, false).unwrap();
        assert!(filter.accepts(&facts("C", 2), &cells(&layout, &["X", "Z"])));
    }

    #[test]
    fn test_undeclared_door_is_rejected() {
        let layout = layout("? D.open or A.open\n");
        let err = PredicateFilter::compile(&layout, true).unwrap_err();
        assert!(matches!(err, PredicateError::UndeclaredDoor { door: 'D', .. }));
    }

    #[test]
    fn test_malformed_predicate_is_fatal() {
        let layout = layout("? open >> 1\n");
        assert!(PredicateFilter::compile(&layout, true).is_err());
    }
}
