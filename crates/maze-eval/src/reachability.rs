//! Breadth-first reachability over the open-door subgraph of one state.
//!
//! All per-state buffers live in [`Traversal`] and are reset in place at the
//! start of every state, so the enumeration loop never allocates.

use std::collections::VecDeque;

use crate::enumerator::State;
use crate::error::EvalError;
use crate::layout::{CellId, DoorId, DoorLetter, Layout};

/// Reusable scratch space for evaluating one state at a time.
#[derive(Debug, Clone)]
pub struct Traversal {
    /// Open flag per door id.
    open: Vec<bool>,
    /// Predecessor slot per cell id.
    predecessor: Vec<Option<CellId>>,
    /// Set once a cell has been enqueued; covers both the frontier and the
    /// visited set.
    seen: Vec<bool>,
    frontier: VecDeque<CellId>,
    path: Vec<CellId>,
    visited: usize,
    open_count: usize,
    /// Door ids in letter order, for sorted open/closed listings.
    by_letter: Vec<DoorId>,
}

/// The outcome of one traversal.
#[derive(Debug, Clone, Copy)]
pub struct Reachability<'t> {
    /// Number of distinct cells dequeued.
    pub visited: usize,
    pub open_count: usize,
    pub closed_count: usize,
    /// Start-to-end path recorded when the end cell was first enqueued;
    /// empty if it never was.
    pub path: &'t [CellId],
    traversal: &'t Traversal,
    layout: &'t Layout,
}

impl<'t> Reachability<'t> {
    /// Whether every cell of the layout was reached.
    pub fn is_complete(&self) -> bool {
        self.visited == self.layout.cell_count()
    }

    pub fn reached(&self, cell: CellId) -> bool {
        self.path.contains(&cell)
    }

    /// Open door letters in alphabetical order.
    pub fn open_letters(&self) -> impl Iterator<Item = DoorLetter> + 't {
        self.letters(true)
    }

    /// Closed door letters in alphabetical order.
    pub fn closed_letters(&self) -> impl Iterator<Item = DoorLetter> + 't {
        self.letters(false)
    }

    fn letters(&self, open: bool) -> impl Iterator<Item = DoorLetter> + 't {
        let traversal = self.traversal;
        let layout = self.layout;
        traversal
            .by_letter
            .iter()
            .filter(move |&&door| traversal.open[door] == open)
            .map(move |&door| layout.door(door).letter)
    }

    /// Names of the cells on the recorded path.
    pub fn path_names(&self) -> impl Iterator<Item = &'t str> + 't {
        let layout = self.layout;
        self.path.iter().map(move |&cell| layout.cell(cell).name.as_str())
    }
}

impl Traversal {
    pub fn new(layout: &Layout) -> Self {
        let cells = layout.cell_count();
        Self {
            open: vec![false; layout.door_count()],
            predecessor: vec![None; cells],
            seen: vec![false; cells],
            frontier: VecDeque::with_capacity(cells),
            path: Vec::with_capacity(cells),
            visited: 0,
            open_count: 0,
            by_letter: layout.doors_by_letter(),
        }
    }

    /// Reset per-state buffers and set every door's open flag from the
    /// door letter's bit in `state`.
    pub fn load(&mut self, layout: &Layout, state: State) {
        self.predecessor.fill(None);
        self.open_count = 0;
        for (flag, door) in self.open.iter_mut().zip(layout.doors()) {
            *flag = state.is_open(door.letter);
            self.open_count += usize::from(*flag);
        }
    }

    /// Run the traversal from `start`, recording the path to `end`.
    ///
    /// Fails if a cell is linked to a door that no longer lists it as an
    /// endpoint.
    pub fn run<'t>(
        &'t mut self,
        layout: &'t Layout,
        start: CellId,
        end: CellId,
    ) -> Result<Reachability<'t>, EvalError> {
        self.seen.fill(false);
        self.frontier.clear();
        self.path.clear();
        self.visited = 0;

        self.seen[start] = true;
        self.frontier.push_back(start);
        let mut found = start == end;
        if found {
            self.path.push(start);
        }

        while let Some(cell) = self.frontier.pop_front() {
            self.visited += 1;

            for &door_id in &layout.cell(cell).doors {
                if !self.open[door_id] {
                    continue;
                }
                let door = layout.door(door_id);
                let next = door.other(cell).ok_or_else(|| EvalError::DoorNotConnected {
                    door: door.letter.as_char(),
                    cell: layout.cell(cell).name.clone(),
                    first: layout.cell(door.cells.0).name.clone(),
                    second: layout.cell(door.cells.1).name.clone(),
                })?;

                if self.seen[next] {
                    continue;
                }
                self.seen[next] = true;
                self.predecessor[next] = Some(cell);
                self.frontier.push_back(next);

                // Only the first arrival at the end cell is recorded.
                if next == end && !found {
                    found = true;
                    self.record_path(end);
                }
            }
        }

        let traversal: &'t Traversal = self;
        Ok(Reachability {
            visited: traversal.visited,
            open_count: traversal.open_count,
            closed_count: traversal.open.len() - traversal.open_count,
            path: &traversal.path,
            traversal,
            layout,
        })
    }

    fn record_path(&mut self, end: CellId) {
        let mut cursor = Some(end);
        while let Some(cell) = cursor {
            self.path.push(cell);
            cursor = self.predecessor[cell];
        }
        self.path.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_state(layout: &Layout, mask: u32, start: &str, end: &str) -> (usize, Vec<String>) {
        let mut traversal = Traversal::new(layout);
        traversal.load(layout, State::new(mask));
        let reach = traversal
            .run(
                layout,
                layout.cell_id(start).unwrap(),
                layout.cell_id(end).unwrap(),
            )
            .unwrap();
        (
            reach.visited,
            reach.path_names().map(str::to_string).collect(),
        )
    }

    #[test]
    fn test_line_layout() {
        let layout = Layout::parse("A X Y\nB Y Z\n").unwrap();

        assert_eq!(
            run_state(&layout, 0b11, "X", "Z"),
            (3, vec!["X".into(), "Y".into(), "Z".into()])
        );
        assert_eq!(run_state(&layout, 0b01, "X", "Z"), (2, vec![]));
        assert_eq!(run_state(&layout, 0b10, "X", "Z"), (1, vec![]));
        assert_eq!(run_state(&layout, 0b00, "X", "Z"), (1, vec![]));
    }

    #[test]
    fn test_path_is_shortest() {
        // Long way round: S-a-b-E via A, B, C. Short cut: S-E via D.
        let layout = Layout::parse("A S a\nB a b\nC b E\nD S E\n").unwrap();
        let (visited, path) = run_state(&layout, 0b1111, "S", "E");
        assert_eq!(visited, 4);
        assert_eq!(path, vec!["S".to_string(), "E".to_string()]);

        let (_, path) = run_state(&layout, 0b0111, "S", "E");
        assert_eq!(path, vec!["S", "a", "b", "E"]);
    }

    #[test]
    fn test_start_equals_end() {
        let layout = Layout::parse("A X Y\n").unwrap();
        assert_eq!(run_state(&layout, 0, "X", "X"), (1, vec!["X".to_string()]));
    }

    #[test]
    fn test_sorted_letters() {
        let layout = Layout::parse("C X Y\nA Y Z\nB Z X\n").unwrap();
        let mut traversal = Traversal::new(&layout);
        traversal.load(&layout, State::new(0b101));
        let reach = traversal.run(&layout, 0, 1).unwrap();
        let open: String = reach.open_letters().map(|l| l.as_char()).collect();
        let closed: String = reach.closed_letters().map(|l| l.as_char()).collect();
        assert_eq!(open, "AC");
        assert_eq!(closed, "B");
        assert_eq!(reach.open_count, 2);
        assert_eq!(reach.closed_count, 1);
    }

    #[test]
    fn test_state_reset_between_loads() {
        let layout = Layout::parse("A X Y\nB Y Z\n").unwrap();
        let (x, z) = (layout.cell_id("X").unwrap(), layout.cell_id("Z").unwrap());
        let mut traversal = Traversal::new(&layout);

        traversal.load(&layout, State::new(0b11));
        assert_eq!(traversal.run(&layout, x, z).unwrap().path.len(), 3);

        traversal.load(&layout, State::new(0b01));
        let reach = traversal.run(&layout, x, z).unwrap();
        assert!(reach.path.is_empty());
        assert_eq!(reach.visited, 2);
    }

    #[test]
    fn test_redeclared_door_is_fatal_when_opened() {
        let layout = Layout::parse("A X Y\nA Y Z\n").unwrap();
        let x = layout.cell_id("X").unwrap();
        let z = layout.cell_id("Z").unwrap();
        let mut traversal = Traversal::new(&layout);

        traversal.load(&layout, State::new(0));
        assert!(traversal.run(&layout, x, z).is_ok());

        traversal.load(&layout, State::new(1));
        let err = traversal.run(&layout, x, z).unwrap_err();
        assert!(matches!(err, EvalError::DoorNotConnected { door: 'A', .. }));
    }
}
