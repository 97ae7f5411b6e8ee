//! Exhaustive enumeration of door states.
//!
//! Every integer in `[0, 2^D)` is one state, where `D` is the number of
//! declared doors. Door `X` is open in state `i` when bit `index(X)` of `i` is
//! set, `A` being bit 0. The letter position is used as-is, never remapped to
//! a dense index, so forced-door checks and predicates key on the letter.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::collector::{Evaluation, Outcome, ResultCollector};
use crate::error::EvalError;
use crate::expr::StateFacts;
use crate::filter::PredicateFilter;
use crate::layout::{CellId, DoorLetter, Layout, LetterSet};
use crate::reachability::Traversal;

/// One door-state assignment as a 26-bit letter mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State(u32);

impl State {
    pub fn new(mask: u32) -> Self {
        Self(mask)
    }

    pub fn mask(self) -> u32 {
        self.0
    }

    pub fn is_open(self, letter: DoorLetter) -> bool {
        self.0 & letter.bit() != 0
    }
}

/// What the enumerator decided about one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A forced-open door is closed or a forced-closed door is open.
    Skip(State),
    Evaluate(State),
}

/// Iterator over all states of a layout.
#[derive(Debug, Clone)]
pub struct StateEnumerator {
    next: u64,
    total: u64,
    must_open: u32,
    must_close: u32,
}

impl StateEnumerator {
    pub fn new(layout: &Layout) -> Self {
        let declared = layout.letters().bits();
        Self {
            next: 0,
            total: 1u64 << layout.door_count(),
            // Forced letters with no door never cause a skip.
            must_open: layout.force_open.bits() & declared,
            must_close: layout.force_closed.bits() & declared,
        }
    }

    /// Number of states, `2^D`.
    pub fn total(&self) -> u64 {
        self.total
    }

    fn contradicts(&self, mask: u32) -> bool {
        mask & self.must_close != 0 || !mask & self.must_open != 0
    }
}

impl Iterator for StateEnumerator {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.next >= self.total {
            return None;
        }
        // At most 26 doors, so the index always fits the 26-bit mask.
        let state = State::new(self.next as u32);
        self.next += 1;

        if self.contradicts(state.mask()) {
            Some(Step::Skip(state))
        } else {
            Some(Step::Evaluate(state))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Apply `CONTAINS`/`OMITS` path-membership rules.
    pub path_constraints: bool,
    /// Keep failing states for reporting, not just their count.
    pub collect_failures: bool,
    /// Emit a progress event every this many states; 0 disables it.
    pub progress_interval: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            path_constraints: true,
            collect_failures: false,
            progress_interval: 1 << 16,
        }
    }
}

/// A validated layout ready for evaluation: endpoints resolved and
/// predicates compiled.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    layout: &'a Layout,
    start: CellId,
    end: CellId,
    filter: PredicateFilter,
    declared: LetterSet,
}

impl<'a> Session<'a> {
    pub fn new(layout: &'a Layout, config: &EvalConfig) -> Result<Self, EvalError> {
        let start = resolve_endpoint(layout, layout.start.as_deref(), "START")?;
        let end = resolve_endpoint(layout, layout.end.as_deref(), "END")?;
        let filter = PredicateFilter::compile(layout, config.path_constraints)?;

        if !layout.has_contiguous_letters() {
            warn!(
                doors = layout.door_count(),
                "door letters are not a contiguous run from A; letters past bit {} are never enumerated open",
                layout.door_count()
            );
        }

        Ok(Self {
            layout,
            start,
            end,
            filter,
            declared: layout.letters(),
        })
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Traverse and classify one non-skipped state.
    pub fn evaluate_state(
        &self,
        traversal: &mut Traversal,
        state: State,
        collector: &mut ResultCollector,
    ) -> Result<Outcome, EvalError> {
        traversal.load(self.layout, state);
        let reach = traversal.run(self.layout, self.start, self.end)?;

        let facts = StateFacts {
            open_count: reach.open_count as i64,
            closed_count: reach.closed_count as i64,
            path_length: reach.path.len() as i64,
            open_doors: LetterSet::from_bits(state.mask() & self.declared.bits()),
        };
        let accepted = self.filter.accepts(&facts, reach.path);
        let outcome = Outcome::classify(&reach, self.end, accepted);

        collector.record(outcome, &reach);
        Ok(outcome)
    }

    /// Enumerate and classify every state.
    pub fn run(&self, config: &EvalConfig) -> Result<Evaluation, EvalError> {
        let start_time = Instant::now();
        let enumerator = StateEnumerator::new(self.layout);
        let total = enumerator.total();

        info!(
            cells = self.layout.cell_count(),
            doors = self.layout.door_count(),
            predicates = self.filter.predicates().len(),
            states = total,
            "evaluating layout"
        );

        let mut traversal = Traversal::new(self.layout);
        let mut collector = ResultCollector::new(config.collect_failures);

        for (index, step) in (0u64..).zip(enumerator) {
            if config.progress_interval > 0 && index % config.progress_interval == 0 {
                debug!(state = index + 1, total, "running");
            }
            match step {
                Step::Skip(_) => collector.record_skip(),
                Step::Evaluate(state) => {
                    self.evaluate_state(&mut traversal, state, &mut collector)?;
                }
            }
        }

        info!(
            passing = collector.pass_count(),
            failing = collector.fail_count(),
            skipped = collector.skip_count(),
            "evaluation finished"
        );

        Ok(collector.finish(
            total,
            self.layout.door_count(),
            start_time.elapsed().as_millis() as u64,
        ))
    }
}

fn resolve_endpoint(
    layout: &Layout,
    name: Option<&str>,
    directive: &'static str,
) -> Result<CellId, EvalError> {
    let name = name.ok_or(EvalError::MissingEndpoint(directive))?;
    layout.cell_id(name).ok_or_else(|| EvalError::UnknownCell {
        role: directive,
        name: name.to_string(),
    })
}

/// Validate `layout` and evaluate every door state.
pub fn evaluate(layout: &Layout, config: &EvalConfig) -> Result<Evaluation, EvalError> {
    Session::new(layout, config)?.run(config)
}
