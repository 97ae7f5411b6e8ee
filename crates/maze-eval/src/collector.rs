//! Pass/fail classification and result accumulation.

use serde::Serialize;

use crate::layout::{CellId, DoorLetter};
use crate::reachability::Reachability;

/// One reportable state: sorted open letters, sorted closed letters and the
/// recorded path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResultTuple {
    pub open: Vec<DoorLetter>,
    pub closed: Vec<DoorLetter>,
    pub path: Vec<String>,
}

impl ResultTuple {
    pub fn from_reachability(reach: &Reachability<'_>) -> Self {
        Self {
            open: reach.open_letters().collect(),
            closed: reach.closed_letters().collect(),
            path: reach.path_names().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    /// A state passes when every cell was visited, the end cell is on the
    /// recorded path and the filter accepted it.
    pub fn classify(reach: &Reachability<'_>, end: CellId, accepted: bool) -> Self {
        if reach.is_complete() && reach.reached(end) && accepted {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

/// Totals and retained results of a finished run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub pass_count: u64,
    pub fail_count: u64,
    pub skip_count: u64,
    pub total_states: u64,
    pub door_count: usize,
    pub time_elapsed_ms: u64,
    #[serde(skip)]
    pub passed: Vec<ResultTuple>,
    /// Only filled when failure collection is enabled.
    #[serde(skip)]
    pub failed: Vec<ResultTuple>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    collect_failures: bool,
    passed: Vec<ResultTuple>,
    failed: Vec<ResultTuple>,
    pass_count: u64,
    fail_count: u64,
    skip_count: u64,
}

impl ResultCollector {
    pub fn new(collect_failures: bool) -> Self {
        Self {
            collect_failures,
            ..Default::default()
        }
    }

    pub fn record_skip(&mut self) {
        self.skip_count += 1;
    }

    /// Tally one evaluated state. Failing states are only materialized
    /// when failure collection is on.
    pub fn record(&mut self, outcome: Outcome, reach: &Reachability<'_>) {
        match outcome {
            Outcome::Pass => {
                self.pass_count += 1;
                self.passed.push(ResultTuple::from_reachability(reach));
            }
            Outcome::Fail => {
                self.fail_count += 1;
                if self.collect_failures {
                    self.failed.push(ResultTuple::from_reachability(reach));
                }
            }
        }
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    pub fn fail_count(&self) -> u64 {
        self.fail_count
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    pub fn finish(self, total_states: u64, door_count: usize, time_elapsed_ms: u64) -> Evaluation {
        Evaluation {
            pass_count: self.pass_count,
            fail_count: self.fail_count,
            skip_count: self.skip_count,
            total_states,
            door_count,
            time_elapsed_ms,
            passed: self.passed,
            failed: self.failed,
        }
    }
}
