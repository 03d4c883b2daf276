// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use testforge_bytecode::{CodeObjectId, LineId, PredicateId, Value};

/// One memory access recorded by the checked-coverage adapter's `TrackAccess`
/// marker, in execution order. The ordered log is the input to
/// [`crate::slicer::DynamicSlicer`]. `code_object` disambiguates `slot`,
/// which is only unique within the code object that declared it — the same
/// local-slot number in two different code objects reached during one test
/// case's execution is two different memory locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    pub statement_pos: u32,
    pub code_object: CodeObjectId,
    pub slot: u16,
    pub log_index: u32,
}

/// Outcome of executing a single test-case statement (spec.md §3 "Execution
/// trace": "per-statement return value / exception / elapsed time tuples").
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    pub statement_pos: u32,
    pub result: Result<Value, String>,
    pub elapsed: Duration,
    pub timed_out: bool,
}

/// The full record of one test-case execution: which code objects and lines
/// ran, how close every predicate came to flipping, and per-statement
/// outcomes. A single trace spans the whole statement sequence of one test
/// case, accumulated statement by statement (spec.md §3, §4.2).
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    pub executed_code_objects: HashSet<CodeObjectId>,
    pub branchless_entered: HashSet<CodeObjectId>,
    pub covered_lines: HashSet<LineId>,
    pub predicate_executions: HashMap<PredicateId, u32>,
    /// Minimum observed distance to the predicate evaluating true.
    pub true_distances: IndexMap<PredicateId, f64>,
    /// Minimum observed distance to the predicate evaluating false.
    pub false_distances: IndexMap<PredicateId, f64>,
    pub access_log: Vec<AccessEvent>,
    pub statements: Vec<StatementOutcome>,
    pub seeded_values: Vec<Value>,
    pub wall_clock: Duration,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&mut self, line: LineId) {
        self.covered_lines.insert(line);
    }

    pub fn record_code_object(&mut self, id: CodeObjectId) {
        self.executed_code_objects.insert(id);
    }

    pub fn record_branchless(&mut self, id: CodeObjectId) {
        self.branchless_entered.insert(id);
    }

    pub fn record_seed(&mut self, value: Value) {
        self.seeded_values.push(value);
    }

    pub fn record_access(&mut self, statement_pos: u32, code_object: CodeObjectId, slot: u16) {
        let log_index = self.access_log.len() as u32;
        self.access_log.push(AccessEvent { statement_pos, code_object, slot, log_index });
    }

    /// Folds one branch evaluation into the running minima, per spec.md
    /// §4.2: a goal's fitness is the *minimum* distance ever observed across
    /// every test in the suite that executes the predicate, so within a
    /// single trace we only need the minimum across repeated executions
    /// (e.g. inside a loop).
    pub fn record_branch(&mut self, predicate: PredicateId, true_distance: f64, false_distance: f64) {
        *self.predicate_executions.entry(predicate).or_insert(0) += 1;
        let slot = self.true_distances.entry(predicate).or_insert(f64::INFINITY);
        if true_distance < *slot {
            *slot = true_distance;
        }
        let slot = self.false_distances.entry(predicate).or_insert(f64::INFINITY);
        if false_distance < *slot {
            *slot = false_distance;
        }
    }

    pub fn record_statement(&mut self, outcome: StatementOutcome) {
        self.statements.push(outcome);
    }

    pub fn true_distance(&self, predicate: PredicateId) -> Option<f64> {
        self.true_distances.get(&predicate).copied()
    }

    pub fn false_distance(&self, predicate: PredicateId) -> Option<f64> {
        self.false_distances.get(&predicate).copied()
    }

    /// True when execution reached this predicate at all (spec.md §4.5:
    /// a goal not yet reached is at the maximal "unreached" fitness,
    /// independent of branch distance).
    pub fn reached(&self, predicate: PredicateId) -> bool {
        self.predicate_executions.contains_key(&predicate)
    }

    pub fn merge(&mut self, other: &ExecutionTrace) {
        self.executed_code_objects.extend(other.executed_code_objects.iter().copied());
        self.branchless_entered.extend(other.branchless_entered.iter().copied());
        self.covered_lines.extend(other.covered_lines.iter().copied());
        for (&pred, &count) in &other.predicate_executions {
            *self.predicate_executions.entry(pred).or_insert(0) += count;
        }
        for (&pred, &d) in &other.true_distances {
            let slot = self.true_distances.entry(pred).or_insert(f64::INFINITY);
            if d < *slot {
                *slot = d;
            }
        }
        for (&pred, &d) in &other.false_distances {
            let slot = self.false_distances.entry(pred).or_insert(f64::INFINITY);
            if d < *slot {
                *slot = d;
            }
        }
    }
}
