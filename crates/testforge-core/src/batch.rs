// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::evaluate::Evaluator;
use crate::testcase::TestCase;
use testforge_trace::ExecutionTrace;

/// Outcome of running one batch of test cases (spec.md §5 "Optional
/// subprocess mode"): either every test's trace, or an indication that the
/// worker handling the batch was lost, which invalidates only this batch
/// (the master retains archive and GA state and simply resubmits).
pub enum BatchOutcome {
    Traces(Vec<ExecutionTrace>),
    WorkerLost,
}

/// Abstracts "run this batch of test cases and get traces back" so the GA
/// core never depends on a concrete execution mechanism (spec.md §5: "master
/// and worker communicate by serialized trace records"). [`LocalTransport`]
/// runs batches in-process; an out-of-process transport spawning and
/// supervising a worker subprocess is a drop-in implementation of this same
/// trait (see DESIGN.md).
pub trait BatchTransport {
    fn run_batch(&self, tests: &[TestCase]) -> BatchOutcome;
}

/// Default, in-process transport: runs every test case through the shared
/// [`Evaluator`] on the calling thread's tracer. Never reports
/// [`BatchOutcome::WorkerLost`], since there is no separate worker process
/// to lose.
pub struct LocalTransport<'a> {
    evaluator: Evaluator<'a>,
}

impl<'a> LocalTransport<'a> {
    pub fn new(evaluator: Evaluator<'a>) -> Self {
        Self { evaluator }
    }
}

impl<'a> BatchTransport for LocalTransport<'a> {
    fn run_batch(&self, tests: &[TestCase]) -> BatchOutcome {
        let mut traces = Vec::with_capacity(tests.len());
        for test in tests {
            match self.evaluator.run(test) {
                Ok(trace) => traces.push(trace),
                Err(_) => traces.push(ExecutionTrace::new()),
            }
        }
        BatchOutcome::Traces(traces)
    }
}
