// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::testcase::TestCase;

/// Multiset of test cases with aggregate fitness (spec.md §3 "Test suite").
/// Crossover and mutation operate at both the test-case and suite
/// granularity; whole-suite chromosomes use this type directly, while
/// MOSA/DynaMOSA evolve individual test cases and assemble a suite only at
/// archive-emission time.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tests(tests: Vec<TestCase>) -> Self {
        Self { tests }
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Total statement count across every test, used both as the
    /// elitism/truncation tie-break length and as the `max_suite_length`
    /// budget check (spec.md §6).
    pub fn total_length(&self) -> usize {
        self.tests.iter().map(TestCase::len).sum()
    }

    pub fn push(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    pub fn dedup_by_structural_equality(&mut self) {
        let mut kept: Vec<TestCase> = Vec::with_capacity(self.tests.len());
        for candidate in self.tests.drain(..) {
            if !kept.iter().any(|t| t.structurally_equals(&candidate)) {
                kept.push(candidate);
            }
        }
        self.tests = kept;
    }
}
