// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::varref::StatementIndex;
use testforge_bytecode::Value;

/// One regression assertion attached to a test case, keyed to the statement
/// position it checks (spec.md §3: "optional list of assertions keyed to
/// statement positions"). `testforge-assert` is the only crate that
/// constructs these (phase 1 candidate generation, phase 2 mutation
/// filtering); this crate only carries the shape so the test-case model
/// stays self-contained.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub statement: StatementIndex,
    pub kind: AssertionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssertionKind {
    /// Exact equality, for int/bool/bytes/str (spec.md §4.8 phase 1).
    Equals(Value),
    /// Tolerance-approximate equality for floats.
    ApproxEquals(f64, f64),
    /// Structural check: captured type name.
    IsInstance(String),
    /// Structural check: container length.
    LengthEquals(usize),
    /// The wrapped statement is expected to raise an exception of this type.
    ExpectedException(String),
}
