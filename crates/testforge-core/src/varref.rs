// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::types::TypeInfo;
use std::hash::{Hash, Hasher};

/// Index into a [`crate::testcase::TestCase`]'s statement arena (spec.md §9
/// "Cyclic reference graphs": statements refer to arguments by arena index,
/// not by pointer, so the arena itself owns the only real allocation).
pub type StatementIndex = u32;

/// A handle into a test case (spec.md §3 "Variable reference"): identified
/// by the arena index of the statement that produced it ("object identity"
/// translated to this crate's arena-of-statements representation), carrying
/// a type that may be refined once real runtime values are observed.
/// Two references compare equal only when they name the same arena slot —
/// never by the type they carry — matching the spec's "no hash/equality by
/// value" rule. Cross-case comparison (crossover) instead compares
/// `index` values directly, i.e. structural position, since both parents'
/// arenas are indexed the same way.
#[derive(Debug, Clone)]
pub struct VariableReference {
    pub index: StatementIndex,
    pub type_info: TypeInfo,
}

impl VariableReference {
    pub fn new(index: StatementIndex, type_info: TypeInfo) -> Self {
        Self { index, type_info }
    }

    /// Narrows the carried type once a concrete runtime value is observed
    /// (spec.md §3: "tagged with an inferred type that may be refined during
    /// execution").
    pub fn refine(&mut self, observed: TypeInfo) {
        self.type_info = observed;
    }
}

impl PartialEq for VariableReference {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl Eq for VariableReference {}

impl Hash for VariableReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}
