// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::InstrumentError;
use crate::version::BytecodeVersion;
use std::collections::HashSet;
use testforge_bytecode::{CodeObject, LineId, PredicateId, SeedPool};

/// Mutable state threaded through one adapter chain application, replacing
/// the module-level globals the host instrumenter would otherwise need
/// (spec.md §9 "Global mutable state").
pub struct InstrumentContext<'a> {
    pub version: &'a dyn BytecodeVersion,
    pub seed_pool: &'a SeedPool,
    pub next_predicate: PredicateId,
    pub line_exclusions: &'a HashSet<LineId>,
    /// Code objects with no conditional jump, registered once by the
    /// branch-coverage adapter.
    pub branchless_registered: bool,
}

/// One stage in the five-adapter instrumentation chain described in
/// spec.md §4.1. Each adapter declares, via [`Self::name`], which primitive
/// it implements; composition order is enforced by [`crate::instrumenter::Instrumenter`],
/// not by the adapters themselves.
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrites `code` in place. Adapters never remove instructions that
    /// carry control flow (`Jump`, `JumpIfFalse`, `Return`, `Raise`) — they
    /// only insert stack-neutral markers or substitute call arguments.
    fn apply(&self, code: &mut CodeObject, ctx: &mut InstrumentContext) -> Result<(), InstrumentError>;
}
