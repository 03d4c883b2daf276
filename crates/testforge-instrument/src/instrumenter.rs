// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::branch_adapter::BranchCoverageAdapter;
use crate::checked_adapter::CheckedCoverageAdapter;
use crate::error::InstrumentError;
use crate::line_adapter::LineCoverageAdapter;
use crate::module_finder::ModuleFinder;
use crate::seeding_adapter::SeedingAdapter;
use crate::unwrap_adapter::UnwrapAdapter;
use crate::version::BytecodeVersion;
use std::collections::HashSet;
use testforge_bytecode::{CodeObjectId, LineId, Module, PredicateId, SeedPool};
use tracing::{debug, warn};

/// Outcome of instrumenting one code object: either fully instrumented, or
/// skipped (missing line info, or any other non-fatal defect) and therefore
/// excluded from coverage denominators, per spec.md §4.1 Failure model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentationOutcome {
    Instrumented,
    Skipped,
}

#[derive(Debug, Default)]
pub struct InstrumentationStats {
    pub instrumented_code_objects: usize,
    pub skipped_code_objects: usize,
    pub predicates_registered: PredicateId,
    pub lines_registered: usize,
}

/// Rewrites a module's bytecode at "import time", module by module, as
/// specified in spec.md §4.1. The chain ordering
/// `[branch, line, checked] -> seeding -> unwrap` is fixed and documented:
/// coverage adapters run first so the seeding adapter can see already-
/// tagged predicates, and the unwrap adapter runs last so it only ever
/// rewrites calls that survive the coverage/seeding passes unchanged.
pub struct Instrumenter<'a> {
    version: &'a dyn BytecodeVersion,
    module_finder: &'a dyn ModuleFinder,
    seed_pool: SeedPool,
    line_exclusions: HashSet<LineId>,
}

impl<'a> Instrumenter<'a> {
    pub fn new(version: &'a dyn BytecodeVersion, module_finder: &'a dyn ModuleFinder) -> Self {
        Self { version, module_finder, seed_pool: SeedPool::new(), line_exclusions: HashSet::new() }
    }

    pub fn with_line_exclusions(mut self, lines: impl IntoIterator<Item = LineId>) -> Self {
        self.line_exclusions = lines.into_iter().collect();
        self
    }

    pub fn seed_pool(&self) -> &SeedPool {
        &self.seed_pool
    }

    /// Instruments every code object in `module`, recursing implicitly since
    /// nested code objects are already flattened into `Module::code_objects`
    /// by construction. Returns per-code-object outcomes and aggregate
    /// stats; a fatal error aborts the whole run.
    pub fn instrument(&self, module: &mut Module) -> Result<InstrumentationStats, InstrumentError> {
        let full_chain: Vec<Box<dyn Adapter>> = vec![
            Box::new(BranchCoverageAdapter),
            Box::new(LineCoverageAdapter),
            Box::new(CheckedCoverageAdapter),
            Box::new(SeedingAdapter),
            Box::new(UnwrapAdapter),
        ];
        let unwrap_only: Vec<Box<dyn Adapter>> = vec![Box::new(UnwrapAdapter)];

        let is_first_party = self.module_finder.is_first_party(&module.qualified_name);
        let chain: &[Box<dyn Adapter>] = if is_first_party { &full_chain } else { &unwrap_only };

        let mut stats = InstrumentationStats::default();
        let mut next_predicate: PredicateId = 0;

        let ids: Vec<CodeObjectId> = module.code_objects.keys().copied().collect();
        for id in ids {
            let code = module.get_mut(id).expect("id came from the map's own keys");
            if code.block_lines.is_empty() && !code.blocks.is_empty() {
                warn!(code_object = id, "no line information available; skipping");
                code.skipped = true;
                stats.skipped_code_objects += 1;
                continue;
            }

            let mut ctx = InstrumentContext {
                version: self.version,
                seed_pool: &self.seed_pool,
                next_predicate,
                line_exclusions: &self.line_exclusions,
                branchless_registered: false,
            };

            for adapter in chain {
                debug!(code_object = id, adapter = adapter.name(), "applying instrumentation adapter");
                adapter.apply(code, &mut ctx)?;
            }

            for block in &code.blocks {
                for instr in &block.instructions {
                    if instr.is_marker() && instr.stack_effect() != 0 {
                        return Err(InstrumentError::StackImbalance(id, instr.stack_effect()));
                    }
                }
            }

            next_predicate = ctx.next_predicate;
            stats.instrumented_code_objects += 1;
            stats.lines_registered += code.lines().len();
        }
        stats.predicates_registered = next_predicate;
        Ok(stats)
    }
}
