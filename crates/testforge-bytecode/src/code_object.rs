// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::opcode::{BranchKind, CodeObjectId, Instruction, LineId, PredicateId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

pub type BlockId = u32;

/// A basic block has at most two successors (the true/false targets of a
/// conditional jump, or a jump target plus fallthrough), so this stays
/// inline rather than behind a heap allocation.
pub type Successors = SmallVec<[BlockId; 2]>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self { id, instructions: Vec::new() }
    }

    /// The jump targets this block exits to, used to build the CFG edge set.
    /// A block with no explicit jump falls through to `id + 1` (the caller is
    /// responsible for treating the last block specially via `exit_block`).
    pub fn successors(&self, fallthrough: Option<BlockId>) -> Successors {
        match self.instructions.last() {
            Some(Instruction::Jump(target)) => Successors::from_elem(*target, 1),
            Some(Instruction::JumpIfFalse { target, .. }) => {
                let mut v = Successors::from_elem(*target, 1);
                if let Some(ft) = fallthrough {
                    v.push(ft);
                }
                v
            }
            Some(Instruction::Return) | Some(Instruction::Raise(_)) => Successors::new(),
            _ => fallthrough.into_iter().collect(),
        }
    }

    pub fn predicate(&self) -> Option<(PredicateId, BranchKind)> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::JumpIfFalse { predicate, kind, .. } => Some((*predicate, *kind)),
            _ => None,
        })
    }
}

/// A compiled function/method/constructor body: the unit the Instrumenter
/// rewrites and the Tracer executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeObject {
    pub id: CodeObjectId,
    pub name: String,
    pub num_params: u16,
    pub num_locals: u16,
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
    /// Per-block source line, used by the line-coverage adapter; a block with
    /// no entry here has no attributable source line (e.g. synthetic blocks).
    pub block_lines: BTreeMap<BlockId, LineId>,
    /// Lines pragma-excluded from line coverage (spec.md §4.1.2).
    pub excluded_lines: Vec<LineId>,
    /// Set by the instrumenter when this code object could not be
    /// instrumented (e.g. missing line info); excluded from coverage
    /// denominators per spec.md §4.1 Failure model.
    pub skipped: bool,
}

impl CodeObject {
    pub fn new(id: CodeObjectId, name: impl Into<String>, num_params: u16) -> Self {
        Self {
            id,
            name: name.into(),
            num_params,
            num_locals: 0,
            blocks: vec![BasicBlock::new(0)],
            entry: 0,
            block_lines: BTreeMap::new(),
            excluded_lines: Vec::new(),
            skipped: false,
        }
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id as usize]
    }

    /// True when the code object has no conditional jump at all, the
    /// "branchless code object" case from spec.md §4.1 that gets a single
    /// "entered" event instead of per-branch instrumentation.
    pub fn is_branchless(&self) -> bool {
        self.blocks
            .iter()
            .all(|b| b.predicate().is_none())
    }

    pub fn predicates(&self) -> Vec<(PredicateId, BranchKind)> {
        self.blocks.iter().filter_map(|b| b.predicate()).collect()
    }

    pub fn lines(&self) -> Vec<LineId> {
        self.block_lines
            .values()
            .copied()
            .filter(|l| !self.excluded_lines.contains(l))
            .collect()
    }
}
