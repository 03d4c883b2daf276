// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::error::InstrumentError;
use testforge_bytecode::{CodeObject, Instruction};

/// Checked-coverage adapter (spec.md §4.1.3): emits a memory-access event
/// before every load/store of a local, attribute, or subscript so the
/// dynamic slicer can later compute a backward slice from an assertion.
pub struct CheckedCoverageAdapter;

impl Adapter for CheckedCoverageAdapter {
    fn name(&self) -> &'static str {
        "checked-coverage"
    }

    fn apply(&self, code: &mut CodeObject, _ctx: &mut InstrumentContext) -> Result<(), InstrumentError> {
        let mut statement_pos = 0u32;
        for block in &mut code.blocks {
            let mut rewritten = Vec::with_capacity(block.instructions.len());
            for instr in block.instructions.drain(..) {
                let slot = match &instr {
                    Instruction::StoreLocal(s) => Some(*s),
                    Instruction::LoadLocal(s) => Some(*s),
                    Instruction::LoadAttr(s, _) => Some(*s),
                    Instruction::StoreAttr(s, _) => Some(*s),
                    _ => None,
                };
                if let Some(slot) = slot {
                    rewritten.push(Instruction::TrackAccess { statement_pos, slot });
                }
                statement_pos += 1;
                rewritten.push(instr);
            }
            block.instructions = rewritten;
        }
        Ok(())
    }
}
