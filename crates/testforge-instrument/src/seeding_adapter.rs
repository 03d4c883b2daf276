// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::error::InstrumentError;
use testforge_bytecode::{CompareKind, Instruction, Value};

/// Dynamic-seeding adapter (spec.md §4.1.4): inserts a `Seed` marker right
/// before a comparison-driven predicate so the interpreter can, at runtime,
/// capture the literal operand(s) into the global constant pool used to
/// seed primitive generation. Only constant operands are worth seeding — a
/// seed mirroring a variable reference carries no new information.
pub struct SeedingAdapter;

impl Adapter for SeedingAdapter {
    fn name(&self) -> &'static str {
        "dynamic-seeding"
    }

    fn apply(&self, code: &mut testforge_bytecode::CodeObject, _ctx: &mut InstrumentContext) -> Result<(), InstrumentError> {
        for block in &mut code.blocks {
            let mut rewritten = Vec::with_capacity(block.instructions.len());
            let mut pending_const: Option<Value> = None;
            for instr in block.instructions.drain(..) {
                if let Instruction::LoadConst(v) = &instr {
                    pending_const = Some(v.clone());
                }
                let should_seed = matches!(
                    &instr,
                    Instruction::JumpIfFalse { kind: testforge_bytecode::BranchKind::Compare(
                        CompareKind::Eq | CompareKind::Ne | CompareKind::Lt | CompareKind::Le | CompareKind::Gt | CompareKind::Ge
                    ), .. }
                );
                if should_seed {
                    if let Some(v) = pending_const.take() {
                        rewritten.push(Instruction::Seed(v));
                    }
                }
                if !matches!(instr, Instruction::LoadConst(_)) {
                    pending_const = None;
                }
                rewritten.push(instr);
            }
            block.instructions = rewritten;
        }
        Ok(())
    }
}
