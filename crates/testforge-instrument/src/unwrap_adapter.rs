// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::error::InstrumentError;
use testforge_bytecode::{Callee, CodeObject, Instruction};

/// Unwrap adapter (spec.md §4.1.5): for calls into native (non-instrumented)
/// code, inserts an `Unwrap` marker per argument so the interpreter can
/// substitute a transparent proxy value with its underlying value before the
/// call — proxies otherwise leak into native routines that cannot tolerate
/// them. This adapter runs last in the chain (spec.md §9 "Instrumentation
/// chain ordering").
pub struct UnwrapAdapter;

impl Adapter for UnwrapAdapter {
    fn name(&self) -> &'static str {
        "unwrap"
    }

    fn apply(&self, code: &mut CodeObject, _ctx: &mut InstrumentContext) -> Result<(), InstrumentError> {
        for block in &mut code.blocks {
            let mut rewritten = Vec::with_capacity(block.instructions.len());
            for instr in block.instructions.drain(..) {
                if let Instruction::Call { callee: Callee::Native(_), argc } = &instr {
                    for i in 0..*argc {
                        rewritten.push(Instruction::Unwrap { arg_index: i });
                    }
                }
                rewritten.push(instr);
            }
            block.instructions = rewritten;
        }
        Ok(())
    }
}
