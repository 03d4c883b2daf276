// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::error::InstrumentError;
use testforge_bytecode::{CodeObject, Instruction, PredicateId};

/// Branch-coverage adapter (spec.md §4.1.1): assigns a stable predicate id to
/// every conditional jump that does not already carry one, and registers
/// branchless code objects with a single "entered" event on their first
/// instruction.
pub struct BranchCoverageAdapter;

impl Adapter for BranchCoverageAdapter {
    fn name(&self) -> &'static str {
        "branch-coverage"
    }

    fn apply(&self, code: &mut CodeObject, ctx: &mut InstrumentContext) -> Result<(), InstrumentError> {
        let mut assigned_any = false;
        for block in &mut code.blocks {
            for instr in &mut block.instructions {
                if let Instruction::JumpIfFalse { predicate, kind, target } = instr {
                    if *predicate == PredicateId::MAX {
                        *predicate = ctx.next_predicate;
                        ctx.next_predicate += 1;
                    }
                    assigned_any = true;
                    let _ = kind;
                    let _ = target;
                }
            }
        }

        if !assigned_any {
            let entry = code.entry;
            code.blocks[entry as usize]
                .instructions
                .insert(0, Instruction::EnteredBranchless(code.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testforge_bytecode::SeedPool;
    use crate::version::V1;
    use std::collections::HashSet;
    use testforge_bytecode::CodeObjectBuilder;

    #[test]
    fn branchless_gets_entered_marker() {
        let mut b = CodeObjectBuilder::new(0, "f", 0);
        b.ret_none();
        let mut code = b.build();
        let seed_pool = SeedPool::new();
        let excl = HashSet::new();
        let version = V1;
        let mut ctx = InstrumentContext {
            version: &version,
            seed_pool: &seed_pool,
            next_predicate: 0,
            line_exclusions: &excl,
            branchless_registered: false,
        };
        BranchCoverageAdapter.apply(&mut code, &mut ctx).unwrap();
        assert!(matches!(
            code.blocks[0].instructions[0],
            Instruction::EnteredBranchless(_)
        ));
    }
}
