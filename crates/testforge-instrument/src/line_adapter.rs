// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::adapter::{Adapter, InstrumentContext};
use crate::error::InstrumentError;
use testforge_bytecode::{CodeObject, Instruction};

/// Line-coverage adapter (spec.md §4.1.2): emits `track_line` at the first
/// instruction of every source line not on the pragma exclusion list.
pub struct LineCoverageAdapter;

impl Adapter for LineCoverageAdapter {
    fn name(&self) -> &'static str {
        "line-coverage"
    }

    fn apply(&self, code: &mut CodeObject, ctx: &mut InstrumentContext) -> Result<(), InstrumentError> {
        let block_lines = code.block_lines.clone();
        for (block_id, line) in block_lines {
            if ctx.line_exclusions.contains(&line) || code.excluded_lines.contains(&line) {
                continue;
            }
            let block = &mut code.blocks[block_id as usize];
            if !matches!(block.instructions.first(), Some(Instruction::TrackLine(_))) {
                block.instructions.insert(0, Instruction::TrackLine(line));
            }
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
    fn inserts_track_line_once_per_block() {
        let mut b = CodeObjectBuilder::new(0, "f", 0);
        b.set_line(3);
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
        LineCoverageAdapter.apply(&mut code, &mut ctx).unwrap();
        assert_eq!(code.blocks[0].instructions[0], Instruction::TrackLine(3));
    }
}
