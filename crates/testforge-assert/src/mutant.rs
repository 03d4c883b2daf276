// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Mutant generation: applies [`crate::operators::MutationPatch`]es to a
//! base module, first-order (one patch) and higher-order (a handful of
//! non-overlapping patches composed pairwise, spec.md §3 supplement).

use crate::operators::{self, MutationPatch, Replacement};
use itertools::Itertools;
use testforge_core::RngContext;
use testforge_bytecode::Module;
use std::collections::HashMap;

/// One mutant: the module it produces plus the patches that built it (kept
/// for reporting — which operator(s) a surviving or killed mutant came
/// from).
#[derive(Debug, Clone)]
pub struct Mutant {
    pub module: Module,
    pub patches: Vec<MutationPatch>,
}

impl Mutant {
    pub fn is_higher_order(&self) -> bool {
        self.patches.len() > 1
    }

    pub fn operator_label(&self) -> String {
        self.patches.iter().map(|p| p.operator).join("+")
    }
}

/// Applies `patches` to a clone of `base`, processing same-block patches in
/// descending instruction-index order so a deletion never shifts the index
/// an earlier-processed patch in the same block still needs.
fn apply(base: &Module, patches: &[MutationPatch]) -> Module {
    let mut module = base.clone();
    let mut by_block: HashMap<(u32, u32), Vec<&MutationPatch>> = HashMap::new();
    for p in patches {
        by_block.entry((p.code_object, p.block)).or_default().push(p);
    }
    for ((code_object, block_id), mut group) in by_block {
        group.sort_by(|a, b| b.instruction_index.cmp(&a.instruction_index));
        let Some(code) = module.get_mut(code_object) else { continue };
        let Some(block) = code.blocks.iter_mut().find(|b| b.id == block_id) else { continue };
        for p in group {
            if p.instruction_index >= block.instructions.len() {
                continue;
            }
            match &p.replacement {
                Replacement::Replace(instr) => block.instructions[p.instruction_index] = instr.clone(),
                Replacement::Delete => {
                    block.instructions.remove(p.instruction_index);
                }
            }
        }
    }
    module
}

/// Every first-order mutant the enabled operators can produce against
/// `module` (spec.md §4.8 phase 2 "generate first-order mutants").
pub fn first_order(module: &Module, enabled: &[String]) -> Vec<Mutant> {
    operators::enumerate(module, enabled)
        .into_iter()
        .map(|p| Mutant { module: apply(module, std::slice::from_ref(&p)), patches: vec![p] })
        .collect()
}

/// Composes up to `cap` higher-order mutants from `first_order` by pairing
/// patches whose sites don't overlap, sampling pairs with `rng` rather than
/// taking every `O(n^2)` combination (spec.md §3 supplement "higher-order
/// mutant composition", bounded to keep phase 2 tractable).
pub fn higher_order(module: &Module, first_order: &[Mutant], cap: usize, rng: &RngContext) -> Vec<Mutant> {
    if first_order.len() < 2 || cap == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(cap);
    let mut attempts = 0;
    let max_attempts = cap * 8;
    while out.len() < cap && attempts < max_attempts {
        attempts += 1;
        let i = rng.gen_range(0..first_order.len());
        let j = rng.gen_range(0..first_order.len());
        if i == j {
            continue;
        }
        let (a, b) = (&first_order[i].patches[0], &first_order[j].patches[0]);
        if a.overlaps(b) {
            continue;
        }
        let patches = vec![a.clone(), b.clone()];
        out.push(Mutant { module: apply(module, &patches), patches });
    }
    out
}
