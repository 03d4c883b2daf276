// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::rng::RngContext;
use crate::testcase::TestCase;
use crate::types::TypeInfo;
use crate::varref::StatementIndex;
use std::collections::HashMap;

/// Single-point crossover over two test cases (spec.md §4.3): always
/// produces two offspring, each bounded by `max(|p1|, |p2|)`.
pub fn crossover(parent1: &TestCase, parent2: &TestCase, rng: &RngContext) -> (TestCase, TestCase) {
    if parent1.is_empty() || parent2.is_empty() {
        return (parent1.clone(), parent2.clone());
    }
    let r = rng.gen_f64();
    let cut1 = split_point(parent1.len(), r);
    let cut2 = split_point(parent2.len(), r);
    let max_len = parent1.len().max(parent2.len()).max(1);

    let child1 = splice(parent1, cut1, parent2, cut2, max_len);
    let child2 = splice(parent2, cut2, parent1, cut1, max_len);
    (child1, child2)
}

fn split_point(len: usize, r: f64) -> usize {
    (((len.saturating_sub(1)) as f64 * r).floor() as usize + 1).min(len)
}

/// Concatenates `head_parent`'s statements up to `head_cut` with
/// `tail_parent`'s statements from `tail_cut` onward, rebuilding reference
/// tables by structural mapping (spec.md §4.3): a tail statement that
/// referenced something in the *dropped* head of its own parent is remapped
/// to a type-compatible survivor of the new head; if none exists, the
/// statement (and anything depending on it) is discarded.
fn splice(head_parent: &TestCase, head_cut: usize, tail_parent: &TestCase, tail_cut: usize, max_len: usize) -> TestCase {
    let mut child = TestCase::new(max_len.max(head_cut));
    for statement in &head_parent.statements()[..head_cut] {
        let _ = child.push(statement.clone());
    }

    let mut tail_remap: HashMap<StatementIndex, StatementIndex> = HashMap::new();
    for r in 0..tail_cut as StatementIndex {
        if let Some(vref) = tail_parent.reference_at(r) {
            if let Some(candidate) = find_compatible(&child, &vref.type_info) {
                tail_remap.insert(r, candidate);
            }
        }
    }

    for i in tail_cut..tail_parent.len() {
        let i = i as StatementIndex;
        let Some(statement) = tail_parent.statement(i) else { continue };
        if let Some(remapped) = statement.remap(&tail_remap) {
            if let Ok(new_index) = child.push(remapped) {
                tail_remap.insert(i, new_index);
            }
        }
        // Otherwise the statement's dependency chain could not be resolved;
        // it (and anything depending on it) is silently discarded, since no
        // later entry is added to `tail_remap` for `i`.
    }
    child
}

fn find_compatible(child: &TestCase, ty: &TypeInfo) -> Option<StatementIndex> {
    (0..child.len() as StatementIndex)
        .find(|&i| child.reference_at(i).is_some_and(|r| r.type_info.is_compatible_with(ty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Statement;
    use crate::varref::VariableReference;
    use testforge_bytecode::Value;

    fn literal_case(values: &[i64]) -> TestCase {
        let mut tc = TestCase::new(50);
        for &v in values {
            let produces = VariableReference::new(tc.len() as StatementIndex, TypeInfo::concrete("int"));
            tc.push(Statement::PrimitiveLiteral { value: Value::Int(v), produces }).unwrap();
        }
        tc
    }

    #[test]
    fn offspring_satisfy_reference_validity() {
        let p1 = literal_case(&[1, 2, 3, 4]);
        let p2 = literal_case(&[10, 20]);
        let rng = RngContext::from_seed(7);
        let (c1, c2) = crossover(&p1, &p2, &rng);
        for tc in [&c1, &c2] {
            for (i, s) in tc.statements().iter().enumerate() {
                assert!(s.referenced_slots().iter().all(|&r| (r as usize) < i));
            }
            assert!(tc.len() <= p1.len().max(p2.len()));
        }
    }
}
