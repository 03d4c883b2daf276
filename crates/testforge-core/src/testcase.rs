// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::assertion::Assertion;
use crate::error::CoreError;
use crate::statement::Statement;
use crate::varref::{StatementIndex, VariableReference};
use std::collections::{HashMap, HashSet};

/// Finite ordered sequence of statements (spec.md §3 "Test case"). Statements
/// live in a flat arena and refer to each other by index rather than by
/// pointer (spec.md §9 "Cyclic reference graphs"), so cloning is just
/// `Vec::clone` and structural equality is a positional walk rather than a
/// graph traversal with a visited-set.
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    statements: Vec<Statement>,
    pub assertions: Vec<Assertion>,
    pub max_length: usize,
}

impl TestCase {
    pub fn new(max_length: usize) -> Self {
        Self { statements: Vec::new(), assertions: Vec::new(), max_length }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, index: StatementIndex) -> Option<&Statement> {
        self.statements.get(index as usize)
    }

    /// Appends a statement, validating reference-before-use (spec.md §3
    /// invariant ii) before committing it to the arena.
    pub fn push(&mut self, statement: Statement) -> Result<StatementIndex, CoreError> {
        let next_index = self.statements.len() as StatementIndex;
        for referenced in statement.referenced_slots() {
            if referenced >= next_index {
                return Err(CoreError::DanglingReference { statement: next_index, referenced });
            }
        }
        self.statements.push(statement);
        if self.statements.len() > self.max_length {
            self.chop(self.max_length);
        }
        Ok(next_index)
    }

    /// Produced variable reference of the statement at `index`, the handle
    /// other statements argue over (spec.md §3 "Variable reference").
    pub fn reference_at(&self, index: StatementIndex) -> Option<&VariableReference> {
        self.statements.get(index as usize).and_then(Statement::produces)
    }

    /// Truncates to `length` statements, dropping all dependents — any
    /// statement beyond the cut and any assertion that names them (spec.md
    /// §3 invariant iv "chopping"). The remaining reference graph is closed
    /// by construction since every surviving statement only ever referenced
    /// earlier, now still-present, positions.
    pub fn chop(&mut self, length: usize) {
        if length >= self.statements.len() {
            return;
        }
        self.statements.truncate(length);
        self.assertions.retain(|a| (a.statement as usize) < length);
    }

    /// Removes the statement at `index` and every statement that
    /// transitively references it (spec.md §4.3 "Delete"), remapping the
    /// survivors' arena indices down so the sequence stays contiguous.
    pub fn delete(&mut self, index: StatementIndex) {
        let mut drop_set: HashSet<StatementIndex> = HashSet::new();
        drop_set.insert(index);
        let mut changed = true;
        while changed {
            changed = false;
            for (i, s) in self.statements.iter().enumerate() {
                let i = i as StatementIndex;
                if drop_set.contains(&i) {
                    continue;
                }
                if s.referenced_slots().iter().any(|r| drop_set.contains(r)) {
                    drop_set.insert(i);
                    changed = true;
                }
            }
        }
        self.remove_set(&drop_set);
    }

    fn remove_set(&mut self, drop_set: &HashSet<StatementIndex>) {
        let mut remap: HashMap<StatementIndex, StatementIndex> = HashMap::new();
        let mut kept = Vec::with_capacity(self.statements.len());
        let mut new_index: StatementIndex = 0;
        for (i, s) in self.statements.iter().enumerate() {
            let i = i as StatementIndex;
            if drop_set.contains(&i) {
                continue;
            }
            remap.insert(i, new_index);
            kept.push(s.clone());
            new_index += 1;
        }
        self.statements = kept.iter().filter_map(|s| s.remap(&remap)).collect();
        self.assertions.retain(|a| !drop_set.contains(&a.statement));
        for a in &mut self.assertions {
            if let Some(&new_pos) = remap.get(&a.statement) {
                a.statement = new_pos;
            }
        }
    }

    /// Drops any statement whose referenced slots are no longer present —
    /// the repair pass mutation and crossover run after rewriting the arena
    /// (spec.md §4.3 "After mutation, enforce the reference-before-use
    /// invariant; if violated, drop the offending statements").
    pub fn repair(&mut self) {
        loop {
            let invalid: HashSet<StatementIndex> = self
                .statements
                .iter()
                .enumerate()
                .filter_map(|(i, s)| {
                    let i = i as StatementIndex;
                    let bad = s.referenced_slots().iter().any(|&r| r >= i || r as usize >= self.statements.len());
                    bad.then_some(i)
                })
                .collect();
            if invalid.is_empty() {
                break;
            }
            self.remove_set(&invalid);
        }
    }

    /// Structural equality (spec.md §3): same statement shape at each
    /// position and the same reference graph, ignoring object identity and
    /// the type info carried by each produced reference (that is inferred
    /// data, not shape).
    pub fn structurally_equals(&self, other: &TestCase) -> bool {
        self.statements.len() == other.statements.len()
            && self.statements.iter().zip(&other.statements).all(|(a, b)| shape_eq(a, b))
    }
}

impl PartialEq for TestCase {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equals(other)
    }
}

fn shape_eq(a: &Statement, b: &Statement) -> bool {
    use Statement::*;
    match (a, b) {
        (PrimitiveLiteral { value: v1, .. }, PrimitiveLiteral { value: v2, .. }) => v1 == v2,
        (CollectionLiteral { items: i1, .. }, CollectionLiteral { items: i2, .. }) => i1 == i2,
        (
            ConstructorCall { callable: c1, args: a1, kwargs: k1, .. },
            ConstructorCall { callable: c2, args: a2, kwargs: k2, .. },
        )
        | (
            FunctionCall { callable: c1, args: a1, kwargs: k1, .. },
            FunctionCall { callable: c2, args: a2, kwargs: k2, .. },
        ) => c1 == c2 && a1 == a2 && k1 == k2,
        (
            MethodCall { receiver: r1, callable: c1, args: a1, kwargs: k1, .. },
            MethodCall { receiver: r2, callable: c2, args: a2, kwargs: k2, .. },
        ) => r1 == r2 && c1 == c2 && a1 == a2 && k1 == k2,
        (FieldRead { receiver: r1, field: f1, .. }, FieldRead { receiver: r2, field: f2, .. }) => {
            r1 == r2 && f1 == f2
        }
        (
            FieldWrite { receiver: r1, field: f1, value: v1 },
            FieldWrite { receiver: r2, field: f2, value: v2 },
        ) => r1 == r2 && f1 == f2 && v1 == v2,
        (Assignment { source: s1, .. }, Assignment { source: s2, .. }) => s1 == s2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testforge_bytecode::Value;

    fn literal(v: i64) -> Statement {
        Statement::PrimitiveLiteral {
            value: Value::Int(v),
            produces: VariableReference::new(0, crate::types::TypeInfo::concrete("int")),
        }
    }

    #[test]
    fn push_rejects_forward_reference() {
        let mut tc = TestCase::new(10);
        let bad = Statement::Assignment {
            source: 0,
            produces: VariableReference::new(0, crate::types::TypeInfo::Any),
        };
        assert!(tc.push(bad).is_err());
    }

    #[test]
    fn chop_drops_dependents_and_stays_closed() {
        let mut tc = TestCase::new(10);
        tc.push(literal(1)).unwrap();
        tc.push(Statement::Assignment {
            source: 0,
            produces: VariableReference::new(1, crate::types::TypeInfo::concrete("int")),
        })
        .unwrap();
        tc.chop(1);
        assert_eq!(tc.len(), 1);
        for s in tc.statements() {
            assert!(s.referenced_slots().iter().all(|&r| (r as usize) < tc.len()));
        }
    }

    #[test]
    fn clone_is_structurally_equal() {
        let mut tc = TestCase::new(10);
        tc.push(literal(7)).unwrap();
        let cloned = tc.clone();
        assert!(tc.structurally_equals(&cloned));
    }
}
