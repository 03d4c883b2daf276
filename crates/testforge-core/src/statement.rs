// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::varref::{StatementIndex, VariableReference};
use indexmap::IndexMap;
use smallvec::SmallVec;
use testforge_bytecode::Value;

/// Most calls take few arguments, so the argument list lives inline rather
/// than behind a heap allocation for the common case (spec.md §9's arena-
/// index strategy already avoids pointer cycles; this just avoids the
/// extra indirection for the overwhelmingly common 0-4-argument call).
pub type ArgList = SmallVec<[StatementIndex; 4]>;

/// One statement of a test case (spec.md §3): a sealed family of variants
/// with explicit discriminators (spec.md §9 "Dynamic typing -> tagged sum
/// types"). Argument and receiver positions name earlier arena slots by
/// [`StatementIndex`], never by pointer, so the whole test case can be
/// cloned by copying the arena `Vec` (spec.md §9 "Cyclic reference graphs").
#[derive(Debug, Clone)]
pub enum Statement {
    PrimitiveLiteral { value: Value, produces: VariableReference },
    CollectionLiteral { items: Vec<StatementIndex>, produces: VariableReference },
    ConstructorCall { callable: String, args: ArgList, kwargs: IndexMap<String, StatementIndex>, produces: VariableReference },
    FunctionCall { callable: String, args: ArgList, kwargs: IndexMap<String, StatementIndex>, produces: VariableReference },
    MethodCall { receiver: StatementIndex, callable: String, args: ArgList, kwargs: IndexMap<String, StatementIndex>, produces: VariableReference },
    FieldRead { receiver: StatementIndex, field: String, produces: VariableReference },
    FieldWrite { receiver: StatementIndex, field: String, value: StatementIndex },
    Assignment { source: StatementIndex, produces: VariableReference },
}

impl Statement {
    /// The variable reference this statement owns, if it produces one.
    /// `FieldWrite` produces nothing, matching the spec's "each statement
    /// *that produces a value* owns a single variable reference".
    pub fn produces(&self) -> Option<&VariableReference> {
        match self {
            Statement::PrimitiveLiteral { produces, .. }
            | Statement::CollectionLiteral { produces, .. }
            | Statement::ConstructorCall { produces, .. }
            | Statement::FunctionCall { produces, .. }
            | Statement::MethodCall { produces, .. }
            | Statement::FieldRead { produces, .. }
            | Statement::Assignment { produces, .. } => Some(produces),
            Statement::FieldWrite { .. } => None,
        }
    }

    pub fn produces_mut(&mut self) -> Option<&mut VariableReference> {
        match self {
            Statement::PrimitiveLiteral { produces, .. }
            | Statement::CollectionLiteral { produces, .. }
            | Statement::ConstructorCall { produces, .. }
            | Statement::FunctionCall { produces, .. }
            | Statement::MethodCall { produces, .. }
            | Statement::FieldRead { produces, .. }
            | Statement::Assignment { produces, .. } => Some(produces),
            Statement::FieldWrite { .. } => None,
        }
    }

    /// Every arena slot this statement reads, in the order the
    /// reference-before-use invariant must hold over (spec.md §3 invariant
    /// ii). Used by chopping, mutation, and crossover to find and repair
    /// dangling references.
    pub fn referenced_slots(&self) -> Vec<StatementIndex> {
        match self {
            Statement::PrimitiveLiteral { .. } => vec![],
            Statement::CollectionLiteral { items, .. } => items.clone(),
            Statement::ConstructorCall { args, kwargs, .. } | Statement::FunctionCall { args, kwargs, .. } => {
                args.iter().copied().chain(kwargs.values().copied()).collect()
            }
            Statement::MethodCall { receiver, args, kwargs, .. } => std::iter::once(*receiver)
                .chain(args.iter().copied())
                .chain(kwargs.values().copied())
                .collect(),
            Statement::FieldRead { receiver, .. } => vec![*receiver],
            Statement::FieldWrite { receiver, value, .. } => vec![*receiver, *value],
            Statement::Assignment { source, .. } => vec![*source],
        }
    }

    pub fn callable_name(&self) -> Option<&str> {
        match self {
            Statement::ConstructorCall { callable, .. }
            | Statement::FunctionCall { callable, .. }
            | Statement::MethodCall { callable, .. } => Some(callable),
            _ => None,
        }
    }

    /// Rewrites every referenced slot through `remap`, dropping the
    /// statement (returning `None`) if any referenced slot has no entry —
    /// the rewrite primitive chopping, crossover, and deletion all share.
    pub fn remap(&self, remap: &std::collections::HashMap<StatementIndex, StatementIndex>) -> Option<Statement> {
        let get = |i: &StatementIndex| remap.get(i).copied();
        Some(match self.clone() {
            s @ Statement::PrimitiveLiteral { .. } => s,
            Statement::CollectionLiteral { items, produces } => {
                Statement::CollectionLiteral { items: items.iter().map(get).collect::<Option<_>>()?, produces }
            }
            Statement::ConstructorCall { callable, args, kwargs, produces } => Statement::ConstructorCall {
                callable,
                args: args.iter().map(get).collect::<Option<_>>()?,
                kwargs: kwargs.iter().map(|(k, v)| get(v).map(|v| (k.clone(), v))).collect::<Option<_>>()?,
                produces,
            },
            Statement::FunctionCall { callable, args, kwargs, produces } => Statement::FunctionCall {
                callable,
                args: args.iter().map(get).collect::<Option<_>>()?,
                kwargs: kwargs.iter().map(|(k, v)| get(v).map(|v| (k.clone(), v))).collect::<Option<_>>()?,
                produces,
            },
            Statement::MethodCall { receiver, callable, args, kwargs, produces } => Statement::MethodCall {
                receiver: get(&receiver)?,
                callable,
                args: args.iter().map(get).collect::<Option<_>>()?,
                kwargs: kwargs.iter().map(|(k, v)| get(v).map(|v| (k.clone(), v))).collect::<Option<_>>()?,
                produces,
            },
            Statement::FieldRead { receiver, field, produces } => {
                Statement::FieldRead { receiver: get(&receiver)?, field, produces }
            }
            Statement::FieldWrite { receiver, field, value } => {
                Statement::FieldWrite { receiver: get(&receiver)?, field, value: get(&value)? }
            }
            Statement::Assignment { source, produces } => Statement::Assignment { source: get(&source)?, produces },
        })
    }
}
