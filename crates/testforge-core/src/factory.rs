// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::cluster::CallableCluster;
use crate::error::CoreError;
use crate::rng::RngContext;
use crate::statement::{ArgList, Statement};
use crate::testcase::TestCase;
use crate::types::{CallableKind, TypeInfo};
use crate::varref::{StatementIndex, VariableReference};
use indexmap::IndexMap;
use testforge_bytecode::{SeedPool, Value};

/// Ratio of the three primitive-value pools the factory draws from
/// (spec.md §4.3): fresh random literal, a value harvested by the dynamic-
/// seeding adapter, or a small mutation of a seed value. Values need not sum
/// to exactly 1; they are normalized at draw time.
#[derive(Debug, Clone, Copy)]
pub struct PrimitivePoolWeights {
    pub random: f64,
    pub seeded: f64,
    pub seed_mutation: f64,
}

impl Default for PrimitivePoolWeights {
    fn default() -> Self {
        Self { random: 0.5, seeded: 0.3, seed_mutation: 0.2 }
    }
}

/// Synthesizes statements conforming to a target callable's signature by
/// back-chaining (spec.md §4.3): for each parameter, either reuse an
/// existing in-scope reference of a compatible type, or recursively
/// synthesize a new value.
pub struct Factory<'a> {
    cluster: &'a CallableCluster,
    rng: RngContext,
    seed_pool: SeedPool,
    weights: PrimitivePoolWeights,
    max_recursion: usize,
}

impl<'a> Factory<'a> {
    pub fn new(cluster: &'a CallableCluster, rng: RngContext, seed_pool: SeedPool, weights: PrimitivePoolWeights) -> Self {
        Self { cluster, rng, seed_pool, weights, max_recursion: 6 }
    }

    /// The pool this factory draws seeded/seed-mutation primitives from.
    /// Shared (via `SeedPool`'s internal `Arc`) with whatever harvests
    /// runtime-observed constants back into it — see [`crate::ga::run_batch`].
    pub fn seed_pool(&self) -> &SeedPool {
        &self.seed_pool
    }

    /// Appends a full call to `callable` (synthesizing or reusing every
    /// argument) and returns the arena index of the new call statement.
    pub fn synthesize_call(&self, test: &mut TestCase, callable_name: &str) -> Result<StatementIndex, CoreError> {
        let callable = self.cluster.get(callable_name).ok_or(CoreError::NoMatchingCallable)?.clone();
        let mut args = ArgList::with_capacity(callable.params.len());
        for (_, ty) in &callable.params {
            args.push(self.resolve_argument(test, ty, self.max_recursion)?);
        }
        let statement = match callable.kind {
            CallableKind::Constructor => Statement::ConstructorCall {
                callable: callable.qualified_name.clone(),
                args,
                kwargs: IndexMap::new(),
                produces: VariableReference::new(test.len() as StatementIndex, callable.return_type.clone()),
            },
            CallableKind::Method => {
                let receiver = args.first().copied().ok_or(CoreError::NoMatchingCallable)?;
                Statement::MethodCall {
                    receiver,
                    callable: callable.qualified_name.clone(),
                    args: args.into_iter().skip(1).collect(),
                    kwargs: IndexMap::new(),
                    produces: VariableReference::new(test.len() as StatementIndex, callable.return_type.clone()),
                }
            }
            CallableKind::Function => Statement::FunctionCall {
                callable: callable.qualified_name.clone(),
                args,
                kwargs: IndexMap::new(),
                produces: VariableReference::new(test.len() as StatementIndex, callable.return_type.clone()),
            },
            CallableKind::FieldRead | CallableKind::FieldWrite => {
                return Err(CoreError::NoMatchingCallable);
            }
        };
        test.push(statement)
    }

    /// Back-chains one parameter: reuse an in-scope reference if a
    /// compatible one already exists (with some probability, to keep
    /// sequences from ballooning), else synthesize fresh.
    fn resolve_argument(&self, test: &mut TestCase, ty: &TypeInfo, budget: usize) -> Result<StatementIndex, CoreError> {
        let candidates: Vec<StatementIndex> = (0..test.len() as StatementIndex)
            .filter(|&i| test.reference_at(i).is_some_and(|r| r.type_info.is_compatible_with(ty)))
            .collect();
        if !candidates.is_empty() && self.rng.gen_bool(0.5) {
            if let Some(&chosen) = self.rng.choose(&candidates) {
                return Ok(chosen);
            }
        }
        self.synthesize_value(test, ty, budget)
    }

    fn synthesize_value(&self, test: &mut TestCase, ty: &TypeInfo, budget: usize) -> Result<StatementIndex, CoreError> {
        if let TypeInfo::Concrete(name) = ty {
            if is_primitive(name) {
                let value = self.draw_primitive(name);
                let produces = VariableReference::new(test.len() as StatementIndex, ty.clone());
                return test.push(Statement::PrimitiveLiteral { value, produces });
            }
        }
        if budget == 0 {
            let produces = VariableReference::new(test.len() as StatementIndex, TypeInfo::None);
            return test.push(Statement::PrimitiveLiteral { value: Value::None, produces });
        }
        let producers = self.cluster.producers_of(ty);
        let callable = self.rng.choose(&producers).ok_or(CoreError::NoMatchingCallable)?.qualified_name.clone();
        let mut args = ArgList::new();
        let params = self.cluster.get(&callable).ok_or(CoreError::NoMatchingCallable)?.params.clone();
        for (_, param_ty) in &params {
            args.push(self.resolve_argument(test, param_ty, budget - 1)?);
        }
        let produces = VariableReference::new(test.len() as StatementIndex, ty.clone());
        test.push(Statement::ConstructorCall { callable, args, kwargs: IndexMap::new(), produces })
    }

    fn draw_primitive(&self, type_name: &str) -> Value {
        let total = self.weights.random + self.weights.seeded + self.weights.seed_mutation;
        let roll = self.rng.gen_f64() * total;
        if roll < self.weights.random || self.seed_pool.is_empty() {
            return random_primitive(&self.rng, type_name);
        }
        let seeds = self.seed_pool.snapshot();
        let seed = seeds.iter().find(|v| v.type_name() == type_name).cloned();
        match seed {
            Some(value) if roll < self.weights.random + self.weights.seeded => value,
            Some(value) => mutate_primitive(&self.rng, &value),
            None => random_primitive(&self.rng, type_name),
        }
    }
}

fn is_primitive(type_name: &str) -> bool {
    matches!(type_name, "int" | "float" | "bool" | "str" | "bytes")
}

fn random_primitive(rng: &RngContext, type_name: &str) -> Value {
    match type_name {
        "int" => Value::Int(rng.gen_i64(-100..=100)),
        "float" => Value::Float(rng.gen_f64() * 200.0 - 100.0),
        "bool" => Value::Bool(rng.gen_bool(0.5)),
        "bytes" => Value::Bytes(vec![rng.gen_i64(0..=255) as u8]),
        _ => Value::Str(random_string(rng)),
    }
}

fn random_string(rng: &RngContext) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFG0123456789_";
    let len = rng.gen_range(0..8);
    (0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
}

fn mutate_primitive(rng: &RngContext, value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(i + rng.gen_i64(-5..=5)),
        Value::Float(f) => Value::Float(f + (rng.gen_f64() - 0.5) * 2.0),
        Value::Bool(b) => Value::Bool(!b),
        Value::Str(s) => {
            let mut chars: Vec<char> = s.chars().collect();
            if chars.is_empty() {
                return Value::Str(random_string(rng));
            }
            let i = rng.gen_range(0..chars.len());
            chars[i] = (chars[i] as u8).wrapping_add(1) as char;
            Value::Str(chars.into_iter().collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallableKind, TypeInfo, Visibility};

    #[test]
    fn synthesizes_primitive_only_call() {
        let mut cluster = CallableCluster::new();
        cluster.register(crate::types::CallableDescriptor {
            qualified_name: "pkg.safe_div".into(),
            kind: CallableKind::Function,
            params: vec![("a".into(), TypeInfo::concrete("int")), ("b".into(), TypeInfo::concrete("int"))],
            return_type: TypeInfo::concrete("float"),
            owning_type: None,
            visibility: Visibility::Public,
            code_object: 0,
        });
        let factory = Factory::new(&cluster, RngContext::from_seed(1), SeedPool::new(), PrimitivePoolWeights::default());
        let mut tc = TestCase::new(50);
        let idx = factory.synthesize_call(&mut tc, "pkg.safe_div").unwrap();
        assert_eq!(idx as usize, tc.len() - 1);
        assert!(tc.len() >= 3);
    }
}
