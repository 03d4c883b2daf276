// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::cluster::CallableCluster;
use crate::factory::Factory;
use crate::rng::RngContext;
use crate::statement::Statement;
use crate::testcase::TestCase;
use testforge_bytecode::Value;

#[derive(Debug, Clone, Copy)]
pub struct MutationConfig {
    pub insert_probability: f64,
    pub delete_probability: f64,
    pub change_probability: f64,
    pub insert_lambda: f64,
    pub max_insert: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self { insert_probability: 0.34, delete_probability: 0.33, change_probability: 0.33, insert_lambda: 0.5, max_insert: 5 }
    }
}

/// Applies the three mutation operators independently, each at its
/// configured probability (spec.md §4.3), then repairs any reference-
/// before-use violation the rewrite introduced.
pub fn mutate(test: &mut TestCase, cluster: &CallableCluster, factory: &Factory, rng: &RngContext, config: &MutationConfig) {
    if rng.gen_bool(config.delete_probability) && !test.is_empty() {
        delete_mutation(test, rng);
    }
    if rng.gen_bool(config.change_probability) && !test.is_empty() {
        change_mutation(test, cluster, rng);
    }
    if rng.gen_bool(config.insert_probability) {
        insert_mutation(test, cluster, factory, rng, config);
    }
    test.repair();
}

fn delete_mutation(test: &mut TestCase, rng: &RngContext) {
    let index = rng.gen_range(0..test.len()) as u32;
    test.delete(index);
}

fn change_mutation(test: &mut TestCase, cluster: &CallableCluster, rng: &RngContext) {
    let index = rng.gen_range(0..test.len());
    let statements = test.statements().to_vec();
    let Some(statement) = statements.get(index) else { return };
    let replaced = match statement {
        Statement::PrimitiveLiteral { value, produces } => Some(Statement::PrimitiveLiteral {
            value: mutate_value(rng, value),
            produces: produces.clone(),
        }),
        Statement::FunctionCall { callable, args, kwargs, produces } => retarget(cluster, rng, callable, args.len())
            .map(|new_callable| Statement::FunctionCall { callable: new_callable, args: args.clone(), kwargs: kwargs.clone(), produces: produces.clone() }),
        Statement::ConstructorCall { callable, args, kwargs, produces } => retarget(cluster, rng, callable, args.len())
            .map(|new_callable| Statement::ConstructorCall { callable: new_callable, args: args.clone(), kwargs: kwargs.clone(), produces: produces.clone() }),
        _ => None,
    };
    if let Some(new_statement) = replaced {
        replace_statement(test, index, new_statement);
    }
}

/// Picks an alternative callable with the same return type and arity as the
/// one being replaced (spec.md §4.3 "re-target a call to an alternative
/// callable of the same return type").
fn retarget(cluster: &CallableCluster, rng: &RngContext, current: &str, arity: usize) -> Option<String> {
    let current_descriptor = cluster.get(current)?;
    let alternatives: Vec<&str> = cluster
        .producers_of(&current_descriptor.return_type)
        .into_iter()
        .filter(|c| c.qualified_name != current && c.arity() == arity)
        .map(|c| c.qualified_name.as_str())
        .collect();
    rng.choose(&alternatives).map(|s| s.to_string())
}

fn replace_statement(test: &mut TestCase, index: usize, statement: Statement) {
    let mut rebuilt = TestCase::new(test.max_length);
    rebuilt.assertions = test.assertions.clone();
    for (i, s) in test.statements().iter().enumerate() {
        let _ = rebuilt.push(if i == index { statement.clone() } else { s.clone() });
    }
    *test = rebuilt;
}

fn insert_mutation(test: &mut TestCase, cluster: &CallableCluster, factory: &Factory, rng: &RngContext, config: &MutationConfig) {
    let count = rng.exponential_decay_count(config.max_insert, config.insert_lambda);
    let names: Vec<String> = cluster.entry_points().map(|c| c.qualified_name.clone()).collect();
    if names.is_empty() {
        return;
    }
    for _ in 0..count {
        if let Some(name) = rng.choose(&names) {
            let _ = factory.synthesize_call(test, name);
        }
    }
}

fn mutate_value(rng: &RngContext, value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(i + rng.gen_i64(-5..=5)),
        Value::Float(f) => Value::Float(f + (rng.gen_f64() - 0.5) * 2.0),
        Value::Bool(b) => Value::Bool(!b),
        Value::Str(s) if !s.is_empty() => {
            let mut chars: Vec<char> = s.chars().collect();
            let i = rng.gen_range(0..chars.len());
            chars[i] = (chars[i] as u8).wrapping_add(1) as char;
            Value::Str(chars.into_iter().collect())
        }
        other => other.clone(),
    }
}
