// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Phase 2 mutation analysis (spec.md §4.8): generate mutants, run the
//! candidate-assertion-bearing suite against each one, and keep only the
//! assertions that actually distinguished a mutant from the original
//! module. What survives is what phase 3 hands to the unparser.

use std::sync::Arc;

use rayon::prelude::*;
use testforge_bytecode::{Module, Value};
use testforge_core::assertion::{Assertion, AssertionKind};
use testforge_core::{CallableCluster, Evaluator, RngContext, TestSuite};
use testforge_trace::{NativeRegistry, TracerConfig};

use crate::error::AssertError;
use crate::mutant::{self, Mutant};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    pub higher_order_cap: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { higher_order_cap: 20 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MutationReport {
    pub mutants_total: usize,
    pub mutants_killed: usize,
    /// Mutants whose replay hit the per-statement/per-test timeout on some
    /// assertion-bearing statement — excluded from both the numerator and
    /// denominator of [`Self::score`] (spec.md §4.8 "mutation score
    /// `killed / (created − timed_out)`").
    pub mutants_timed_out: usize,
}

impl MutationReport {
    /// `None` when no judgeable mutant exists at all (an empty callable
    /// surface, every operator disabled, or every generated mutant timed
    /// out) — distinguished from a real `0.0` score, per spec.md §9's open
    /// question on this: with no mutants to judge by, every candidate
    /// assertion is kept unpruned rather than treated as having failed to
    /// kill anything.
    pub fn score(&self) -> Option<f64> {
        let judged = self.mutants_total - self.mutants_timed_out;
        if judged == 0 {
            None
        } else {
            Some(self.mutants_killed as f64 / judged as f64)
        }
    }
}

/// Runs phase 2 in place: prunes every test's `assertions` down to the ones
/// that killed at least one mutant, and returns the mutation-score inputs
/// for [`testforge_core::RunStatistics`].
#[allow(clippy::too_many_arguments)]
pub fn analyze(
    suite: &mut TestSuite,
    cluster: &CallableCluster,
    base_module: &Module,
    natives: Arc<NativeRegistry>,
    tracer_config: TracerConfig,
    rng: &RngContext,
    mutation_operators: &[String],
    config: &AnalysisConfig,
) -> Result<MutationReport, AssertError> {
    let first = mutant::first_order(base_module, mutation_operators);
    let higher = mutant::higher_order(base_module, &first, config.higher_order_cap, rng);
    let mutants: Vec<Mutant> = first.into_iter().chain(higher).collect();

    if mutants.is_empty() {
        return Ok(MutationReport::default());
    }

    // (test index, statement position) pairs where some mutant's observed
    // outcome disagreed with the candidate assertion recorded there, plus
    // whether replaying this mutant hit a per-statement/per-test timeout on
    // any assertion-bearing statement (spec.md §4.8 "mutation score
    // `killed / (created − timed_out)`" — a timed-out mutant is judged
    // neither killed nor surviving).
    let kills: Vec<(usize, bool, Vec<(usize, u32)>)> = mutants
        .par_iter()
        .enumerate()
        .map(|(mutant_idx, mutant)| {
            let evaluator = Evaluator::new(cluster, Arc::new(mutant.module.clone()), natives.clone(), tracer_config);
            let mut killed_by: Vec<(usize, u32)> = Vec::new();
            let mut timed_out = false;
            for (test_idx, test) in suite.tests.iter().enumerate() {
                let trace = match evaluator.run(test) {
                    Ok(trace) => trace,
                    Err(_) => {
                        for a in &test.assertions {
                            killed_by.push((test_idx, a.statement));
                        }
                        continue;
                    }
                };
                for a in &test.assertions {
                    let outcome = trace.statements.iter().find(|s| s.statement_pos == a.statement);
                    if outcome.is_some_and(|o| o.timed_out) {
                        timed_out = true;
                        continue;
                    }
                    let observed = outcome.map(|s| &s.result);
                    let survives = match observed {
                        Some(result) => holds(&a.kind, result),
                        None => false,
                    };
                    if !survives {
                        killed_by.push((test_idx, a.statement));
                    }
                }
            }
            (mutant_idx, timed_out, killed_by)
        })
        .collect();

    let mutants_timed_out = kills.iter().filter(|(_, timed_out, _)| *timed_out).count();
    let mutants_killed = kills.iter().filter(|(_, timed_out, killed_by)| !*timed_out && !killed_by.is_empty()).count();
    let mut useful: std::collections::HashSet<(usize, u32)> = std::collections::HashSet::new();
    for (_, timed_out, killed_by) in &kills {
        if !*timed_out {
            useful.extend(killed_by.iter().copied());
        }
    }

    for (test_idx, test) in suite.tests.iter_mut().enumerate() {
        test.assertions.retain(|a: &Assertion| useful.contains(&(test_idx, a.statement)));
    }

    Ok(MutationReport { mutants_total: mutants.len(), mutants_killed, mutants_timed_out })
}

/// True when `result` still matches `kind` — i.e. this mutant did not kill
/// the assertion at this statement.
fn holds(kind: &AssertionKind, result: &Result<Value, String>) -> bool {
    match (kind, result) {
        (AssertionKind::Equals(expected), Ok(actual)) => expected == actual,
        (AssertionKind::ApproxEquals(expected, tolerance), Ok(Value::Float(actual))) => (expected - actual).abs() <= *tolerance,
        (AssertionKind::IsInstance(name), Ok(actual)) => actual.type_name() == name,
        (AssertionKind::LengthEquals(len), Ok(actual)) => actual.len() == Some(*len),
        (AssertionKind::ExpectedException(name), Err(actual)) => actual == name,
        _ => false,
    }
}
