// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Whole-Suite GA (spec.md §4.6): a single-objective chromosome — the test
//! suite itself — scored by summed per-goal minimum fitness across its
//! constituent tests, with elitist sort-and-truncate survivor selection.

use crate::batch::BatchTransport;
use crate::cluster::CallableCluster;
use crate::config::GeneratorConfig;
use crate::crossover::crossover;
use crate::factory::Factory;
use crate::fitness::{goal_fitness, CheckedCoverage, ProgramGraphs};
use crate::ga::{random_test_case, run_batch, static_goal_universe, GaOutcome, IterationEvent, IterationObserver};
use crate::goals::CoverageGoal;
use crate::mutation::{mutate, MutationConfig};
use crate::rng::RngContext;
use crate::stopping::StoppingState;
use crate::testsuite::TestSuite;
use testforge_bytecode::Module;
use testforge_trace::ExecutionTrace;

/// Summed per-goal minimum fitness across `traces` (lower is better), plus
/// the number of goals at least one constituent test covers (spec.md §4.6
/// "suite-level fitness: sum of per-goal best achieved fitness").
fn suite_fitness(traces: &[ExecutionTrace], goals: &[CoverageGoal], graphs: &ProgramGraphs) -> (f64, usize) {
    if traces.is_empty() {
        return (goals.len() as f64, 0);
    }
    let checked: Vec<CheckedCoverage> = traces.iter().map(CheckedCoverage::from_trace).collect();
    let mut total = 0.0;
    let mut covered = 0;
    for &goal in goals {
        let best = traces
            .iter()
            .zip(&checked)
            .map(|(t, c)| goal_fitness(goal, t, graphs, c))
            .fold(f64::INFINITY, f64::min);
        total += best;
        if best == 0.0 {
            covered += 1;
        }
    }
    (total, covered)
}

fn random_suite(cluster: &CallableCluster, factory: &Factory, rng: &RngContext, config: &GeneratorConfig) -> TestSuite {
    let mut suite = TestSuite::new();
    let count = rng.gen_range(1..5).max(1);
    for _ in 0..count {
        if suite.total_length() >= config.max_suite_length {
            break;
        }
        suite.push(random_test_case(cluster, factory, rng, config));
    }
    suite
}

/// Suite-level single-point crossover (spec.md §4.3 generalized to suite
/// granularity): swaps a random prefix/suffix of constituent tests wholesale
/// between the two parents, bounded by `max_suite_length`.
fn suite_crossover(parent1: &TestSuite, parent2: &TestSuite, rng: &RngContext, max_suite_length: usize) -> (TestSuite, TestSuite) {
    if parent1.tests.is_empty() || parent2.tests.is_empty() {
        return (parent1.clone(), parent2.clone());
    }
    let cut1 = rng.gen_range(0..parent1.tests.len());
    let cut2 = rng.gen_range(0..parent2.tests.len());
    let mut child1 = TestSuite::from_tests(parent1.tests[..cut1].to_vec());
    for test in &parent2.tests[cut2..] {
        if child1.total_length() + test.len() > max_suite_length {
            break;
        }
        child1.push(test.clone());
    }
    let mut child2 = TestSuite::from_tests(parent2.tests[..cut2].to_vec());
    for test in &parent1.tests[cut1..] {
        if child2.total_length() + test.len() > max_suite_length {
            break;
        }
        child2.push(test.clone());
    }
    (child1, child2)
}

/// Suite-level mutation: add a fresh test, drop a random test, or mutate a
/// random constituent test in place, independently at the configured
/// probabilities (spec.md §4.3 generalized to suite granularity).
fn suite_mutate(
    suite: &mut TestSuite,
    cluster: &CallableCluster,
    factory: &Factory,
    rng: &RngContext,
    config: &GeneratorConfig,
    mutation_config: &MutationConfig,
) {
    if rng.gen_bool(mutation_config.delete_probability) && !suite.tests.is_empty() {
        let i = rng.gen_range(0..suite.tests.len());
        suite.tests.remove(i);
    }
    if rng.gen_bool(mutation_config.change_probability) && !suite.tests.is_empty() {
        let i = rng.gen_range(0..suite.tests.len());
        mutate(&mut suite.tests[i], cluster, factory, rng, mutation_config);
    }
    if rng.gen_bool(mutation_config.insert_probability) && suite.total_length() < config.max_suite_length {
        suite.push(random_test_case(cluster, factory, rng, config));
    }
}

fn batch_for(suite: &TestSuite, transport: &dyn BatchTransport, factory: &Factory) -> Vec<ExecutionTrace> {
    run_batch(transport, &suite.tests, factory)
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    cluster: &CallableCluster,
    module: &Module,
    graphs: &ProgramGraphs,
    transport: &dyn BatchTransport,
    factory: &Factory,
    rng: &RngContext,
    config: &GeneratorConfig,
    mut observer: Option<&mut IterationObserver>,
) -> GaOutcome {
    let mutation_config = MutationConfig {
        insert_probability: config.mutation_probabilities.insert,
        delete_probability: config.mutation_probabilities.delete,
        change_probability: config.mutation_probabilities.change,
        ..MutationConfig::default()
    };

    let goals = static_goal_universe(module, graphs, &config.coverage_metrics);
    let mut population: Vec<TestSuite> = (0..config.population_size).map(|_| random_suite(cluster, factory, rng, config)).collect();
    let mut stopping = StoppingState::new(config.stopping);
    let mut best: Option<TestSuite> = None;
    let mut best_covered = 0usize;

    loop {
        let scored: Vec<(f64, usize)> = population.iter().map(|s| suite_fitness(&batch_for(s, transport, factory), &goals, graphs)).collect();

        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| scored[a].0.partial_cmp(&scored[b].0).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(&top) = order.first() {
            if scored[top].1 >= best_covered {
                best_covered = scored[top].1;
                best = Some(population[top].clone());
            }
        }

        let statements_run: u64 = population.iter().map(|s| s.total_length() as u64).sum();
        let coverage = if goals.is_empty() { 1.0 } else { best_covered as f64 / goals.len() as f64 };
        stopping.record_iteration(statements_run, population.iter().map(|s| s.len() as u64).sum(), coverage);

        if let Some(obs) = observer.as_deref_mut() {
            obs(&IterationEvent { iteration: stopping.iterations(), covered_goals: best_covered, total_goals: goals.len() });
        }

        if stopping.should_stop() {
            break;
        }

        let mut offspring = Vec::with_capacity(population.len());
        while offspring.len() < population.len() {
            let p1 = &population[order[rng.gen_range(0..order.len())]];
            let p2 = &population[order[rng.gen_range(0..order.len())]];
            let (mut c1, mut c2) = if rng.gen_bool(config.crossover_probability) {
                suite_crossover(p1, p2, rng, config.max_suite_length)
            } else {
                (p1.clone(), p2.clone())
            };
            suite_mutate(&mut c1, cluster, factory, rng, config, &mutation_config);
            suite_mutate(&mut c2, cluster, factory, rng, config, &mutation_config);
            offspring.push(c1);
            if offspring.len() < population.len() {
                offspring.push(c2);
            }
        }

        let elite_count = (population.len() / 10).max(1);
        let mut next_generation: Vec<TestSuite> = order.iter().take(elite_count).map(|&i| population[i].clone()).collect();
        next_generation.extend(offspring.into_iter().take(population.len() - elite_count));
        population = next_generation;
    }

    let mut suite = best.unwrap_or_default();
    suite.dedup_by_structural_equality();
    GaOutcome { suite, iterations: stopping.iterations(), covered_goals: best_covered, total_goals: goals.len() }
}
