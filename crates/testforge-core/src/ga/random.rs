// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Random baselines (spec.md §4.6): a feedback-directed variant that keeps
//! whatever grows the covered-goal archive, and a pure variant that forgets
//! everything between iterations and exists only to measure how much the
//! other algorithms' guidance is actually buying.

use crate::archive::CoverageArchive;
use crate::batch::BatchTransport;
use crate::cluster::CallableCluster;
use crate::config::GeneratorConfig;
use crate::factory::Factory;
use crate::fitness::ProgramGraphs;
use crate::ga::{fitness_vectors, random_test_case, run_batch, static_goal_universe, GaOutcome, IterationEvent, IterationObserver};
use crate::mutation::{mutate, MutationConfig};
use crate::rng::RngContext;
use crate::stopping::StoppingState;
use crate::testcase::TestCase;
use crate::testsuite::TestSuite;
use testforge_bytecode::Module;

fn finish(archive: CoverageArchive<TestCase>, stopping: &StoppingState) -> GaOutcome {
    let mut suite = TestSuite::from_tests(archive.distinct_individuals().into_iter().cloned().collect());
    suite.dedup_by_structural_equality();
    GaOutcome {
        suite,
        iterations: stopping.iterations(),
        covered_goals: archive.covered_count(),
        total_goals: archive.total_goals(),
    }
}

/// Algorithm::Random (spec.md §4.6): each candidate either extends a test
/// already held responsible for some covered goal, or is fresh; candidates
/// that cover a previously-uncovered goal are archived and so keep shaping
/// later iterations — the "feedback" in feedback-directed.
#[allow(clippy::too_many_arguments)]
pub fn run_feedback_directed(
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
    let mut archive: CoverageArchive<TestCase> = CoverageArchive::new(goals.iter().copied());
    let mut stopping = StoppingState::new(config.stopping);

    loop {
        let mut batch = Vec::with_capacity(config.population_size.max(1));
        for _ in 0..config.population_size.max(1) {
            let archived: Vec<&TestCase> = archive.distinct_individuals();
            let candidate = if !archived.is_empty() && rng.gen_bool(0.5) {
                let mut extended = rng.choose(&archived).map(|t| (*t).clone()).unwrap_or_default();
                mutate(&mut extended, cluster, factory, rng, &mutation_config);
                extended
            } else {
                random_test_case(cluster, factory, rng, config)
            };
            batch.push(candidate);
        }

        let traces = run_batch(transport, &batch, factory);
        let fitness = fitness_vectors(&traces, &goals, graphs);
        for (i, fv) in fitness.iter().enumerate() {
            let covers: Vec<_> = fv.iter().filter(|(_, &f)| f == 0.0).map(|(&g, _)| g).collect();
            if !covers.is_empty() {
                archive.update(&batch[i], batch[i].len(), stopping.iterations(), covers);
            }
        }

        let statements_run: u64 = batch.iter().map(|t| t.len() as u64).sum();
        stopping.record_iteration(statements_run, batch.len() as u64, archive.coverage_ratio());

        if let Some(obs) = observer.as_deref_mut() {
            obs(&IterationEvent {
                iteration: stopping.iterations(),
                covered_goals: archive.covered_count(),
                total_goals: archive.total_goals(),
            });
        }

        if stopping.should_stop() {
            break;
        }
    }

    finish(archive, &stopping)
}

/// Algorithm::RandomSearch (spec.md §4.6): a fresh, unrelated population is
/// synthesized every iteration with no reuse and no mutation of prior
/// results; the archive here is pure bookkeeping of what was seen, never
/// fed back into what gets generated next.
#[allow(clippy::too_many_arguments)]
pub fn run_pure_random(
    cluster: &CallableCluster,
    module: &Module,
    graphs: &ProgramGraphs,
    transport: &dyn BatchTransport,
    factory: &Factory,
    rng: &RngContext,
    config: &GeneratorConfig,
    mut observer: Option<&mut IterationObserver>,
) -> GaOutcome {
    let goals = static_goal_universe(module, graphs, &config.coverage_metrics);
    let mut archive: CoverageArchive<TestCase> = CoverageArchive::new(goals.iter().copied());
    let mut stopping = StoppingState::new(config.stopping);

    loop {
        let batch: Vec<TestCase> = (0..config.population_size.max(1)).map(|_| random_test_case(cluster, factory, rng, config)).collect();
        let traces = run_batch(transport, &batch, factory);
        let fitness = fitness_vectors(&traces, &goals, graphs);
        for (i, fv) in fitness.iter().enumerate() {
            let covers: Vec<_> = fv.iter().filter(|(_, &f)| f == 0.0).map(|(&g, _)| g).collect();
            if !covers.is_empty() {
                archive.update(&batch[i], batch[i].len(), stopping.iterations(), covers);
            }
        }

        let statements_run: u64 = batch.iter().map(|t| t.len() as u64).sum();
        stopping.record_iteration(statements_run, batch.len() as u64, archive.coverage_ratio());

        if let Some(obs) = observer.as_deref_mut() {
            obs(&IterationEvent {
                iteration: stopping.iterations(),
                covered_goals: archive.covered_count(),
                total_goals: archive.total_goals(),
            });
        }

        if stopping.should_stop() {
            break;
        }
    }

    finish(archive, &stopping)
}
