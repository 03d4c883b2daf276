// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! MOSA (spec.md §4.6): preference-sorted many-objective search over the
//! full static goal universe, evaluated for the whole run rather than
//! activated incrementally as in DynaMOSA.

use crate::archive::CoverageArchive;
use crate::batch::BatchTransport;
use crate::cluster::CallableCluster;
use crate::config::GeneratorConfig;
use crate::crossover::crossover;
use crate::factory::Factory;
use crate::fitness::ProgramGraphs;
use crate::ga::ranking::{flatten_with_crowding, preference_sort, truncate_to};
use crate::ga::{fitness_vectors, random_test_case, run_batch, select, static_goal_universe, GaOutcome, IterationEvent, IterationObserver};
use crate::mutation::{mutate, MutationConfig};
use crate::rng::RngContext;
use crate::stopping::StoppingState;
use crate::testcase::TestCase;
use crate::testsuite::TestSuite;
use testforge_bytecode::Module;

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
    let mut archive: CoverageArchive<TestCase> = CoverageArchive::new(goals.iter().copied());

    let mut population: Vec<TestCase> =
        (0..config.population_size).map(|_| random_test_case(cluster, factory, rng, config)).collect();

    let mut stopping = StoppingState::new(config.stopping);

    loop {
        let traces = run_batch(transport, &population, factory);
        let fitness = fitness_vectors(&traces, &goals, graphs);
        let lengths: Vec<usize> = population.iter().map(TestCase::len).collect();

        for (i, fv) in fitness.iter().enumerate() {
            let covers: Vec<_> = fv.iter().filter(|(_, &f)| f == 0.0).map(|(&g, _)| g).collect();
            if !covers.is_empty() {
                archive.update(&population[i], lengths[i], stopping.iterations(), covers);
            }
        }

        let statements_run: u64 = population.iter().map(|t| t.len() as u64).sum();
        stopping.record_iteration(statements_run, population.len() as u64, archive.coverage_ratio());

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

        let fronts = preference_sort(&fitness, &lengths, &goals);
        let order = flatten_with_crowding(&fronts, &fitness, &goals);

        let mut offspring = Vec::with_capacity(population.len());
        while offspring.len() < population.len() {
            let p1 = &population[select(&order, config.selection, rng)];
            let p2 = &population[select(&order, config.selection, rng)];
            let (mut c1, mut c2) = if rng.gen_bool(config.crossover_probability) {
                crossover(p1, p2, rng)
            } else {
                (p1.clone(), p2.clone())
            };
            mutate(&mut c1, cluster, factory, rng, &mutation_config);
            mutate(&mut c2, cluster, factory, rng, &mutation_config);
            offspring.push(c1);
            if offspring.len() < population.len() {
                offspring.push(c2);
            }
        }

        let combined: Vec<TestCase> = population.into_iter().chain(offspring).collect();
        let combined_traces = run_batch(transport, &combined, factory);
        let combined_fitness = fitness_vectors(&combined_traces, &goals, graphs);
        let combined_lengths: Vec<usize> = combined.iter().map(TestCase::len).collect();
        let combined_fronts = preference_sort(&combined_fitness, &combined_lengths, &goals);
        let survivors = truncate_to(&combined_fronts, &combined_fitness, &goals, config.population_size);

        population = survivors.into_iter().map(|i| combined[i].clone()).collect();
    }

    let mut suite = TestSuite::from_tests(archive.distinct_individuals().into_iter().cloned().collect());
    suite.dedup_by_structural_equality();
    GaOutcome {
        suite,
        iterations: stopping.iterations(),
        covered_goals: archive.covered_count(),
        total_goals: archive.total_goals(),
    }
}
