// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! MIO (spec.md §3, §4.5): one bounded population per coverage goal, sampled
//! and mutated with an exploration/exploitation balance that shifts from
//! "many goals, shallow effort" to "few goals, deep effort" as the run
//! approaches `focus_threshold` progress.

use crate::archive::{mio_params_at, MioArchive};
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

/// Progress ratio at which MIO fully shifts from exploration to exploitation
/// (spec.md §4.5 default focus threshold).
const FOCUS_THRESHOLD: f64 = 0.85;

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
    let mut archive: MioArchive<TestCase> = MioArchive::new();
    let mut stopping = StoppingState::new(config.stopping);
    let total_goals = goals.len();

    if total_goals == 0 {
        return GaOutcome { suite: TestSuite::new(), iterations: 0, covered_goals: 0, total_goals: 0 };
    }

    loop {
        let progress = archive.covered_count() as f64 / total_goals as f64;
        let params = mio_params_at(progress, FOCUS_THRESHOLD);

        let mut batch = Vec::with_capacity(config.population_size.max(1));
        for slot in 0..config.population_size.max(1) {
            let target = goals[(slot + stopping.iterations() as usize) % goals.len()];
            let mut individual = archive
                .sample(&target, &params, rng)
                .unwrap_or_else(|| random_test_case(cluster, factory, rng, config));
            for _ in 0..params.mutations_per_iteration {
                mutate(&mut individual, cluster, factory, rng, &mutation_config);
            }
            batch.push(individual);
        }

        let traces = run_batch(transport, &batch, factory);
        let fitness = fitness_vectors(&traces, &goals, graphs);

        for (i, fv) in fitness.iter().enumerate() {
            let length = batch[i].len();
            for (&goal, &f) in fv {
                let h_value = 1.0 - f.min(1.0);
                if h_value > 0.0 || archive.best(&goal).is_none() {
                    archive.record(goal, batch[i].clone(), h_value, length, params.population_cap);
                }
            }
        }

        let statements_run: u64 = batch.iter().map(|t| t.len() as u64).sum();
        stopping.record_iteration(statements_run, batch.len() as u64, archive.covered_count() as f64 / total_goals as f64);

        if let Some(obs) = observer.as_deref_mut() {
            obs(&IterationEvent {
                iteration: stopping.iterations(),
                covered_goals: archive.covered_count(),
                total_goals,
            });
        }

        if stopping.should_stop() {
            break;
        }
    }

    let mut suite = TestSuite::new();
    for goal in archive.covered_goals().collect::<Vec<_>>() {
        if let Some(best) = archive.best(&goal) {
            suite.push(best.clone());
        }
    }
    suite.dedup_by_structural_equality();
    GaOutcome { suite, iterations: stopping.iterations(), covered_goals: archive.covered_count(), total_goals }
}
