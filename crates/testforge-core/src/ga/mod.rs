// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! The evolutionary-algorithm family (spec.md §4.6): one module per
//! algorithm, sharing the ranking/selection primitives and the archive/
//! fitness/evaluator machinery from the rest of the crate.

pub mod dynamosa;
pub mod mio;
pub mod mosa;
pub mod random;
pub mod ranking;
pub mod selection;
pub mod whole_suite;

use crate::batch::{BatchOutcome, BatchTransport};
use crate::cluster::CallableCluster;
use crate::config::{Algorithm, CoverageMetric, GeneratorConfig, Selection};
use crate::factory::Factory;
use crate::fitness::{goal_fitness, CheckedCoverage, FitnessCache, FitnessVector, ProgramGraphs};
use crate::goals::CoverageGoal;
use crate::rng::RngContext;
use crate::testcase::TestCase;
use crate::testsuite::TestSuite;
use rayon::prelude::*;
use testforge_bytecode::Module;
use testforge_trace::ExecutionTrace;

/// One chromosome paired with its memoized fitness (spec.md §4.4
/// "computation cache"). `C` is [`TestCase`] for the per-test algorithms and
/// [`crate::testsuite::TestSuite`] for Whole-Suite.
#[derive(Debug, Clone)]
pub struct Individual<C> {
    pub chromosome: C,
    pub fitness: FitnessCache,
}

impl<C> Individual<C> {
    pub fn new(chromosome: C) -> Self {
        Self { chromosome, fitness: FitnessCache::default() }
    }
}

/// Emitted once per completed iteration (spec.md §4.6 step "f. Yield an
/// iteration event to observers").
#[derive(Debug, Clone, Copy)]
pub struct IterationEvent {
    pub iteration: u64,
    pub covered_goals: usize,
    pub total_goals: usize,
}

pub type IterationObserver<'a> = dyn FnMut(&IterationEvent) + 'a;

/// What one completed algorithm run hands back to its caller (spec.md §4.6
/// "emit the final suite"): the suite itself plus the headline numbers
/// `testforge-core::stats::RunStatistics` is built from.
pub struct GaOutcome {
    pub suite: TestSuite,
    pub iterations: u64,
    pub covered_goals: usize,
    pub total_goals: usize,
}

/// Synthesizes a fresh, small test case by calling a handful of random
/// entry points (spec.md §4.6 "Build initial population (random or
/// seeded)"), shared by every algorithm's initial-population and
/// random-baseline logic.
pub(crate) fn random_test_case(cluster: &CallableCluster, factory: &Factory, rng: &RngContext, config: &GeneratorConfig) -> TestCase {
    let mut test = TestCase::new(config.max_test_length);
    let entry_points: Vec<_> = cluster.entry_points().collect();
    if entry_points.is_empty() {
        return test;
    }
    let calls = rng.gen_range(1..4).max(1);
    for _ in 0..calls {
        if let Some(candidate) = rng.choose(&entry_points) {
            let _ = factory.synthesize_call(&mut test, &candidate.qualified_name);
        }
    }
    test
}

/// The full static goal universe named by `metrics` (spec.md §4.1, §6
/// `coverage_metrics`): every branch (both directions) plus branchless-entry
/// goals when `branch` is requested, every non-excluded line when `line` is
/// requested. MOSA, Whole-Suite and MIO evaluate against this fixed set for
/// the whole run; DynaMOSA instead grows its branch goals from
/// [`crate::archive::DynaMosaGoalManager`]'s activation frontier and only
/// needs the non-branch portion of it up front (see
/// [`static_non_branch_goals`]).
pub(crate) fn static_goal_universe(module: &Module, graphs: &ProgramGraphs, metrics: &[CoverageMetric]) -> Vec<CoverageGoal> {
    let mut goals = Vec::new();
    if metrics.contains(&CoverageMetric::Branch) {
        goals.extend(graphs.all_branch_goals());
        goals.extend(branchless_goals(module));
    }
    if metrics.contains(&CoverageMetric::Line) {
        goals.extend(line_goals(module));
    }
    if metrics.contains(&CoverageMetric::Checked) {
        goals.extend(checked_goals(module));
    }
    goals
}

/// The portion of [`static_goal_universe`] that has no control-dependence
/// predecessor to wait on — branchless-entry and line goals — which
/// DynaMOSA's archive can hold active from iteration zero even though its
/// branch goals activate incrementally.
pub(crate) fn static_non_branch_goals(module: &Module, metrics: &[CoverageMetric]) -> Vec<CoverageGoal> {
    let mut goals = Vec::new();
    if metrics.contains(&CoverageMetric::Branch) {
        goals.extend(branchless_goals(module));
    }
    if metrics.contains(&CoverageMetric::Line) {
        goals.extend(line_goals(module));
    }
    if metrics.contains(&CoverageMetric::Checked) {
        goals.extend(checked_goals(module));
    }
    goals
}

fn branchless_goals(module: &Module) -> impl Iterator<Item = CoverageGoal> + '_ {
    module.iter().filter(|c| !c.skipped && c.is_branchless()).map(|c| CoverageGoal::BranchlessEntered(c.id))
}

fn line_goals(module: &Module) -> impl Iterator<Item = CoverageGoal> + '_ {
    module.iter().filter(|c| !c.skipped).flat_map(|c| c.lines().into_iter().map(CoverageGoal::LineCovered))
}

/// Every `(code_object, local slot)` pair in the module, as checked-coverage
/// goals (spec.md §4.9, `coverage_metrics = checked`). Has no control-
/// dependence predecessor, same as branchless-entry and line goals, so it's
/// active from iteration zero for every algorithm including DynaMOSA.
fn checked_goals(module: &Module) -> impl Iterator<Item = CoverageGoal> + '_ {
    module
        .iter()
        .filter(|c| !c.skipped)
        .flat_map(|c| (0..c.num_locals).map(move |slot| CoverageGoal::statement_checked(c.id, slot)))
}

/// Draws one index from a rank+crowding-sorted `order` (best first) per the
/// configured selection operator (spec.md §6 `selection`).
pub(crate) fn select(order: &[usize], selection: Selection, rng: &RngContext) -> usize {
    match selection {
        Selection::Rank { rank_bias } => selection::rank_select(order, rank_bias, rng),
        Selection::Tournament { tournament_size } => selection::tournament_select(order, tournament_size, rng),
    }
}

/// Runs `tests` through `transport`, substituting an empty trace per test if
/// the worker handling the batch was reported lost (spec.md §5: "failure of
/// the worker invalidates only the batch in flight"). Every value the
/// dynamic-seeding adapter observed at runtime (`trace.seeded_values`) is
/// harvested back into `factory`'s seed pool, closing the loop spec.md §4.1
/// describes between the adapter and the factory's seeded primitive pool.
pub(crate) fn run_batch(transport: &dyn BatchTransport, tests: &[TestCase], factory: &Factory) -> Vec<ExecutionTrace> {
    let traces = match transport.run_batch(tests) {
        BatchOutcome::Traces(traces) => traces,
        BatchOutcome::WorkerLost => {
            tracing::warn!(batch_size = tests.len(), "worker lost; substituting empty traces for this batch");
            tests.iter().map(|_| ExecutionTrace::new()).collect()
        }
    };
    for trace in &traces {
        for value in &trace.seeded_values {
            factory.seed_pool().push(value.clone());
        }
    }
    traces
}

/// Computes one chromosome's fitness vector against `goals` from its trace
/// (spec.md §4.4). Cheap enough to recompute every generation rather than
/// thread a per-individual cache across iterations, since it never re-runs
/// the test itself — only [`goal_fitness`] over an already-collected trace.
/// Independent per trace, so this fans out over `rayon`'s global pool the
/// same way the teacher's `move-unit-test` test runner parallelizes
/// independent per-test work.
pub(crate) fn fitness_vectors(traces: &[ExecutionTrace], goals: &[CoverageGoal], graphs: &ProgramGraphs) -> Vec<FitnessVector> {
    traces
        .par_iter()
        .map(|trace| {
            let checked = CheckedCoverage::from_trace(trace);
            goals.iter().map(|&g| (g, goal_fitness(g, trace, graphs, &checked))).collect()
        })
        .collect()
}

/// Dispatches to the configured algorithm (spec.md §6 `algorithm`).
#[allow(clippy::too_many_arguments)]
pub fn run(
    cluster: &CallableCluster,
    module: &Module,
    graphs: &ProgramGraphs,
    transport: &dyn BatchTransport,
    factory: &Factory,
    rng: &RngContext,
    config: &GeneratorConfig,
    observer: Option<&mut IterationObserver>,
) -> GaOutcome {
    match config.algorithm {
        Algorithm::DynaMosa => dynamosa::run(cluster, module, graphs, transport, factory, rng, config, observer),
        Algorithm::Mosa => mosa::run(cluster, module, graphs, transport, factory, rng, config, observer),
        Algorithm::Mio => mio::run(cluster, module, graphs, transport, factory, rng, config, observer),
        Algorithm::WholeSuite => whole_suite::run(cluster, module, graphs, transport, factory, rng, config, observer),
        Algorithm::Random => random::run_feedback_directed(cluster, module, graphs, transport, factory, rng, config, observer),
        Algorithm::RandomSearch => random::run_pure_random(cluster, module, graphs, transport, factory, rng, config, observer),
    }
}
