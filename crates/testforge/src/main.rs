// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Invocation entry point (spec.md §6): wires the instrumenter, the
//! callable cluster, the configured GA, and the assertion generator
//! together against the on-disk artifacts the out-of-scope front end
//! drops, and writes back the statistics row and the pruned test-suite IR
//! the (also out-of-scope) unparser would consume.

mod artifacts;
mod cli;

use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tracing_subscriber::EnvFilter;

use testforge_bytecode::SeedPool;
use testforge_core::types::Visibility;
use testforge_core::{CallableCluster, Factory, PrimitivePoolWeights, ProgramGraphs, RngContext, RunStatistics};
use testforge_instrument::{Instrumenter, TargetModuleFinder, V1};
use testforge_trace::{NativeRegistry, TracerConfig};

use cli::{CliError, ExitCode, CONSENT_ENV_VAR};

fn main() -> ProcessExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_target(false).init();

    match run(std::env::args().skip(1)) {
        Ok(code) => ProcessExitCode::from(code as u8),
        Err(code) => ProcessExitCode::from(code as u8),
    }
}

fn run(args: impl Iterator<Item = String>) -> Result<ExitCode, ExitCode> {
    let invocation = cli::parse(args).map_err(|CliError::Usage| {
        eprintln!("{}", CliError::Usage);
        ExitCode::Configuration
    })?;

    // spec.md §6: "Before any target code is loaded, the host environment
    // must advertise consent via a documented environment flag; refusal
    // aborts with a dedicated exit code."
    if std::env::var_os(CONSENT_ENV_VAR).is_none() {
        tracing::error!(flag = CONSENT_ENV_VAR, "target-execution consent flag is not set; refusing to load target module");
        return Err(ExitCode::ConsentRefused);
    }

    let config = artifacts::load_config(invocation.config_path.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "configuration load failed");
        ExitCode::Configuration
    })?;
    config.validate().map_err(|e| {
        tracing::error!(error = %e, "configuration is invalid");
        ExitCode::Configuration
    })?;

    let mut module = artifacts::load_module(&invocation.project_root, &invocation.module_identifier).map_err(|e| {
        tracing::error!(error = %e, "failed to load target module artifact");
        ExitCode::Setup
    })?;
    let raw_cluster = artifacts::load_cluster(&invocation.project_root, &invocation.module_identifier).map_err(|e| {
        tracing::error!(error = %e, "failed to load callable cluster artifact");
        ExitCode::Setup
    })?;
    let cluster = filter_cluster(raw_cluster, &config);
    if cluster.is_empty() {
        tracing::error!("callable cluster is empty after include/exclude filtering; nothing to test");
        return Err(ExitCode::Setup);
    }

    let version = V1;
    let module_finder = TargetModuleFinder::new(invocation.module_identifier.clone());
    let instrumenter = Instrumenter::new(&version, &module_finder);
    let instrumentation = instrumenter.instrument(&mut module).map_err(|e| {
        tracing::error!(error = %e, "bytecode instrumentation failed");
        ExitCode::Setup
    })?;
    tracing::info!(
        instrumented = instrumentation.instrumented_code_objects,
        skipped = instrumentation.skipped_code_objects,
        predicates = instrumentation.predicates_registered,
        lines = instrumentation.lines_registered,
        "instrumentation complete"
    );

    let seed = config.seed.unwrap_or_else(|| {
        let auto = rand::thread_rng().gen();
        tracing::info!(seed = auto, "no seed configured; generated one for this run");
        auto
    });
    let rng = RngContext::from_seed(seed);

    let seed_pool = SeedPool::new();
    if let Some(contents) = artifacts::load_seed_file(invocation.seed_file.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "failed to read seed file");
        ExitCode::Setup
    })? {
        match testforge_core::seeding::load_csv(&seed_pool, &contents) {
            Ok(loaded) => tracing::info!(loaded, "harvested primitive constants from seed file"),
            Err(e) => tracing::warn!(error = %e, "seed file could not be parsed; continuing without it"),
        }
    }

    let factory = Factory::new(&cluster, rng.clone(), seed_pool, PrimitivePoolWeights::default());
    let graphs = ProgramGraphs::build(&module);
    let natives = Arc::new(NativeRegistry::new());
    let tracer_config = TracerConfig {
        per_statement_timeout: config.timeouts.per_statement,
        per_test_timeout: config.timeouts.per_test,
        ..TracerConfig::default()
    };
    let evaluator = testforge_core::evaluate::Evaluator::new(&cluster, Arc::new(module.clone()), natives.clone(), tracer_config);
    let transport = testforge_core::LocalTransport::new(evaluator);

    let wall_clock = Instant::now();
    let mut observer = |event: &testforge_core::IterationEvent| {
        tracing::debug!(iteration = event.iteration, covered = event.covered_goals, total = event.total_goals, "iteration complete");
    };
    let mut outcome = testforge_core::run(&cluster, &module, &graphs, &transport, &factory, &rng, &config, Some(&mut observer));

    if outcome.total_goals > 0 && outcome.covered_goals == 0 {
        tracing::warn!("no coverage goal was ever covered within the configured budget");
        return Err(ExitCode::NoCoverage);
    }

    let mutation_report =
        testforge_assert::generate_assertions(&mut outcome.suite, &cluster, &module, natives, tracer_config, &rng, &config)
            .map_err(|e| {
                tracing::error!(error = %e, "assertion generation failed");
                ExitCode::Setup
            })?;

    let wall_time = wall_clock.elapsed();
    let final_coverage = if outcome.total_goals == 0 { 1.0 } else { outcome.covered_goals as f64 / outcome.total_goals as f64 };

    artifacts::write_suite(&invocation.output_dir, &invocation.module_identifier, &outcome.suite).map_err(|e| {
        tracing::error!(error = %e, "failed to write generated test suite");
        ExitCode::Setup
    })?;

    let stats = RunStatistics {
        run_id: format!("{}-{}", invocation.module_identifier, seed),
        final_coverage,
        archive_size: outcome.suite.len(),
        iterations: outcome.iterations,
        mutation_score: mutation_report.score(),
        wall_time,
        configuration: config.clone(),
    };
    artifacts::append_statistics(&invocation.output_dir, &stats).map_err(|e| {
        tracing::error!(error = %e, "failed to write statistics record");
        ExitCode::Setup
    })?;

    if let Some(path) = invocation.seed_file.as_deref() {
        if let Err(e) = artifacts::append_seed_file(path, &factory) {
            tracing::warn!(error = %e, "failed to persist harvested seed values");
        }
    }

    tracing::info!(
        coverage = final_coverage,
        mutation_score = ?mutation_report.score(),
        tests = outcome.suite.len(),
        iterations = outcome.iterations,
        "run complete"
    );
    Ok(ExitCode::Success)
}

/// Applies `include_methods`/`exclude_methods`/`exclude_modules` (spec.md
/// §6) over a freshly loaded cluster: [`CallableCluster::entry_points`]
/// documents this filtering as the caller's responsibility rather than
/// baking config into the cluster type itself.
fn filter_cluster(raw: CallableCluster, config: &testforge_core::GeneratorConfig) -> CallableCluster {
    let mut filtered = CallableCluster::new();
    for descriptor in raw.iter() {
        if descriptor.visibility != Visibility::Public {
            filtered.register(descriptor.clone());
            continue;
        }
        if config.exclude_modules.iter().any(|m| descriptor.qualified_name.starts_with(m.as_str())) {
            continue;
        }
        if !config.include_methods.is_empty() && !config.include_methods.iter().any(|m| m == &descriptor.qualified_name) {
            continue;
        }
        if config.exclude_methods.iter().any(|m| m == &descriptor.qualified_name) {
            continue;
        }
        filtered.register(descriptor.clone());
    }
    filtered
}
