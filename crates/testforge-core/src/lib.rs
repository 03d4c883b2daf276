// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Test-case model, evolutionary-algorithm core, coverage archives, fitness
//! computation, and stopping conditions (spec.md §3, §4). This crate knows
//! nothing about bytecode instrumentation or process orchestration — it
//! consumes an already-instrumented [`testforge_bytecode::Module`] and an
//! [`batch::BatchTransport`] for running candidate test cases, and hands
//! back a [`testsuite::TestSuite`] plus run statistics.

pub mod archive;
pub mod assertion;
pub mod batch;
pub mod cluster;
pub mod config;
pub mod crossover;
pub mod error;
pub mod evaluate;
pub mod factory;
pub mod fitness;
pub mod ga;
pub mod goals;
pub mod mutation;
pub mod operator_catalog;
pub mod rng;
pub mod seeding;
pub mod statement;
pub mod stats;
pub mod stopping;
pub mod testcase;
pub mod testsuite;
pub mod types;
pub mod varref;

pub use batch::{BatchOutcome, BatchTransport, LocalTransport};
pub use cluster::CallableCluster;
pub use config::{Algorithm, AssertionStrategy, CoverageMetric, GeneratorConfig, Selection};
pub use error::CoreError;
pub use evaluate::Evaluator;
pub use factory::{Factory, PrimitivePoolWeights};
pub use fitness::ProgramGraphs;
pub use ga::{GaOutcome, IterationEvent, IterationObserver};
pub use goals::CoverageGoal;
pub use rng::RngContext;
pub use stats::RunStatistics;
pub use stopping::{StoppingConfig, StoppingState};
pub use testcase::TestCase;
pub use testsuite::TestSuite;
