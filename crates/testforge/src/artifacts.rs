// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Loads the JSON artifacts that stand in for the out-of-scope front end's
//! output (spec.md §1 names "parsing real source into bytecode" as outside
//! this workspace's concern; see DESIGN.md for why the invocation contract
//! is implemented against a serialized [`Module`] and callable list rather
//! than a source tree). Given `project_root` and `module_identifier`, the
//! front end is expected to have already dropped:
//!
//! - `<project_root>/<module_identifier>.module.json` — a serialized [`Module`]
//! - `<project_root>/<module_identifier>.callables.json` — a serialized `Vec<CallableDescriptor>`

use std::path::Path;

use anyhow::{Context, Result};
use testforge_bytecode::Module;
use testforge_core::types::CallableDescriptor;
use testforge_core::{CallableCluster, Factory, GeneratorConfig, RunStatistics, TestSuite};

pub fn load_module(project_root: &Path, module_identifier: &str) -> Result<Module> {
    let path = project_root.join(format!("{module_identifier}.module.json"));
    let contents = std::fs::read_to_string(&path).with_context(|| format!("reading module artifact {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing module artifact {}", path.display()))
}

pub fn load_cluster(project_root: &Path, module_identifier: &str) -> Result<CallableCluster> {
    let path = project_root.join(format!("{module_identifier}.callables.json"));
    let contents = std::fs::read_to_string(&path).with_context(|| format!("reading callable artifact {}", path.display()))?;
    let descriptors: Vec<CallableDescriptor> =
        serde_json::from_str(&contents).with_context(|| format!("parsing callable artifact {}", path.display()))?;
    let mut cluster = CallableCluster::new();
    for descriptor in descriptors {
        cluster.register(descriptor);
    }
    Ok(cluster)
}

/// `GeneratorConfig::default()` when no `--config` path was given — every
/// field in the config schema has a sensible default (spec.md §6), so a
/// missing config file is not itself a configuration error.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else { return Ok(GeneratorConfig::default()) };
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading configuration {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing configuration {}", path.display()))
}

pub fn load_seed_file(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else { return Ok(None) };
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path).with_context(|| format!("reading seed file {}", path.display()))?))
}

/// Writes the generated, assertion-bearing suite as a structured IR file
/// (spec.md §6 "Output": "one source file per generated test suite,
/// emitted by the external unparser from structured test-case objects").
/// Rendering that IR to host-language source text is the out-of-scope
/// unparser's job; this is the handoff artifact it would consume.
pub fn write_suite(output_dir: &Path, module_identifier: &str, suite: &TestSuite) -> Result<()> {
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let path = output_dir.join(format!("{module_identifier}.suite.ir"));
    std::fs::write(&path, format!("{suite:#?}\n")).with_context(|| format!("writing suite IR {}", path.display()))
}

/// Appends one row to the run statistics CSV (spec.md §6: "one row per run,
/// header on first write").
pub fn append_statistics(output_dir: &Path, stats: &RunStatistics) -> Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let path = output_dir.join("statistics.csv");
    let needs_header = !path.exists();

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening statistics file {}", path.display()))?;
    if needs_header {
        writeln!(file, "{}", RunStatistics::csv_header())?;
    }
    writeln!(file, "{}", stats.to_csv_row())?;
    Ok(())
}

/// Appends every primitive value the run's dynamic-seeding adapter
/// harvested back into the supplied seed file (spec.md §6 "Persisted
/// state": "a seed file... may be supplied as input and appended as
/// output").
pub fn append_seed_file(path: &Path, factory: &Factory) -> Result<()> {
    use std::io::Write;

    let csv = testforge_core::seeding::append_csv(factory.seed_pool());
    if csv.is_empty() {
        return Ok(());
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening seed file {}", path.display()))?;
    file.write_all(csv.as_bytes())?;
    Ok(())
}
