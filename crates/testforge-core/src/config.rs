// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::CoreError;
use crate::stopping::StoppingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The evolutionary-algorithm family to run (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Algorithm {
    DynaMosa,
    Mosa,
    Mio,
    WholeSuite,
    Random,
    RandomSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMetric {
    Branch,
    Line,
    Checked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionStrategy {
    Simple,
    Mutation,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutationProbabilities {
    pub insert: f64,
    pub change: f64,
    pub delete: f64,
}

impl Default for MutationProbabilities {
    fn default() -> Self {
        Self { insert: 0.34, change: 0.33, delete: 0.33 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Rank { rank_bias: f64 },
    Tournament { tournament_size: usize },
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Rank { rank_bias: 1.7 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(with = "humantime_serde_millis")]
    pub per_statement: Duration,
    #[serde(with = "humantime_serde_millis")]
    pub per_test: Duration,
    #[serde(with = "humantime_serde_millis")]
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            per_statement: Duration::from_millis(500),
            per_test: Duration::from_secs(5),
            total: Duration::from_secs(60),
        }
    }
}

/// Millisecond (de)serialization for [`Duration`] fields, avoiding a direct
/// dependency on a humantime crate for what is just a u64 of milliseconds.
mod humantime_serde_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// The full set of knobs the core recognizes (spec.md §6 "Configuration
/// options"). Deserialized from TOML/JSON by the out-of-scope CLI/config
/// loader; every field carries a sensible default so a bare `{}` document
/// still produces a runnable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub algorithm: Algorithm,
    pub coverage_metrics: Vec<CoverageMetric>,
    pub population_size: usize,
    pub max_test_length: usize,
    pub max_suite_length: usize,
    pub mutation_probabilities: MutationProbabilities,
    pub crossover_probability: f64,
    pub selection: Selection,
    pub stopping: StoppingConfigDto,
    pub seed: Option<u64>,
    pub assertion_strategy: AssertionStrategy,
    pub mutation_operators: Vec<String>,
    pub timeouts: Timeouts,
    pub subprocess: bool,
    pub include_methods: Vec<String>,
    pub exclude_methods: Vec<String>,
    pub exclude_modules: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::DynaMosa,
            coverage_metrics: vec![CoverageMetric::Branch],
            population_size: 50,
            max_test_length: 20,
            max_suite_length: 60,
            mutation_probabilities: MutationProbabilities::default(),
            crossover_probability: 0.75,
            selection: Selection::default(),
            stopping: StoppingConfigDto::default(),
            seed: None,
            assertion_strategy: AssertionStrategy::Simple,
            mutation_operators: Vec::new(),
            timeouts: Timeouts::default(),
            subprocess: false,
            include_methods: Vec::new(),
            exclude_methods: Vec::new(),
            exclude_modules: Vec::new(),
        }
    }
}

/// Serializable mirror of [`StoppingConfig`] (whose fields are plain
/// `Duration`/`Option` and already serde-friendly, but kept as a distinct
/// DTO so the config schema stays stable independent of that struct's
/// internal field order).
pub type StoppingConfigDto = StoppingConfig;

impl GeneratorConfig {
    /// Rejects option combinations spec.md §7 classifies as a configuration
    /// error (exit code 1), surfaced immediately rather than discovered
    /// mid-run.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.population_size == 0 {
            return Err(CoreError::Configuration("population_size must be non-zero".into()));
        }
        if self.max_test_length == 0 {
            return Err(CoreError::Configuration("max_test_length must be non-zero".into()));
        }
        if self.max_suite_length == 0 {
            return Err(CoreError::Configuration("max_suite_length must be non-zero".into()));
        }
        let p = &self.mutation_probabilities;
        let sum = p.insert + p.change + p.delete;
        if !(0.0..=1.0 + f64::EPSILON).contains(&sum) {
            return Err(CoreError::Configuration(format!(
                "mutation_probabilities must sum to at most 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(CoreError::Configuration("crossover_probability must be in [0, 1]".into()));
        }
        if self.coverage_metrics.is_empty() {
            return Err(CoreError::Configuration("coverage_metrics must name at least one metric".into()));
        }
        for name in &self.mutation_operators {
            if !crate::operator_catalog::is_known_operator(name) {
                return Err(CoreError::Configuration(format!("unknown mutation operator {name:?}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = GeneratorConfig { population_size: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_mutation_operator_is_rejected() {
        let config = GeneratorConfig { mutation_operators: vec!["not_a_real_operator".into()], ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn mutation_probabilities_over_one_is_rejected() {
        let config = GeneratorConfig {
            mutation_probabilities: MutationProbabilities { insert: 0.6, change: 0.6, delete: 0.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
