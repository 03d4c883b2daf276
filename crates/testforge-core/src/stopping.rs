// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Composable OR of stopping predicates, evaluated at the top of each
/// iteration (spec.md §4.7). Any predicate firing ends the loop gracefully
/// after the current iteration finishes (spec.md §5 "Cancellation").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    pub max_wall_clock: Option<Duration>,
    pub max_iterations: Option<u64>,
    pub max_statement_executions: Option<u64>,
    pub max_test_executions: Option<u64>,
    pub max_coverage: Option<f64>,
    pub plateau_iterations: Option<u64>,
    pub max_resident_memory_bytes: Option<u64>,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            max_wall_clock: Some(Duration::from_secs(60)),
            max_iterations: None,
            max_statement_executions: None,
            max_test_executions: None,
            max_coverage: None,
            plateau_iterations: None,
            max_resident_memory_bytes: None,
        }
    }
}

/// Live counters the main loop feeds into the stopping predicates each
/// iteration; distinct from [`StoppingConfig`] so the same thresholds can be
/// re-evaluated across runs without resetting progress state by hand.
pub struct StoppingState {
    config: StoppingConfig,
    started: Instant,
    iterations: u64,
    statement_executions: u64,
    test_executions: u64,
    best_coverage: f64,
    plateau_since: u64,
    resident_memory_bytes: u64,
}

impl StoppingState {
    pub fn new(config: StoppingConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            iterations: 0,
            statement_executions: 0,
            test_executions: 0,
            best_coverage: 0.0,
            plateau_since: 0,
            resident_memory_bytes: 0,
        }
    }

    /// Records the outcome of one completed iteration: how many statements
    /// and tests it ran, and the archive's coverage ratio afterward.
    pub fn record_iteration(&mut self, statement_executions: u64, test_executions: u64, coverage: f64) {
        self.iterations += 1;
        self.statement_executions += statement_executions;
        self.test_executions += test_executions;
        if coverage > self.best_coverage {
            self.best_coverage = coverage;
            self.plateau_since = 0;
        } else {
            self.plateau_since += 1;
        }
    }

    pub fn record_resident_memory(&mut self, bytes: u64) {
        self.resident_memory_bytes = bytes;
    }

    /// True when any configured predicate has fired.
    pub fn should_stop(&self) -> bool {
        if let Some(limit) = self.config.max_wall_clock {
            if self.started.elapsed() >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.max_iterations {
            if self.iterations >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.max_statement_executions {
            if self.statement_executions >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.max_test_executions {
            if self.test_executions >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.max_coverage {
            if self.best_coverage >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.plateau_iterations {
            if self.plateau_since >= limit {
                return true;
            }
        }
        if let Some(limit) = self.config.max_resident_memory_bytes {
            if self.resident_memory_bytes >= limit {
                return true;
            }
        }
        false
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_iterations_fires_promptly() {
        let mut state = StoppingState::new(StoppingConfig { max_iterations: Some(3), ..Default::default() });
        for _ in 0..2 {
            assert!(!state.should_stop());
            state.record_iteration(10, 1, 0.5);
        }
        state.record_iteration(10, 1, 0.5);
        assert!(state.should_stop());
    }

    #[test]
    fn coverage_plateau_fires_after_n_stagnant_iterations() {
        let mut state = StoppingState::new(StoppingConfig { plateau_iterations: Some(2), ..Default::default() });
        state.record_iteration(1, 1, 0.5);
        assert!(!state.should_stop());
        state.record_iteration(1, 1, 0.5);
        assert!(!state.should_stop());
        state.record_iteration(1, 1, 0.5);
        assert!(state.should_stop());
    }

    #[test]
    fn max_coverage_fires_once_reached() {
        let mut state = StoppingState::new(StoppingConfig { max_coverage: Some(1.0), ..Default::default() });
        state.record_iteration(1, 1, 0.9);
        assert!(!state.should_stop());
        state.record_iteration(1, 1, 1.0);
        assert!(state.should_stop());
    }
}
