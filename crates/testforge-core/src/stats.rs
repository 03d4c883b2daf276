// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::config::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One run's statistics record (spec.md §6 "Output"): CSV-appendable, keyed
/// by run id, one row per run with a header on first write. The actual CSV
/// rendering is left to the out-of-scope reporter; this struct is the shape
/// it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub run_id: String,
    pub final_coverage: f64,
    pub archive_size: usize,
    pub iterations: u64,
    pub mutation_score: Option<f64>,
    pub wall_time: Duration,
    pub configuration: GeneratorConfig,
}

impl RunStatistics {
    /// Renders this record as one CSV data row (no header), quoting the
    /// configuration snapshot as a JSON string so it round-trips through a
    /// single cell.
    pub fn to_csv_row(&self) -> String {
        let config_json = serde_json::to_string(&self.configuration).unwrap_or_default();
        format!(
            "{},{},{},{},{},{},\"{}\"",
            csv_escape(&self.run_id),
            self.final_coverage,
            self.archive_size,
            self.iterations,
            self.mutation_score.map(|s| s.to_string()).unwrap_or_default(),
            self.wall_time.as_secs_f64(),
            config_json.replace('"', "\"\""),
        )
    }

    pub fn csv_header() -> &'static str {
        "run_id,final_coverage,archive_size,iterations,mutation_score,wall_time_secs,configuration"
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_row_has_expected_field_count() {
        let stats = RunStatistics {
            run_id: "run-1".into(),
            final_coverage: 0.95,
            archive_size: 12,
            iterations: 50,
            mutation_score: Some(0.6),
            wall_time: Duration::from_secs(30),
            configuration: GeneratorConfig::default(),
        };
        let row = stats.to_csv_row();
        assert!(row.starts_with("run-1,0.95,12,50,0.6,30"));
    }
}
