// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Minimal manual argument parsing (spec.md §1: the command-line parser
//! proper is an out-of-scope collaborator; this is just enough surface to
//! drive the invocation contract in spec.md §6 without pulling in a full
//! CLI-parsing dependency for four positional values and two flags).

use std::path::PathBuf;

/// The environment flag a host must set before this process will load and
/// execute target code (spec.md §6 invocation contract: "the host
/// environment must advertise consent via a documented environment flag
/// before any target code loads"). Its absence is exit code 4.
pub const CONSENT_ENV_VAR: &str = "TESTFORGE_ALLOW_TARGET_EXECUTION";

pub struct Invocation {
    pub project_root: PathBuf,
    pub module_identifier: String,
    pub output_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("usage: testforge <project-root> <module-identifier> <output-dir> [--config <path>] [--seed-file <path>]")]
    Usage,
}

pub fn parse(args: impl Iterator<Item = String>) -> Result<Invocation, CliError> {
    let mut positional = Vec::with_capacity(3);
    let mut config_path = None;
    let mut seed_file = None;

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(PathBuf::from(args.next().ok_or(CliError::Usage)?)),
            "--seed-file" => seed_file = Some(PathBuf::from(args.next().ok_or(CliError::Usage)?)),
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 3 {
        return Err(CliError::Usage);
    }

    Ok(Invocation {
        project_root: PathBuf::from(&positional[0]),
        module_identifier: positional[1].clone(),
        output_dir: PathBuf::from(&positional[2]),
        config_path,
        seed_file,
    })
}

/// Exit codes spec.md §6 assigns: 0 success, 1 configuration error, 2 setup
/// error, 3 no coverage achieved within budget, 4 target module refused to
/// load (isolation flag missing).
#[repr(i32)]
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    Configuration = 1,
    Setup = 2,
    NoCoverage = 3,
    ConsentRefused = 4,
}
