// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::varref::StatementIndex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("statement {statement} references slot {referenced}, which is not yet defined")]
    DanglingReference { statement: StatementIndex, referenced: StatementIndex },
    #[error("no callable in the cluster matches the requested signature")]
    NoMatchingCallable,
    #[error("test suite is empty; nothing to evaluate")]
    EmptySuite,
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
