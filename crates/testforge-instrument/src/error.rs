// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;
use testforge_bytecode::CodeObjectId;

/// Fatal instrumentation failure, per spec.md §4.1 Failure model: invalid
/// mutation of bytecode aborts the run. Distinct from a per-code-object
/// "skip" (see [`crate::instrumenter::InstrumentationOutcome`]), which is
/// recoverable.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("code object {0} has a jump target that does not exist")]
    InvalidJumpTarget(CodeObjectId),
    #[error("code object {0} has unbalanced operand stack after instrumentation: {1}")]
    StackImbalance(CodeObjectId, i32),
    #[error("unsupported bytecode version: {0}")]
    UnsupportedVersion(String),
}
