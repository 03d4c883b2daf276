// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use testforge_bytecode::CodeObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("code object {0} not found in module")]
    UnknownCodeObject(CodeObjectId),
    #[error("jump to block {0} out of range")]
    InvalidJumpTarget(u32),
    #[error("operand stack underflow in code object {0}")]
    StackUnderflow(CodeObjectId),
    #[error("call to unregistered native callee {0}")]
    NativeCallUnresolved(u32),
    #[error("uncaught exception: {0}")]
    Raised(String),
    #[error("execution aborted after cooperative abort request")]
    Aborted,
    #[error("statement exceeded its per-statement timeout")]
    StatementTimedOut,
    #[error("test case exceeded its per-test timeout")]
    TestTimedOut,
}
