// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BytecodeError {
    #[error("code object {0} has no basic blocks")]
    EmptyCodeObject(u32),
    #[error("jump target {target} out of range in code object {code_object}")]
    InvalidJumpTarget { code_object: u32, target: u32 },
    #[error("operand stack imbalance in code object {code_object}, block {block}: net effect {net}")]
    StackImbalance { code_object: u32, block: u32, net: i32 },
}
