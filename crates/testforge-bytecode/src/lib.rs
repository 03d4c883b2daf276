// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Compact instrumentable bytecode: the shared representation the
//! instrumenter rewrites and the tracer executes. See SPEC_FULL.md for why
//! this workspace owns its own format instead of a foreign VM's bytes.

pub mod builder;
pub mod cdg;
pub mod cfg;
pub mod code_object;
pub mod error;
pub mod module;
pub mod opcode;
pub mod seed_pool;
pub mod value;

pub use builder::CodeObjectBuilder;
pub use cdg::ControlDependenceGraph;
pub use cfg::ControlFlowGraph;
pub use code_object::{BasicBlock, BlockId, CodeObject};
pub use error::BytecodeError;
pub use module::Module;
pub use opcode::{BinOp, BranchKind, Callee, CodeObjectId, CompareKind, Instruction, LineId, PredicateId, UnOp};
pub use seed_pool::SeedPool;
pub use value::Value;
