// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Stable identifier for a predicate (conditional branch) within a module.
/// Used as the coverage-goal key for branch goals and as the archive key.
pub type PredicateId = u32;

/// Stable identifier for a source line within a module.
pub type LineId = u32;

/// Stable identifier for a code object (function/method/constructor body).
pub type CodeObjectId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Is,
    ExceptionMatch,
}

/// The kind of predicate a branch adapter must specialize for, per spec.md
/// §4.1: comparisons get operand-aware branch distance; everything else gets
/// a specialized truthy/falsy/loop-exit/exception-match tracer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Compare(CompareKind),
    Truthy,
    Falsy,
    LoopExit,
    ExceptionMatch,
}

impl BranchKind {
    /// How many operands `JumpIfFalse` pops directly (and passes to the
    /// tracer) for this kind: two for a comparison, one for everything else
    /// (truthy/falsy/loop-exit/exception-match evaluate a single value).
    /// `JumpIfFalse` performs the comparison and the jump as a single
    /// instruction specifically so the tracer sees raw operands rather than
    /// an already-collapsed boolean (spec.md §4.2 branch-distance functions
    /// need both operands).
    pub fn operand_count(&self) -> u16 {
        match self {
            BranchKind::Compare(_) => 2,
            BranchKind::Truthy | BranchKind::Falsy | BranchKind::LoopExit | BranchKind::ExceptionMatch => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

/// Identifies a callable another instruction may invoke. Native (non-
/// instrumented) callees are tagged `Native` so the unwrap adapter knows to
/// rewrite the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    CodeObject(CodeObjectId),
    Native(u32),
}

/// A single instruction in a [`crate::code_object::BasicBlock`].
///
/// Instrumentation markers (`TrackLine`, `TrackBranchTrue`, ...) are first-
/// class variants rather than rewritten raw bytes: our bytecode is owned end
/// to end by this workspace, so "rewriting" an adapter in means inserting one
/// of these marker variants at the right point in the block. Each marker
/// variant is documented with the stack-shape transition its setup sequence
/// would need in a byte-rewriting VM, preserving the adapter-composition
/// contract from spec.md §4.1 even though no literal stack shuffling is
/// required here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    LoadConst(Value),
    LoadArg(u16),
    LoadLocal(u16),
    StoreLocal(u16),
    /// Load an attribute/field for the checked-coverage memory-access adapter.
    LoadAttr(u16, String),
    StoreAttr(u16, String),
    BinaryOp(BinOp),
    UnaryOp(UnOp),
    Compare(CompareKind),
    Dup,
    Pop,
    /// Call `callee` with `argc` arguments already pushed on the operand stack.
    Call { callee: Callee, argc: u16 },
    Return,
    /// Raise an exception of the given kind; `kind` mirrors a type name.
    Raise(String),
    /// Conditional jump: pops the raw operand(s) for `kind` (two for a
    /// comparison, one otherwise), evaluates the predicate, and jumps to
    /// `target` if it is false. Operands are taken raw — not pre-reduced to
    /// a bool — so the instrumented interpreter can hand both sides to the
    /// tracer for branch-distance computation (spec.md §4.2).
    JumpIfFalse { predicate: PredicateId, kind: BranchKind, target: u32 },
    Jump(u32),

    // --- instrumentation markers (net-zero stack effect: a setup sequence of
    // "duplicate operands, call tracer, discard duplicates" in a byte-level
    // VM) ---
    /// Line-coverage adapter: emitted at the first instruction of each line.
    TrackLine(LineId),
    /// Checked-coverage adapter: emitted around a load/store of a local,
    /// attribute, or subscript so a backward slice can later be computed.
    TrackAccess { statement_pos: u32, slot: u16 },
    /// Dynamic-seeding adapter: captures a compared/argued value into the
    /// global constant pool.
    Seed(Value),
    /// Unwrap adapter: substitutes a transparent proxy argument with its
    /// underlying value before a call into native (non-instrumented) code.
    Unwrap { arg_index: u16 },
    /// Branchless-code-object adapter: emitted once, at the first
    /// instruction of a code object with no conditional jump.
    EnteredBranchless(CodeObjectId),
}

impl Instruction {
    /// Net operand-stack effect of this instruction, used to validate that an
    /// instrumentation chain leaves the stack balanced (spec.md §4.1).
    pub fn stack_effect(&self) -> i32 {
        match self {
            Instruction::LoadConst(_) => 1,
            Instruction::LoadArg(_) => 1,
            Instruction::LoadLocal(_) => 1,
            Instruction::StoreLocal(_) => -1,
            Instruction::LoadAttr(..) => 0,
            Instruction::StoreAttr(..) => -2,
            Instruction::BinaryOp(_) => -1,
            Instruction::UnaryOp(_) => 0,
            Instruction::Compare(_) => -1,
            Instruction::Dup => 1,
            Instruction::Pop => -1,
            Instruction::Call { argc, .. } => -(*argc as i32) + 1,
            Instruction::Return => -1,
            Instruction::Raise(_) => 0,
            Instruction::JumpIfFalse { kind, .. } => -(kind.operand_count() as i32),
            Instruction::Jump(_) => 0,
            // Instrumentation markers never touch the value stack: they read
            // operands by peeking, not popping.
            Instruction::TrackLine(_)
            | Instruction::TrackAccess { .. }
            | Instruction::Seed(_)
            | Instruction::Unwrap { .. }
            | Instruction::EnteredBranchless(_) => 0,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Instruction::TrackLine(_)
                | Instruction::TrackAccess { .. }
                | Instruction::Seed(_)
                | Instruction::Unwrap { .. }
                | Instruction::EnteredBranchless(_)
        )
    }
}
