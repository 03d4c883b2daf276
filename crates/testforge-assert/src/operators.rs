// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! The mutation-operator catalog (spec.md §4.8 phase 2), expressed directly
//! over this workspace's own bytecode rather than translated from a
//! source-level AST mutator: every operator here rewrites or deletes a
//! single [`Instruction`] in place. Two of the catalog's source-level
//! operators — decorator removal and super-call removal — have no
//! counterpart at this level (a compiled code object carries no decorator
//! or super-call site tag) and are intentionally not implemented; see
//! DESIGN.md.

use testforge_bytecode::{BranchKind, CodeObjectId, CompareKind, Instruction, Module};

/// Every operator name this module knows, in the order spec.md §4.8
/// introduces them. `GeneratorConfig::mutation_operators` names a subset by
/// these strings; an empty list (the default) means "all of them". The
/// canonical list lives in `testforge_core::operator_catalog` so
/// `GeneratorConfig::validate` can check against it without this crate
/// depending back on `testforge-core` in the wrong direction.
pub const ALL_OPERATORS: &[&str] = testforge_core::operator_catalog::ALL_OPERATORS;

/// One instruction-level edit: where it applies and what it does there.
#[derive(Debug, Clone)]
pub struct MutationPatch {
    pub code_object: CodeObjectId,
    pub block: u32,
    pub instruction_index: usize,
    pub operator: &'static str,
    pub replacement: Replacement,
}

#[derive(Debug, Clone)]
pub enum Replacement {
    Replace(Instruction),
    Delete,
}

impl MutationPatch {
    /// Two patches touch the same site when they'd edit the same
    /// instruction slot — higher-order composition requires disjoint sites
    /// so applying both unambiguously applies both (spec.md §3 supplement
    /// "higher-order mutant composition").
    pub fn overlaps(&self, other: &MutationPatch) -> bool {
        self.code_object == other.code_object && self.block == other.block && self.instruction_index == other.instruction_index
    }
}

/// Enumerates every patch every enabled operator can produce against
/// `module`, one patch per mutation site.
pub fn enumerate(module: &Module, enabled: &[String]) -> Vec<MutationPatch> {
    let wanted = |name: &str| enabled.is_empty() || enabled.iter().any(|o| o == name);
    let mut out = Vec::new();
    for code in module.iter() {
        if code.skipped {
            continue;
        }
        for block in &code.blocks {
            for (idx, instr) in block.instructions.iter().enumerate() {
                if wanted("arithmetic_replace") {
                    out.extend(arithmetic_replace(code.id, block.id, idx, instr));
                }
                if wanted("unary_delete") {
                    out.extend(unary_delete(code.id, block.id, idx, instr));
                }
                if wanted("compare_replace") {
                    out.extend(compare_replace(code.id, block.id, idx, instr));
                }
                if wanted("boolean_swap") {
                    out.extend(boolean_swap(code.id, block.id, idx, instr));
                }
                if wanted("logical_negation_delete") {
                    out.extend(logical_negation_delete(code.id, block.id, idx, instr));
                }
                if wanted("branch_invert") {
                    out.extend(branch_invert(code.id, block.id, idx, instr));
                }
                if wanted("exception_type_swap") {
                    out.extend(exception_type_swap(code.id, block.id, idx, instr));
                }
                if wanted("constant_tweak") {
                    out.extend(constant_tweak(code.id, block.id, idx, instr));
                }
            }
        }
    }
    out
}

fn patch(code_object: CodeObjectId, block: u32, instruction_index: usize, operator: &'static str, replacement: Replacement) -> MutationPatch {
    MutationPatch { code_object, block, instruction_index, operator, replacement }
}

/// Arithmetic-operator replacement: `+`<->`-`, and `*`/`%` toward `/` (spec.md
/// §4.8 catalog). `And`/`Or` are handled by [`boolean_swap`] instead.
fn arithmetic_replace(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    use testforge_bytecode::BinOp::*;
    let Instruction::BinaryOp(op) = instr else { return vec![] };
    let replacement = match op {
        Add => Some(Sub),
        Sub => Some(Add),
        Mul => Some(Div),
        Div => Some(Mul),
        Mod => Some(Mul),
        And | Or => None,
    };
    replacement
        .map(|r| vec![patch(co, block, idx, "arithmetic_replace", Replacement::Replace(Instruction::BinaryOp(r)))])
        .unwrap_or_default()
}

fn boolean_swap(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    use testforge_bytecode::BinOp::*;
    match instr {
        Instruction::BinaryOp(And) => vec![patch(co, block, idx, "boolean_swap", Replacement::Replace(Instruction::BinaryOp(Or)))],
        Instruction::BinaryOp(Or) => vec![patch(co, block, idx, "boolean_swap", Replacement::Replace(Instruction::BinaryOp(And)))],
        _ => vec![],
    }
}

/// Unary-operator deletion: drop a negation outright (spec.md §4.8). Safe to
/// remove in place — jump targets in this bytecode name block ids, not
/// instruction offsets, so deleting an instruction never invalidates a jump.
fn unary_delete(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    match instr {
        Instruction::UnaryOp(testforge_bytecode::UnOp::Neg) => vec![patch(co, block, idx, "unary_delete", Replacement::Delete)],
        _ => vec![],
    }
}

/// Logical-negation deletion: drop a boolean `not` (spec.md §4.8), kept
/// distinct from [`unary_delete`] since the catalog lists it separately.
fn logical_negation_delete(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    match instr {
        Instruction::UnaryOp(testforge_bytecode::UnOp::Not) => {
            vec![patch(co, block, idx, "logical_negation_delete", Replacement::Delete)]
        }
        _ => vec![],
    }
}

/// Comparison-operator replacement (spec.md §4.8): `==`<->`!=`, `<`<->`>=`,
/// `<=`<->`>`. `in`/`is`/exception-match comparisons have no natural
/// complementary pair and are left alone.
fn compare_replace(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    let swapped = |k: CompareKind| -> Option<CompareKind> {
        use CompareKind::*;
        match k {
            Eq => Some(Ne),
            Ne => Some(Eq),
            Lt => Some(Ge),
            Ge => Some(Lt),
            Le => Some(Gt),
            Gt => Some(Le),
            In | Is | ExceptionMatch => None,
        }
    };
    match instr {
        Instruction::Compare(k) => swapped(*k)
            .map(|r| vec![patch(co, block, idx, "compare_replace", Replacement::Replace(Instruction::Compare(r)))])
            .unwrap_or_default(),
        Instruction::JumpIfFalse { predicate, kind: BranchKind::Compare(k), target } => swapped(*k)
            .map(|r| {
                vec![patch(
                    co,
                    block,
                    idx,
                    "compare_replace",
                    Replacement::Replace(Instruction::JumpIfFalse { predicate: *predicate, kind: BranchKind::Compare(r), target: *target }),
                )]
            })
            .unwrap_or_default(),
        _ => vec![],
    }
}

/// Folds "loop break<->continue" swap and "except-handler removal" into one
/// operator: both amount to inverting which side of a single-operand
/// predicate is taken, restricted to the non-comparison `BranchKind`s this
/// bytecode already groups by operand arity (spec.md §4.8; see DESIGN.md for
/// why these two source-level operators collapse to the same bytecode-level
/// edit here).
fn branch_invert(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    let Instruction::JumpIfFalse { predicate, kind, target } = instr else { return vec![] };
    let inverted = match kind {
        BranchKind::Truthy => Some(BranchKind::Falsy),
        BranchKind::Falsy => Some(BranchKind::Truthy),
        BranchKind::LoopExit => Some(BranchKind::Falsy),
        BranchKind::ExceptionMatch => Some(BranchKind::Truthy),
        BranchKind::Compare(_) => None,
    };
    inverted
        .map(|k| {
            vec![patch(
                co,
                block,
                idx,
                "branch_invert",
                Replacement::Replace(Instruction::JumpIfFalse { predicate: *predicate, kind: k, target: *target }),
            )]
        })
        .unwrap_or_default()
}

const EXCEPTION_CATALOG: &[&str] =
    &["ValueError", "TypeError", "IndexError", "KeyError", "ZeroDivisionError", "AttributeError", "RuntimeError", "StopIteration"];

/// Exception-type swap (spec.md §4.8): rotate a raised exception's type name
/// to the next entry in a small, fixed catalog.
fn exception_type_swap(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    let Instruction::Raise(kind) = instr else { return vec![] };
    let next = match EXCEPTION_CATALOG.iter().position(|&k| k == kind) {
        Some(i) => EXCEPTION_CATALOG[(i + 1) % EXCEPTION_CATALOG.len()],
        None => EXCEPTION_CATALOG[0],
    };
    if next == kind {
        return vec![];
    }
    vec![patch(co, block, idx, "exception_type_swap", Replacement::Replace(Instruction::Raise(next.to_string())))]
}

/// Constant tweaks: off-by-one on numbers, empty-string, and none-injection
/// (spec.md §4.8), one patch per applicable tweak so each is its own mutant.
fn constant_tweak(co: CodeObjectId, block: u32, idx: usize, instr: &Instruction) -> Vec<MutationPatch> {
    use testforge_bytecode::Value;
    let Instruction::LoadConst(value) = instr else { return vec![] };
    let mut out = Vec::new();
    let load = |v: Value| Replacement::Replace(Instruction::LoadConst(v));
    match value {
        Value::Int(i) => {
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Int(i + 1))));
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Int(i - 1))));
        }
        Value::Float(f) => {
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Float(f + 1.0))));
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Float(f - 1.0))));
        }
        Value::Str(s) if !s.is_empty() => {
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Str(String::new()))));
        }
        Value::Bool(b) => {
            out.push(patch(co, block, idx, "constant_tweak", load(Value::Bool(!b))));
        }
        _ => {}
    }
    if !matches!(value, Value::None) {
        out.push(patch(co, block, idx, "constant_tweak", load(Value::None)));
    }
    out
}
