// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::TraceError;
use crate::sink::with_current;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use testforge_bytecode::{BasicBlock, BinOp, Callee, CodeObject, CodeObjectId, Instruction, Module, UnOp, Value};

/// A native (non-instrumented) callable the interpreter can invoke for
/// `Callee::Native` call sites — the interpreter's analogue of the host
/// runtime's standard library and builtins.
pub trait NativeCallable: Send + Sync {
    fn call(&self, args: &[Value]) -> Result<Value, TraceError>;
}

pub type NativeRegistry = HashMap<u32, Arc<dyn NativeCallable>>;

/// The maximal branch distance substituted for a comparison the VM cannot
/// subtract (heterogeneous types), per spec.md DESIGN NOTES.
pub const MAX_BRANCH_DISTANCE: f64 = 1e7;

/// Executes instrumented code objects as a plain stack machine, dispatching
/// instrumentation markers to the thread's active [`crate::sink::TraceSink`]
/// (spec.md §4.2: "the Tracer... produces an execution trace"). One
/// `Interpreter` is shared read-only across statements of a test case; all
/// mutable state lives on the call stack of `execute`.
pub struct Interpreter<'a> {
    module: &'a Module,
    natives: &'a NativeRegistry,
    abort: &'a AtomicBool,
}

impl<'a> Interpreter<'a> {
    pub fn new(module: &'a Module, natives: &'a NativeRegistry, abort: &'a AtomicBool) -> Self {
        Self { module, natives, abort }
    }

    /// Executes `code_object` with `args`, tagging every access/branch event
    /// with `statement_pos` (the position of this call within the enclosing
    /// test case) so the slicer can later attribute it.
    pub fn execute(&self, code_object: CodeObjectId, args: &[Value], statement_pos: u32) -> Result<Value, TraceError> {
        let code = self.module.get(code_object).ok_or(TraceError::UnknownCodeObject(code_object))?;
        with_current(|sink| sink.on_code_object(code_object));
        self.run_code_object(code, args, statement_pos)
    }

    fn run_code_object(&self, code: &CodeObject, args: &[Value], statement_pos: u32) -> Result<Value, TraceError> {
        let mut locals: Vec<Value> = vec![Value::None; code.num_locals as usize];
        for (i, arg) in args.iter().take(code.num_params as usize).enumerate() {
            locals[i] = arg.clone();
        }
        let mut stack: Vec<Value> = Vec::new();
        let mut block_id = code.entry;

        loop {
            if self.abort.load(Ordering::Relaxed) {
                return Err(TraceError::Aborted);
            }
            let block = code.blocks.get(block_id as usize).ok_or(TraceError::InvalidJumpTarget(block_id))?;
            match self.run_block(code, block, &mut stack, &mut locals, statement_pos)? {
                BlockOutcome::Fallthrough => block_id += 1,
                BlockOutcome::Jump(target) => block_id = target,
                BlockOutcome::Return(value) => return Ok(value),
                BlockOutcome::Raise(message) => return Err(TraceError::Raised(message)),
            }
        }
    }

    fn run_block(
        &self,
        code: &CodeObject,
        block: &BasicBlock,
        stack: &mut Vec<Value>,
        locals: &mut [Value],
        statement_pos: u32,
    ) -> Result<BlockOutcome, TraceError> {
        for instr in &block.instructions {
            match instr {
                Instruction::LoadConst(v) => stack.push(v.clone()),
                Instruction::LoadArg(i) => stack.push(locals[*i as usize].clone()),
                Instruction::LoadLocal(i) => stack.push(locals[*i as usize].clone()),
                Instruction::StoreLocal(i) => {
                    let v = pop(stack, code.id)?;
                    locals[*i as usize] = v;
                }
                Instruction::LoadAttr(i, _field) => stack.push(locals[*i as usize].clone()),
                Instruction::StoreAttr(i, _field) => {
                    let v = pop(stack, code.id)?;
                    locals[*i as usize] = v;
                }
                Instruction::BinaryOp(op) => {
                    let rhs = pop(stack, code.id)?;
                    let lhs = pop(stack, code.id)?;
                    stack.push(eval_binary(*op, &lhs, &rhs)?);
                }
                Instruction::UnaryOp(op) => {
                    let v = stack.last().cloned().ok_or(TraceError::StackUnderflow(code.id))?;
                    *stack.last_mut().unwrap() = eval_unary(*op, &v)?;
                }
                Instruction::Compare(kind) => {
                    let rhs = pop(stack, code.id)?;
                    let lhs = pop(stack, code.id)?;
                    let taken = crate::distance::branch_distance(
                        testforge_bytecode::BranchKind::Compare(*kind),
                        &[lhs, rhs],
                        MAX_BRANCH_DISTANCE,
                    ) == 0.0;
                    stack.push(Value::Bool(taken));
                }
                Instruction::Dup => {
                    let v = stack.last().cloned().ok_or(TraceError::StackUnderflow(code.id))?;
                    stack.push(v);
                }
                Instruction::Pop => {
                    pop(stack, code.id)?;
                }
                Instruction::Call { callee, argc } => {
                    let mut call_args = Vec::with_capacity(*argc as usize);
                    for _ in 0..*argc {
                        call_args.push(pop(stack, code.id)?);
                    }
                    call_args.reverse();
                    let result = match callee {
                        Callee::CodeObject(id) => self.execute(*id, &call_args, statement_pos)?,
                        Callee::Native(id) => {
                            let native =
                                self.natives.get(id).ok_or(TraceError::NativeCallUnresolved(*id))?;
                            native.call(&call_args)?
                        }
                    };
                    stack.push(result);
                }
                Instruction::Return => {
                    let v = pop(stack, code.id)?;
                    return Ok(BlockOutcome::Return(v));
                }
                Instruction::Raise(message) => return Ok(BlockOutcome::Raise(message.clone())),
                Instruction::JumpIfFalse { predicate, kind, target } => {
                    let n = kind.operand_count() as usize;
                    if stack.len() < n {
                        return Err(TraceError::StackUnderflow(code.id));
                    }
                    let operands: Vec<Value> = stack.split_off(stack.len() - n);
                    let taken = crate::distance::branch_distance(*kind, &operands, MAX_BRANCH_DISTANCE) == 0.0;
                    with_current(|sink| sink.on_branch(*kind, *predicate, &operands, MAX_BRANCH_DISTANCE));
                    if !taken {
                        return Ok(BlockOutcome::Jump(*target));
                    }
                }
                Instruction::Jump(target) => return Ok(BlockOutcome::Jump(*target)),
                Instruction::TrackLine(line) => with_current(|sink| sink.on_line(*line)),
                Instruction::TrackAccess { slot, .. } => {
                    with_current(|sink| sink.on_access(statement_pos, code.id, *slot))
                }
                Instruction::Seed(value) => with_current(|sink| sink.on_seed(value.clone())),
                Instruction::Unwrap { .. } => {}
                Instruction::EnteredBranchless(id) => with_current(|sink| sink.on_branchless(*id)),
            }
        }
        Ok(BlockOutcome::Fallthrough)
    }
}

enum BlockOutcome {
    Fallthrough,
    Jump(u32),
    Return(Value),
    Raise(String),
}

fn pop(stack: &mut Vec<Value>, code_object: CodeObjectId) -> Result<Value, TraceError> {
    stack.pop().ok_or(TraceError::StackUnderflow(code_object))
}

fn eval_binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, TraceError> {
    use Value::*;
    let result = match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => Int(a + b),
        (BinOp::Add, Float(a), Float(b)) => Float(a + b),
        (BinOp::Add, Str(a), Str(b)) => Str(format!("{a}{b}")),
        (BinOp::Sub, Int(a), Int(b)) => Int(a - b),
        (BinOp::Sub, Float(a), Float(b)) => Float(a - b),
        (BinOp::Mul, Int(a), Int(b)) => Int(a * b),
        (BinOp::Mul, Float(a), Float(b)) => Float(a * b),
        (BinOp::Div, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(TraceError::Raised("ZeroDivisionError".into()));
            }
            Int(a / b)
        }
        (BinOp::Div, Float(a), Float(b)) => Float(a / b),
        (BinOp::Mod, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(TraceError::Raised("ZeroDivisionError".into()));
            }
            Int(a % b)
        }
        (BinOp::And, Bool(a), Bool(b)) => Bool(*a && *b),
        (BinOp::Or, Bool(a), Bool(b)) => Bool(*a || *b),
        _ => return Err(TraceError::Raised(format!("TypeError: unsupported operand types for {op:?}"))),
    };
    Ok(result)
}

fn eval_unary(op: UnOp, v: &Value) -> Result<Value, TraceError> {
    match (op, v) {
        (UnOp::Neg, Value::Int(a)) => Ok(Value::Int(-a)),
        (UnOp::Neg, Value::Float(a)) => Ok(Value::Float(-a)),
        (UnOp::Not, other) => Ok(Value::Bool(!other.is_truthy())),
        _ => Err(TraceError::Raised("TypeError: unsupported operand type for unary op".into())),
    }
}
