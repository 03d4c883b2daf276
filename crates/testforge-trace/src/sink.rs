// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::trace::ExecutionTrace;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::Arc;
use testforge_bytecode::{BranchKind, CodeObjectId, LineId, PredicateId, Value};

/// Where the interpreter sends instrumentation events while it executes a
/// code object. Mirrors the host runtime's thread-local "current tracer"
/// slot (spec.md §5): each worker thread installs its own sink before
/// running a statement, so events raised on any other thread are simply
/// invisible rather than requiring an explicit origin check.
pub struct TraceSink {
    trace: Mutex<ExecutionTrace>,
}

impl TraceSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { trace: Mutex::new(ExecutionTrace::new()) })
    }

    pub fn on_code_object(&self, id: CodeObjectId) {
        self.trace.lock().record_code_object(id);
    }

    pub fn on_line(&self, line: LineId) {
        self.trace.lock().record_line(line);
    }

    pub fn on_branchless(&self, id: CodeObjectId) {
        self.trace.lock().record_branchless(id);
    }

    pub fn on_access(&self, statement_pos: u32, code_object: CodeObjectId, slot: u16) {
        self.trace.lock().record_access(statement_pos, code_object, slot);
    }

    pub fn on_seed(&self, value: Value) {
        self.trace.lock().record_seed(value);
    }

    pub fn on_branch(&self, kind: BranchKind, predicate: PredicateId, operands: &[Value], max_distance: f64) {
        let raw_true = if branch_taken(kind, operands) {
            0.0
        } else {
            crate::distance::branch_distance(kind, operands, max_distance)
        };
        let raw_false = if branch_taken(kind, operands) {
            crate::distance::branch_distance(kind, operands, max_distance)
        } else {
            0.0
        };
        self.trace.lock().record_branch(predicate, raw_true, raw_false);
    }

    pub fn into_trace(self: Arc<Self>) -> ExecutionTrace {
        match Arc::try_unwrap(self) {
            Ok(sink) => sink.trace.into_inner(),
            Err(shared) => shared.trace.lock().clone(),
        }
    }

    pub fn snapshot(&self) -> ExecutionTrace {
        self.trace.lock().clone()
    }
}

fn branch_taken(kind: BranchKind, operands: &[Value]) -> bool {
    match kind {
        BranchKind::Compare(cmp) => compare_taken(cmp, &operands[0], &operands[1]),
        BranchKind::Truthy => operands[0].is_truthy(),
        BranchKind::Falsy => !operands[0].is_truthy(),
        BranchKind::LoopExit => !operands[0].is_truthy(),
        BranchKind::ExceptionMatch => operands[0] == operands[1],
    }
}

fn compare_taken(kind: testforge_bytecode::CompareKind, left: &Value, right: &Value) -> bool {
    use std::cmp::Ordering::*;
    use testforge_bytecode::CompareKind as K;
    match kind {
        K::Eq => left == right,
        K::Ne => left != right,
        K::Is => left == right,
        K::ExceptionMatch => left == right,
        K::In => match right {
            Value::List(items) => items.contains(left),
            Value::Str(s) => matches!(left, Value::Str(needle) if s.contains(needle.as_str())),
            _ => false,
        },
        K::Lt => matches!(left.partial_cmp_value(right), Some(Less)),
        K::Le => matches!(left.partial_cmp_value(right), Some(Less) | Some(Equal)),
        K::Gt => matches!(left.partial_cmp_value(right), Some(Greater)),
        K::Ge => matches!(left.partial_cmp_value(right), Some(Greater) | Some(Equal)),
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<TraceSink>>> = const { RefCell::new(None) };
}

/// Installs `sink` as the active sink for the current thread for the
/// duration of `f`, restoring whatever was previously installed afterwards.
/// Supports the tracer's worker-thread model: each worker owns its own
/// thread-local slot, so sinks never cross threads.
pub fn with_sink<R>(sink: Arc<TraceSink>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|cell| cell.borrow_mut().replace(sink));
    let result = f();
    CURRENT.with(|cell| *cell.borrow_mut() = previous);
    result
}

/// Runs `f` with the current thread's active sink, if any. Markers executed
/// with no sink installed (e.g. while warming up the interpreter, or on a
/// thread the tracer never handed a sink to) are silently dropped.
pub fn with_current(f: impl FnOnce(&TraceSink)) {
    CURRENT.with(|cell| {
        if let Some(sink) = cell.borrow().as_ref() {
            f(sink);
        }
    });
}
