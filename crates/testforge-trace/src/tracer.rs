// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::TraceError;
use crate::interpreter::{Interpreter, NativeRegistry};
use crate::sink::{with_sink, TraceSink};
use crate::trace::{ExecutionTrace, StatementOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use testforge_bytecode::{CodeObjectId, Module, Value};
use tracing::{debug, warn};

/// An invocation argument: either a value already known before the test case
/// starts running (a literal, or a value built by pure statement-level data
/// manipulation), or the result of an earlier invocation in the same
/// sequence, named by its arena slot. The latter can only be resolved once
/// that earlier invocation has actually executed, which is why invocations
/// run strictly in order on the worker thread (spec.md §4.2, §9 "Global
/// mutable state" is irrelevant here — this is per-test-case sequencing).
#[derive(Debug, Clone)]
pub enum InvocationArg {
    Known(Value),
    FromSlot(u32),
}

/// What one lowered test-case statement does. `Call` is the only variant
/// that actually runs target-module bytecode (and so the only one a trace
/// event can be attributed to); `Identity` and `List` let `testforge-core`
/// lower pure data-manipulation statements (assignment, field read,
/// collection construction) into the same sequential slot-resolution
/// mechanism without this crate ever depending on the test-case model
/// (spec.md component table: Tracer sits below Type/Callable Cluster and
/// the GA, not above them).
#[derive(Debug, Clone)]
pub enum Step {
    Call { code_object: CodeObjectId, args: Vec<InvocationArg> },
    Identity(InvocationArg),
    List(Vec<InvocationArg>),
}

/// One statement of a test case lowered to a runnable step. `slot` is the
/// arena index this invocation's result is stored at, so later steps'
/// `FromSlot` args can resolve it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub slot: u32,
    pub step: Step,
}

#[derive(Debug, Clone, Copy)]
pub struct TracerConfig {
    pub per_statement_timeout: Duration,
    pub per_test_timeout: Duration,
    pub abort_grace: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            per_statement_timeout: Duration::from_millis(500),
            per_test_timeout: Duration::from_secs(5),
            abort_grace: Duration::from_millis(250),
        }
    }
}

enum WorkerMsg {
    StatementDone(StatementOutcome),
    Finished,
}

/// Runs a test case's statement sequence against an instrumented module on a
/// dedicated worker thread, enforcing both the per-statement and per-test
/// deadlines from spec.md §5. On either deadline, a cooperative abort flag is
/// raised; if the worker does not observe it within `abort_grace`, the
/// thread is abandoned (never joined) and the trace collected so far is
/// returned with the timing statement marked `timed_out`.
pub struct Tracer {
    config: TracerConfig,
}

impl Tracer {
    pub fn new(config: TracerConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        module: Arc<Module>,
        natives: Arc<NativeRegistry>,
        known_values: HashMap<u32, Value>,
        invocations: Vec<Invocation>,
    ) -> ExecutionTrace {
        let sink = TraceSink::new();
        let abort = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<WorkerMsg>();

        let worker_sink = sink.clone();
        let worker_abort = abort.clone();
        let handle = std::thread::spawn(move || {
            with_sink(worker_sink, || {
                let interpreter_abort = worker_abort;
                let mut values = known_values;
                let resolve = |values: &HashMap<u32, Value>, a: &InvocationArg| match a {
                    InvocationArg::Known(v) => v.clone(),
                    InvocationArg::FromSlot(slot) => values.get(slot).cloned().unwrap_or(Value::None),
                };
                for (pos, invocation) in invocations.into_iter().enumerate() {
                    let started = Instant::now();
                    let result = match &invocation.step {
                        Step::Call { code_object, args } => {
                            let args: Vec<Value> = args.iter().map(|a| resolve(&values, a)).collect();
                            let interpreter = Interpreter::new(&module, &natives, &interpreter_abort);
                            interpreter.execute(*code_object, &args, invocation.slot).map_err(|e| e.to_string())
                        }
                        Step::Identity(arg) => Ok(resolve(&values, arg)),
                        Step::List(items) => Ok(Value::List(items.iter().map(|a| resolve(&values, a)).collect())),
                    };
                    if let Ok(ref v) = result {
                        values.insert(invocation.slot, v.clone());
                    }
                    let outcome = StatementOutcome {
                        statement_pos: pos as u32,
                        result,
                        elapsed: started.elapsed(),
                        timed_out: false,
                    };
                    let aborted = matches!(outcome.result, Err(ref m) if m.contains("aborted"));
                    if tx.send(WorkerMsg::StatementDone(outcome)).is_err() || aborted {
                        return;
                    }
                }
                let _ = tx.send(WorkerMsg::Finished);
            });
        });

        let test_deadline = Instant::now() + self.config.per_test_timeout;
        let mut timed_out = false;
        loop {
            let remaining_for_test = test_deadline.saturating_duration_since(Instant::now());
            let wait = remaining_for_test.min(self.config.per_statement_timeout);
            match rx.recv_timeout(wait) {
                Ok(WorkerMsg::StatementDone(_)) => {
                    if Instant::now() >= test_deadline {
                        warn!("test case exceeded its per-test timeout");
                        timed_out = true;
                        break;
                    }
                    continue;
                }
                Ok(WorkerMsg::Finished) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    warn!("statement exceeded its timeout; requesting cooperative abort");
                    timed_out = true;
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        if timed_out {
            abort.store(true, Ordering::Relaxed);
            match rx.recv_timeout(self.config.abort_grace) {
                Ok(_) => debug!("worker honored cooperative abort within grace interval"),
                Err(_) => warn!("worker did not honor abort within grace interval; abandoning thread"),
            }
            drop(handle);
        } else {
            let _ = handle.join();
        }

        let mut trace = sink.snapshot();
        if timed_out {
            trace.statements.push(StatementOutcome {
                statement_pos: trace.statements.len() as u32,
                result: Err("timed out".to_string()),
                elapsed: self.config.per_statement_timeout,
                timed_out: true,
            });
        }
        trace
    }
}
