// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Deadline-bounded execution of instrumented code objects (spec.md §4.2,
//! §5): the interpreter runs a statement, instrumentation markers feed a
//! thread-local trace sink, and the tracer wraps the whole sequence in a
//! worker thread with cooperative per-statement/per-test timeouts.

pub mod distance;
pub mod error;
pub mod interpreter;
pub mod sink;
pub mod slicer;
pub mod tracer;
pub mod trace;

pub use distance::{branch_distance, levenshtein, normalize};
pub use error::TraceError;
pub use interpreter::{Interpreter, NativeCallable, NativeRegistry, MAX_BRANCH_DISTANCE};
pub use sink::TraceSink;
pub use slicer::DynamicSlicer;
pub use trace::{AccessEvent, ExecutionTrace, StatementOutcome};
pub use tracer::{Invocation, InvocationArg, Step, Tracer, TracerConfig};
