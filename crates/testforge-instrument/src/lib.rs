// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

//! Bytecode instrumentation chain (spec.md §4.1): branch/line/checked
//! coverage, dynamic seeding, and native-call unwrapping, composed in a
//! fixed order over `testforge-bytecode` code objects.

pub mod adapter;
pub mod branch_adapter;
pub mod checked_adapter;
pub mod error;
pub mod instrumenter;
pub mod line_adapter;
pub mod module_finder;
pub mod seeding_adapter;
pub mod unwrap_adapter;
pub mod version;

pub use adapter::{Adapter, InstrumentContext};
pub use error::InstrumentError;
pub use instrumenter::{Instrumenter, InstrumentationOutcome, InstrumentationStats};
pub use module_finder::{ModuleFinder, TargetModuleFinder};
pub use version::{BytecodeVersion, V1};
