// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors the assertion generator can surface (spec.md §7 "Assertion-phase
/// mismatch": a test no longer replays against the callable cluster it was
/// generated from). Everything else the generator does is best-effort and
/// degrades to "fewer assertions" rather than a hard error.
#[derive(Debug, Error)]
pub enum AssertError {
    #[error("test case at suite index {0} could not be replayed: {1}")]
    ReplayFailed(usize, String),
    #[error("mutant module has no code object {0}")]
    UnknownCodeObject(u32),
}
