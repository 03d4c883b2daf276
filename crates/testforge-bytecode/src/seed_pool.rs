// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use parking_lot::Mutex;
use std::sync::Arc;
use crate::value::Value;

/// Append-only, thread-safe constant pool fed by the dynamic-seeding
/// adapter (spec.md §4.1.4) and consumed by the test-case factory's
/// primitive-generation pools (spec.md §4.3). Cloning shares the underlying
/// storage, matching the "process-wide... thread-safe" sharing described in
/// spec.md §5.
#[derive(Clone, Default)]
pub struct SeedPool {
    inner: Arc<Mutex<Vec<Value>>>,
}

impl SeedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: Value) {
        self.inner.lock().push(value);
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
