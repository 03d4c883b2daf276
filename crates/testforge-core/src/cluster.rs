// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::types::{CallableDescriptor, TypeInfo, Visibility};
use indexmap::IndexMap;

/// Enumerates the callables under test and offers the lookup service the
/// factory needs during back-chaining synthesis (spec.md §3 "Type / Callable
/// Cluster"). Built once from the instrumented module's public surface and
/// never mutated afterwards.
#[derive(Debug, Default, Clone)]
pub struct CallableCluster {
    callables: IndexMap<String, CallableDescriptor>,
}

impl CallableCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callable: CallableDescriptor) {
        self.callables.insert(callable.qualified_name.clone(), callable);
    }

    pub fn get(&self, qualified_name: &str) -> Option<&CallableDescriptor> {
        self.callables.get(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallableDescriptor> {
        self.callables.values()
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    /// Public, target-module callables the GA may pick as entry points —
    /// `include_methods`/`exclude_methods` config filtering (spec.md §6) is
    /// applied by the caller over this view.
    pub fn entry_points(&self) -> impl Iterator<Item = &CallableDescriptor> {
        self.callables.values().filter(|c| c.visibility == Visibility::Public)
    }

    /// Callables whose return type is compatible with `target`, used by the
    /// factory when it needs to synthesize a value rather than reuse one
    /// in scope (spec.md §4.3).
    pub fn producers_of(&self, target: &TypeInfo) -> Vec<&CallableDescriptor> {
        self.callables.values().filter(|c| c.return_type.is_compatible_with(target)).collect()
    }
}
