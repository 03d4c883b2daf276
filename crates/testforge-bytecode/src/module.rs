// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::code_object::CodeObject;
use crate::opcode::CodeObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A target module: a flat collection of code objects plus the module path it
/// was loaded from. Nested code objects (closures, comprehensions) are
/// flattened into this map and addressed by their own id, mirroring the
/// "recursively into nested code objects" traversal of spec.md §4.1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub qualified_name: String,
    pub code_objects: BTreeMap<CodeObjectId, CodeObject>,
}

impl Module {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self { qualified_name: qualified_name.into(), code_objects: BTreeMap::new() }
    }

    pub fn insert(&mut self, code_object: CodeObject) {
        self.code_objects.insert(code_object.id, code_object);
    }

    pub fn get(&self, id: CodeObjectId) -> Option<&CodeObject> {
        self.code_objects.get(&id)
    }

    pub fn get_mut(&mut self, id: CodeObjectId) -> Option<&mut CodeObject> {
        self.code_objects.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeObject> {
        self.code_objects.values()
    }
}
