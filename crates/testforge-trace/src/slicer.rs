// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::trace::ExecutionTrace;
use std::collections::{BTreeSet, HashMap};
use testforge_bytecode::CodeObjectId;

/// Computes a dynamic backward slice over an execution trace's access log
/// (spec.md §4.9): given a statement position, which earlier statements'
/// writes could have influenced the value read there. Checked coverage and
/// assertion-candidate filtering both key off "is this statement in the
/// slice of an observed value" rather than raw line coverage.
pub struct DynamicSlicer;

impl DynamicSlicer {
    /// Backward slice rooted at `target_statement`: the set of statement
    /// positions (including the target) whose writes transitively reach a
    /// read performed at or before the target, keyed by memory slot.
    pub fn slice(&self, trace: &ExecutionTrace, target_statement: u32) -> BTreeSet<u32> {
        let mut last_writer: HashMap<(CodeObjectId, u16), u32> = HashMap::new();
        let mut influences: BTreeSet<u32> = BTreeSet::new();
        influences.insert(target_statement);

        for event in &trace.access_log {
            if event.statement_pos > target_statement {
                break;
            }
            let key = (event.code_object, event.slot);
            if influences.contains(&event.statement_pos) {
                if let Some(&writer) = last_writer.get(&key) {
                    influences.insert(writer);
                }
            }
            last_writer.insert(key, event.statement_pos);
        }
        influences
    }

    /// True when any access on `(code_object, slot)` was recorded for
    /// `statement`, used by checked coverage to decide whether a statement
    /// "checks" a value at all.
    pub fn touches_slot(&self, trace: &ExecutionTrace, statement: u32, code_object: CodeObjectId, slot: u16) -> bool {
        trace.access_log.iter().any(|e| e.statement_pos == statement && e.code_object == code_object && e.slot == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::ExecutionTrace;

    #[test]
    fn slice_includes_last_writer_of_each_read_slot() {
        let mut trace = ExecutionTrace::new();
        trace.record_access(0, 7, 1); // statement 0 writes/reads code object 7's slot 1
        trace.record_access(1, 7, 2); // statement 1 writes/reads slot 2
        trace.record_access(2, 7, 1); // statement 2 reads slot 1 again

        let slice = DynamicSlicer.slice(&trace, 2);
        assert!(slice.contains(&0));
        assert!(slice.contains(&2));
    }

    #[test]
    fn slots_in_different_code_objects_do_not_alias() {
        let mut trace = ExecutionTrace::new();
        trace.record_access(0, 1, 0); // statement 0 writes code object 1's slot 0
        trace.record_access(1, 2, 0); // statement 1 writes a *different* code object's slot 0
        trace.record_access(2, 2, 0); // statement 2 reads code object 2's slot 0 again

        let slice = DynamicSlicer.slice(&trace, 2);
        assert!(slice.contains(&1));
        assert!(!slice.contains(&0), "statement 0 touches an unrelated code object's slot 0");
    }
}
