// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::goals::CoverageGoal;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use testforge_bytecode::{BlockId, CodeObjectId, ControlDependenceGraph, ControlFlowGraph, Module, PredicateId};
use testforge_trace::{normalize, DynamicSlicer, ExecutionTrace};

/// Per-code-object control-flow/control-dependence graphs, built once from
/// an instrumented module and reused for every fitness evaluation in the run
/// (spec.md §4.4 "approach level is the graph distance ... in the control-
/// dependence tree").
pub struct ProgramGraphs {
    cdgs: HashMap<CodeObjectId, ControlDependenceGraph>,
    predicate_location: HashMap<PredicateId, (CodeObjectId, BlockId)>,
    block_predicate: HashMap<(CodeObjectId, BlockId), PredicateId>,
}

impl ProgramGraphs {
    pub fn build(module: &Module) -> Self {
        let mut cdgs = HashMap::new();
        let mut predicate_location = HashMap::new();
        let mut block_predicate = HashMap::new();
        for code in module.iter() {
            if code.skipped {
                continue;
            }
            let cfg = ControlFlowGraph::build(code);
            let cdg = ControlDependenceGraph::build(&cfg);
            for block in &code.blocks {
                if let Some((predicate, _)) = block.predicate() {
                    predicate_location.insert(predicate, (code.id, block.id));
                    block_predicate.insert((code.id, block.id), predicate);
                }
            }
            cdgs.insert(code.id, cdg);
        }
        Self { cdgs, predicate_location, block_predicate }
    }

    /// Root goals (spec.md §4.5 DynaMOSA goal manager): branches not
    /// control-dependent on any other predicate, both directions.
    pub fn root_goals(&self) -> Vec<CoverageGoal> {
        let mut out = Vec::new();
        for (&code_object, cdg) in &self.cdgs {
            for &root_block in &cdg.roots {
                if let Some(&predicate) = self.block_predicate.get(&(code_object, root_block)) {
                    out.push(CoverageGoal::BranchTrue(predicate));
                    out.push(CoverageGoal::BranchFalse(predicate));
                }
            }
        }
        out
    }

    /// Every branch goal in the module, both directions — the static goal
    /// set non-adaptive algorithms (MOSA, Whole-Suite) evaluate against for
    /// the whole run, unlike DynaMOSA's growing activation frontier.
    pub fn all_branch_goals(&self) -> Vec<CoverageGoal> {
        self.predicate_location
            .keys()
            .flat_map(|&p| [CoverageGoal::BranchTrue(p), CoverageGoal::BranchFalse(p)])
            .collect()
    }

    /// CDG children of a branch goal's predicate, both directions — the
    /// goals DynaMOSA activates once `goal` is covered.
    pub fn child_goals(&self, goal: CoverageGoal) -> Vec<CoverageGoal> {
        let predicate = match goal {
            CoverageGoal::BranchTrue(p) | CoverageGoal::BranchFalse(p) => p,
            _ => return Vec::new(),
        };
        let Some(&(code_object, block)) = self.predicate_location.get(&predicate) else {
            return Vec::new();
        };
        let Some(cdg) = self.cdgs.get(&code_object) else {
            return Vec::new();
        };
        cdg.children(block)
            .into_iter()
            .filter_map(|b| self.block_predicate.get(&(code_object, b)))
            .flat_map(|&p| [CoverageGoal::BranchTrue(p), CoverageGoal::BranchFalse(p)])
            .collect()
    }

    /// Graph distance from the nearest predicate the trace actually executed
    /// in `predicate`'s code object to `predicate` itself, i.e. the
    /// "approach level" of spec.md §4.4. `u32::MAX / 2` is the sentinel for
    /// "no executed predicate in this code object at all".
    fn approach_level(&self, predicate: PredicateId, trace: &ExecutionTrace) -> u32 {
        let Some(&(code_object, target_block)) = self.predicate_location.get(&predicate) else {
            return u32::MAX / 2;
        };
        let Some(cdg) = self.cdgs.get(&code_object) else {
            return u32::MAX / 2;
        };
        self.predicate_location
            .iter()
            .filter(|(p, (c, _))| *c == code_object && trace.reached(**p))
            .map(|(_, (_, block))| cdg.distance(*block, target_block))
            .min()
            .unwrap_or(u32::MAX / 2)
    }
}

/// Which `(code_object, slot)` memory locations an execution trace "checks"
/// for checked coverage (spec.md §4.9): a slot is checked when some later
/// statement's backward slice reaches the write, i.e. an observable
/// checkpoint transitively depends on that value. Assertion generation
/// hasn't run yet when the GA computes fitness, so every statement that
/// performed a memory access stands in as an approximate checkpoint — this
/// mirrors `testforge-assert`'s own candidate generator, which attaches a
/// candidate assertion to nearly every deterministic statement position.
pub struct CheckedCoverage {
    checked: HashSet<(CodeObjectId, u16)>,
}

impl CheckedCoverage {
    pub fn from_trace(trace: &ExecutionTrace) -> Self {
        let mut checkpoints: Vec<u32> = trace.access_log.iter().map(|e| e.statement_pos).collect();
        checkpoints.sort_unstable();
        checkpoints.dedup();

        let slicer = DynamicSlicer;
        let mut checked = HashSet::new();
        for &checkpoint in &checkpoints {
            let slice = slicer.slice(trace, checkpoint);
            for event in &trace.access_log {
                if slice.contains(&event.statement_pos) {
                    checked.insert((event.code_object, event.slot));
                }
            }
        }
        Self { checked }
    }

    pub fn contains(&self, code_object: CodeObjectId, slot: u16) -> bool {
        self.checked.contains(&(code_object, slot))
    }
}

/// Computes the fitness (minimization, 0 = covered) of one coverage goal
/// against one execution trace, per spec.md §4.4. `checked` is the
/// precomputed [`CheckedCoverage`] for `trace`, used only by
/// `StatementChecked` goals.
pub fn goal_fitness(goal: CoverageGoal, trace: &ExecutionTrace, graphs: &ProgramGraphs, checked: &CheckedCoverage) -> f64 {
    match goal {
        CoverageGoal::BranchlessEntered(code_object) => {
            if trace.branchless_entered.contains(&code_object) {
                0.0
            } else {
                1.0
            }
        }
        CoverageGoal::BranchTrue(predicate) => branch_fitness(predicate, true, trace, graphs),
        CoverageGoal::BranchFalse(predicate) => branch_fitness(predicate, false, trace, graphs),
        CoverageGoal::LineCovered(line) => {
            if trace.covered_lines.contains(&line) {
                0.0
            } else {
                1.0
            }
        }
        CoverageGoal::StatementChecked(_) => {
            let (code_object, slot) = goal.unpack_statement_checked();
            if checked.contains(code_object, slot) {
                0.0
            } else {
                1.0
            }
        }
    }
}

fn branch_fitness(predicate: PredicateId, direction: bool, trace: &ExecutionTrace, graphs: &ProgramGraphs) -> f64 {
    if !trace.reached(predicate) {
        return 1.0 + graphs.approach_level(predicate, trace) as f64;
    }
    let raw = if direction { trace.true_distance(predicate) } else { trace.false_distance(predicate) };
    normalize(raw.unwrap_or(f64::INFINITY))
}

/// A goal -> fitness map for one chromosome, restricted to the still-
/// uncovered goal set the GA cares about this iteration.
pub type FitnessVector = IndexMap<CoverageGoal, f64>;

/// Per-chromosome memoization of the most recent fitness/coverage vectors
/// (spec.md §4.4 "computation cache"). Any structural mutation must call
/// [`FitnessCache::invalidate`]; coverage is inferred from `fitness == 0`
/// without a separate pass.
#[derive(Debug, Default, Clone)]
pub struct FitnessCache {
    vector: Option<FitnessVector>,
}

impl FitnessCache {
    pub fn invalidate(&mut self) {
        self.vector = None;
    }

    pub fn get_or_insert_with(&mut self, compute: impl FnOnce() -> FitnessVector) -> &FitnessVector {
        self.vector.get_or_insert_with(compute)
    }

    pub fn cached(&self) -> Option<&FitnessVector> {
        self.vector.as_ref()
    }

    pub fn covered_goals<'a>(&'a self) -> impl Iterator<Item = CoverageGoal> + 'a {
        self.vector.iter().flat_map(|v| v.iter().filter(|(_, &f)| f == 0.0).map(|(g, _)| *g))
    }
}
