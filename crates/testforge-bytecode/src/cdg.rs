// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::cfg::ControlFlowGraph;
use crate::code_object::BlockId;
use petgraph::algo::dominators::{self, Dominators};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, Reversed};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Control-dependence graph: an edge `p -> c` means block `c`'s execution is
/// controlled by the outcome of predicate block `p`. Built from the
/// post-dominator tree exactly as spec.md §3 specifies (Ferrante-Ottenstein-
/// Warren construction), reusing `petgraph`'s dominator algorithm the same
/// way `move-bytecode-verifier` reuses `petgraph` for its own graph passes.
pub struct ControlDependenceGraph {
    pub graph: DiGraph<BlockId, ()>,
    node_of: HashMap<BlockId, NodeIndex>,
    /// Root goals: branches not control-dependent on any other predicate.
    pub roots: Vec<BlockId>,
}

impl ControlDependenceGraph {
    pub fn build(cfg: &ControlFlowGraph) -> Self {
        let post_dom: Dominators<NodeIndex> =
            dominators::simple_fast(Reversed(&cfg.graph), cfg.exit);

        let mut graph = DiGraph::new();
        let mut node_of = HashMap::new();
        for &block in cfg.node_of.keys() {
            node_of.insert(block, graph.add_node(block));
        }

        let mut added: HashSet<(BlockId, BlockId)> = HashSet::new();
        let mut has_incoming: HashSet<BlockId> = HashSet::new();

        for edge in cfg.graph.edge_references() {
            let a = edge.source();
            let out_degree = cfg
                .graph
                .edges_directed(a, Direction::Outgoing)
                .count();
            if out_degree < 2 {
                continue;
            }
            let ipdom_a = post_dom.immediate_dominator(a);
            let mut run = edge.target();
            let mut guard = 0usize;
            loop {
                guard += 1;
                if guard > cfg.graph.node_count() + 1 {
                    break; // defensive: never spin on a malformed graph
                }
                if Some(run) == ipdom_a {
                    break;
                }
                let a_block = cfg.graph[a];
                let run_block = cfg.graph[run];
                if a_block != run_block && added.insert((a_block, run_block)) {
                    graph.add_edge(node_of[&a_block], node_of[&run_block], ());
                    has_incoming.insert(run_block);
                }
                match post_dom.immediate_dominator(run) {
                    Some(next) if next != run => run = next,
                    _ => break,
                }
            }
        }

        let roots: Vec<BlockId> = cfg
            .node_of
            .keys()
            .copied()
            .filter(|&b| {
                !has_incoming.contains(&b)
                    && cfg
                        .graph
                        .edges_directed(cfg.node(b), Direction::Outgoing)
                        .count()
                        >= 2
            })
            .collect();

        Self { graph, node_of, roots }
    }

    pub fn children(&self, block: BlockId) -> Vec<BlockId> {
        match self.node_of.get(&block) {
            None => vec![],
            Some(&n) => self
                .graph
                .edges_directed(n, Direction::Outgoing)
                .map(|e| self.graph[e.target()])
                .collect(),
        }
    }

    /// Graph distance from `from` to `to` in the control-dependence tree,
    /// used as the "approach level" for uncovered-branch fitness (spec.md
    /// §4.4). Returns a large sentinel if unreachable.
    pub fn distance(&self, from: BlockId, to: BlockId) -> u32 {
        if from == to {
            return 0;
        }
        let (Some(&start), Some(&goal)) = (self.node_of.get(&from), self.node_of.get(&to)) else {
            return u32::MAX / 2;
        };
        let dists = petgraph::algo::dijkstra(&self.graph, start, Some(goal), |_| 1);
        *dists.get(&goal).unwrap_or(&(u32::MAX / 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CodeObjectBuilder;
    use crate::cfg::ControlFlowGraph;
    use crate::opcode::{BranchKind, CompareKind};

    #[test]
    fn root_goals_have_no_control_dependence_parent() {
        let mut b = CodeObjectBuilder::new(0, "f", 1);
        let then_block = b.new_block();
        let else_block = b.new_block();
        b.jump_if_false(u32::MAX, BranchKind::Compare(CompareKind::Eq), else_block);
        b.switch_to(then_block);
        b.ret_none();
        b.switch_to(else_block);
        b.ret_none();
        let code = b.build();
        let cfg = ControlFlowGraph::build(&code);
        let cdg = ControlDependenceGraph::build(&cfg);
        assert!(cdg.roots.contains(&0));
    }

    #[test]
    fn nested_branch_is_dependent_on_outer() {
        // if (p0) { if (p1) { ret } else { ret } } else { ret }
        let mut b = CodeObjectBuilder::new(0, "f", 1);
        let outer_then = b.new_block();
        let outer_else = b.new_block();
        b.jump_if_false(u32::MAX, BranchKind::Compare(CompareKind::Eq), outer_else);
        b.switch_to(outer_then);
        let inner_then = b.new_block();
        let inner_else = b.new_block();
        b.jump_if_false(u32::MAX, BranchKind::Compare(CompareKind::Lt), inner_else);
        b.switch_to(inner_then);
        b.ret_none();
        b.switch_to(inner_else);
        b.ret_none();
        b.switch_to(outer_else);
        b.ret_none();
        let code = b.build();
        let cfg = ControlFlowGraph::build(&code);
        let cdg = ControlDependenceGraph::build(&cfg);
        assert!(cdg.roots.contains(&0));
        assert!(!cdg.roots.contains(&outer_then));
    }
}
