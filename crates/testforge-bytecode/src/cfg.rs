// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::code_object::{BlockId, CodeObject};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Unconditional jump or fallthrough.
    Unconditional,
    /// The true branch of a conditional jump (predicate held).
    True,
    /// The false branch of a conditional jump (predicate did not hold).
    False,
}

/// Control-flow graph over a single [`CodeObject`]'s basic blocks, built with
/// explicit virtual entry/exit nodes the way `move-bytecode-verifier`
/// (workspace dependency on `petgraph`) builds its CFGs for verification
/// passes.
pub struct ControlFlowGraph {
    pub graph: DiGraph<BlockId, EdgeKind>,
    pub node_of: HashMap<BlockId, NodeIndex>,
    pub entry: NodeIndex,
    pub exit: NodeIndex,
}

const VIRTUAL_EXIT: BlockId = u32::MAX;

impl ControlFlowGraph {
    pub fn build(code: &CodeObject) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of = HashMap::new();
        for block in &code.blocks {
            node_of.insert(block.id, graph.add_node(block.id));
        }
        let exit = graph.add_node(VIRTUAL_EXIT);
        node_of.insert(VIRTUAL_EXIT, exit);

        for (idx, block) in code.blocks.iter().enumerate() {
            let fallthrough = code.blocks.get(idx + 1).map(|b| b.id);
            let is_true_branch = block.predicate().is_some();
            let succs = block.successors(fallthrough);
            if succs.is_empty() {
                graph.add_edge(node_of[&block.id], exit, EdgeKind::Unconditional);
                continue;
            }
            for (i, succ) in succs.iter().enumerate() {
                let kind = if is_true_branch {
                    // successors() pushes [true-target, fallthrough(=false)]
                    if i == 0 { EdgeKind::False } else { EdgeKind::True }
                } else {
                    EdgeKind::Unconditional
                };
                graph.add_edge(node_of[&block.id], node_of[succ], kind);
            }
        }

        let entry = node_of[&code.entry];
        Self { graph, node_of, entry, exit }
    }

    pub fn node(&self, block: BlockId) -> NodeIndex {
        self.node_of[&block]
    }

    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        self.graph
            .edges_directed(self.node(block), Direction::Incoming)
            .map(|e| self.graph[e.source()])
            .collect()
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.graph
            .edges_directed(self.node(block), Direction::Outgoing)
            .map(|e| self.graph[e.target()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CodeObjectBuilder;
    use crate::opcode::{BranchKind, CompareKind};

    #[test]
    fn branchless_has_single_edge_to_exit() {
        let mut b = CodeObjectBuilder::new(0, "f", 0);
        b.ret_none();
        let code = b.build();
        let cfg = ControlFlowGraph::build(&code);
        assert_eq!(cfg.graph.edge_count(), 1);
    }

    #[test]
    fn conditional_jump_has_two_outgoing_edges() {
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
        assert_eq!(cfg.successors(0).len(), 2);
    }
}
