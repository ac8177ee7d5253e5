//! Call graph
//!
//! Function-level call graph grown during analysis. Statically resolved
//! edges are registered up front as function templates are summarized;
//! dynamic edges are discovered by the solver and added on the fly. Edges
//! are only ever added, never removed.

use super::ir::{FuncId, StmtId};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

/// How a call edge was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallEdgeKind {
    /// Target known from the IR
    Static,

    /// Target discovered from points-to facts during solving
    Dynamic,
}

/// Directed call graph over `FuncId` nodes.
#[derive(Debug, Default)]
pub struct CallGraph {
    graph: DiGraph<FuncId, CallEdgeKind>,
    nodes: FxHashMap<FuncId, NodeIndex>,
    /// (call stmt, callee) pairs already wired; the dedup guard for
    /// dynamic resolution
    wired: FxHashSet<(StmtId, FuncId)>,
    /// Statically resolved callee per call statement
    static_callees: FxHashMap<StmtId, FuncId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node lookup/creation by function id.
    pub fn get_or_add_node(&mut self, func: FuncId) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(&func) {
            return ix;
        }
        let ix = self.graph.add_node(func);
        self.nodes.insert(func, ix);
        ix
    }

    /// Node lookup without creation.
    pub fn node(&self, func: FuncId) -> Option<NodeIndex> {
        self.nodes.get(&func).copied()
    }

    /// Record the statically resolved callee of a call statement.
    pub fn register_static_callee(&mut self, stmt: StmtId, caller: FuncId, callee: FuncId) {
        self.static_callees.insert(stmt, callee);
        self.add_edge(stmt, caller, callee, CallEdgeKind::Static);
    }

    /// Statically resolved callee of a call statement, if any.
    pub fn callee_of(&self, stmt: StmtId) -> Option<FuncId> {
        self.static_callees.get(&stmt).copied()
    }

    /// Add a call edge. Returns `false` when this (stmt, callee) pair was
    /// already wired, so callers do not re-process a handled call path.
    pub fn add_edge(
        &mut self,
        stmt: StmtId,
        caller: FuncId,
        callee: FuncId,
        kind: CallEdgeKind,
    ) -> bool {
        if !self.wired.insert((stmt, callee)) {
            return false;
        }
        let from = self.get_or_add_node(caller);
        let to = self.get_or_add_node(callee);
        // Parallel edges between the same functions are fine: distinct call
        // statements stay distinguishable.
        self.graph.add_edge(from, to, kind);
        true
    }

    /// Add a dynamically discovered edge (dedup per call statement).
    pub fn add_dynamic_edge(&mut self, stmt: StmtId, caller: FuncId, callee: FuncId) -> bool {
        self.add_edge(stmt, caller, callee, CallEdgeKind::Dynamic)
    }

    /// True if a call edge for this (stmt, callee) pair exists.
    pub fn has_edge(&self, stmt: StmtId, callee: FuncId) -> bool {
        self.wired.contains(&(stmt, callee))
    }

    /// Reachability between two function nodes along call edges.
    pub fn detect_reachable(&self, from: FuncId, to: FuncId) -> bool {
        match (self.node(from), self.node(to)) {
            (Some(a), Some(b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Direct callees of a function (deduplicated).
    pub fn callees(&self, func: FuncId) -> Vec<FuncId> {
        let Some(ix) = self.node(func) else {
            return vec![];
        };
        let mut seen = FxHashSet::default();
        self.graph
            .neighbors(ix)
            .map(|n| self.graph[n])
            .filter(|f| seen.insert(*f))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as (caller, callee, kind), for diagnostics and dumps.
    pub fn edges(&self) -> impl Iterator<Item = (FuncId, FuncId, CallEdgeKind)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_dedup_per_stmt() {
        let mut cg = CallGraph::new();
        assert!(cg.add_dynamic_edge(1, 10, 20));
        assert!(!cg.add_dynamic_edge(1, 10, 20));
        assert_eq!(cg.edge_count(), 1);
    }

    #[test]
    fn test_same_stmt_two_targets() {
        // One virtual call site dispatching to two implementations.
        let mut cg = CallGraph::new();
        assert!(cg.add_dynamic_edge(1, 10, 20));
        assert!(cg.add_dynamic_edge(1, 10, 21));
        assert_eq!(cg.edge_count(), 2);
        assert_eq!(cg.callees(10).len(), 2);
    }

    #[test]
    fn test_reachability_is_transitive() {
        let mut cg = CallGraph::new();
        cg.add_dynamic_edge(1, 1, 2);
        cg.add_dynamic_edge(2, 2, 3);
        assert!(cg.detect_reachable(1, 3));
        assert!(!cg.detect_reachable(3, 1));
    }

    #[test]
    fn test_static_callee_lookup() {
        let mut cg = CallGraph::new();
        cg.register_static_callee(5, 0, 7);
        assert_eq!(cg.callee_of(5), Some(7));
        assert_eq!(cg.callee_of(6), None);
        assert!(cg.has_edge(5, 7));
    }
}
