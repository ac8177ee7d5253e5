//! Points-to sets with differential propagation
//!
//! Each pointer node keeps two sets: the committed points-to set and a
//! diff of objects not yet pushed along its outgoing edges. Propagation
//! moves only diffs, so a node whose set stopped growing costs nothing on
//! later visits.

use super::node::NodeId;
use rustc_hash::FxHashSet;

#[derive(Debug, Default, Clone)]
struct PtsSet {
    pts: FxHashSet<NodeId>,
    diff: FxHashSet<NodeId>,
}

/// Per-node points-to state, indexed densely by `NodeId`.
#[derive(Debug, Default)]
pub struct DiffPtsStore {
    sets: Vec<PtsSet>,
}

impl DiffPtsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, node: NodeId) -> &mut PtsSet {
        let ix = node as usize;
        if ix >= self.sets.len() {
            self.sets.resize_with(ix + 1, PtsSet::default);
        }
        &mut self.sets[ix]
    }

    /// Add `obj` to pts(node). Returns `true` when the set grew; the new
    /// object also lands in the node's diff.
    pub fn add(&mut self, node: NodeId, obj: NodeId) -> bool {
        let set = self.ensure(node);
        if set.pts.insert(obj) {
            set.diff.insert(obj);
            true
        } else {
            false
        }
    }

    /// Committed points-to set of a node.
    pub fn pts(&self, node: NodeId) -> Option<&FxHashSet<NodeId>> {
        self.sets.get(node as usize).map(|s| &s.pts)
    }

    /// Unpropagated portion of a node's set.
    pub fn diff(&self, node: NodeId) -> Option<&FxHashSet<NodeId>> {
        self.sets.get(node as usize).map(|s| &s.diff)
    }

    /// True when the node has pending objects to push.
    pub fn has_diff(&self, node: NodeId) -> bool {
        self.sets
            .get(node as usize)
            .map(|s| !s.diff.is_empty())
            .unwrap_or(false)
    }

    /// Objects in src's diff that dst does not already have. This is what
    /// an edge visit actually transfers.
    pub fn calculate_diff(&self, src: NodeId, dst: NodeId) -> Vec<NodeId> {
        let Some(src_set) = self.sets.get(src as usize) else {
            return vec![];
        };
        match self.sets.get(dst as usize) {
            Some(dst_set) => src_set
                .diff
                .iter()
                .filter(|o| !dst_set.pts.contains(o))
                .copied()
                .collect(),
            None => src_set.diff.iter().copied().collect(),
        }
    }

    /// Mark a node's diff as fully propagated.
    pub fn flush(&mut self, node: NodeId) {
        if let Some(set) = self.sets.get_mut(node as usize) {
            set.diff.clear();
        }
    }

    /// Re-arm a node for propagation: its entire committed set becomes the
    /// diff again. Used when a node grows a *new* outgoing edge after it
    /// already propagated (a freshly resolved call, a new field clone).
    pub fn reset_elem(&mut self, node: NodeId) {
        if let Some(set) = self.sets.get_mut(node as usize) {
            set.diff = set.pts.clone();
        }
    }

    /// Total committed facts across all nodes.
    pub fn total_facts(&self) -> usize {
        self.sets.iter().map(|s| s.pts.len()).sum()
    }
}
