//! Pointer assignment graph
//!
//! Arena of interned (context, kind) nodes plus kind-indexed adjacency.
//! Construction only ever adds: nodes and edges are interned, re-adding
//! either is a cheap no-op, and the solver relies on `add_edge`'s return
//! value to know when the graph actually grew.

use crate::errors::{PtaError, Result};
use crate::features::pointer_analysis::domain::{
    CtxId, EdgeKind, NodeId, NodeKind, PagEdge, PagNode,
};
use crate::shared::models::ir::{FieldId, StmtId, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct Pag {
    nodes: Vec<PagNode>,
    node_index: FxHashMap<(CtxId, NodeKind), NodeId>,

    edges: Vec<PagEdge>,
    edge_set: FxHashSet<(NodeId, NodeId, EdgeKind)>,

    /// Copy successors (includes receiver-binding edges; they propagate
    /// identically and differ only in provenance)
    copy_out: FxHashMap<NodeId, Vec<NodeId>>,
    /// Load destinations per field template node
    load_out: FxHashMap<NodeId, Vec<NodeId>>,
    /// Write sources per field template node
    write_in: FxHashMap<NodeId, Vec<NodeId>>,

    /// Address edges (object node, pointer node) in insertion order; the
    /// solver seeds from this list with a cursor, so edges added after a
    /// round are picked up by the next seeding pass
    addr_edges: Vec<(NodeId, NodeId)>,

    /// Field template nodes hanging off each base pointer node
    templates_by_base: FxHashMap<NodeId, Vec<NodeId>>,
    /// (template node, concrete object node) → clone node
    field_clones: FxHashMap<(NodeId, NodeId), NodeId>,

    /// Every node materialized for a program value, across all contexts;
    /// alias queries union over these
    value_nodes: FxHashMap<ValueId, Vec<NodeId>>,
}

impl Pag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a (context, kind) node, creating it on first sight.
    pub fn get_or_new_node(&mut self, ctx: CtxId, kind: NodeKind, stmt: Option<StmtId>) -> NodeId {
        if let Some(&id) = self.node_index.get(&(ctx, kind)) {
            return id;
        }
        let id = self.nodes.len() as NodeId;
        self.nodes.push(PagNode { id, ctx, kind, stmt });
        self.node_index.insert((ctx, kind), id);
        match kind {
            NodeKind::Local { value } | NodeKind::StaticField { value } => {
                self.value_nodes.entry(value).or_default().push(id);
            }
            _ => {}
        }
        id
    }

    /// Intern a field template and register it against the PAG node its
    /// base resolves to, so the solver finds the template when that node's
    /// points-to set grows. The caller resolves the base, since only it
    /// knows whether `base` is a context-local or the global node of a
    /// static field.
    pub fn get_or_new_field_template(
        &mut self,
        ctx: CtxId,
        base_node: NodeId,
        base: ValueId,
        field: FieldId,
        stmt: Option<StmtId>,
    ) -> NodeId {
        let kind = NodeKind::FieldTemplate { base, field };
        if let Some(&id) = self.node_index.get(&(ctx, kind)) {
            return id;
        }
        let id = self.get_or_new_node(ctx, kind, stmt);
        self.templates_by_base.entry(base_node).or_default().push(id);
        id
    }

    /// Node lookup without creation.
    pub fn node_id(&self, ctx: CtxId, kind: NodeKind) -> Option<NodeId> {
        self.node_index.get(&(ctx, kind)).copied()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &PagNode {
        &self.nodes[id as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[PagNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[PagEdge] {
        &self.edges
    }

    /// Add an edge; returns `false` when it already exists.
    pub fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
        stmt: Option<StmtId>,
    ) -> bool {
        if !self.edge_set.insert((src, dst, kind)) {
            return false;
        }
        self.edges.push(PagEdge { src, dst, kind, stmt });
        match kind {
            EdgeKind::Address => self.addr_edges.push((src, dst)),
            EdgeKind::Copy | EdgeKind::This => {
                self.copy_out.entry(src).or_default().push(dst);
            }
            EdgeKind::Load => {
                self.load_out.entry(src).or_default().push(dst);
            }
            EdgeKind::Write => {
                self.write_in.entry(dst).or_default().push(src);
            }
        }
        true
    }

    /// Copy-kind successors of a node.
    pub fn copy_targets(&self, node: NodeId) -> &[NodeId] {
        self.copy_out.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Load destinations of a field template.
    pub fn load_targets(&self, template: NodeId) -> &[NodeId] {
        self.load_out.get(&template).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Write sources of a field template.
    pub fn write_sources(&self, template: NodeId) -> &[NodeId] {
        self.write_in.get(&template).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Address edges in insertion order (object, pointer).
    pub fn addr_edges(&self) -> &[(NodeId, NodeId)] {
        &self.addr_edges
    }

    /// Field templates registered on a base pointer node.
    pub fn templates_of_base(&self, base: NodeId) -> &[NodeId] {
        self.templates_by_base
            .get(&base)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clone of `template` specialized to concrete base object `obj`.
    /// The clone is canonical per (field, object): every template that
    /// reaches the same object's field resolves to the same node, which is
    /// what makes field facts flow between functions sharing an object.
    /// The returned flag is true the first time *this template* sees the
    /// clone, so the caller wires the template's loads and writes exactly
    /// once.
    pub fn get_or_clone_field_node(
        &mut self,
        template: NodeId,
        obj: NodeId,
    ) -> Result<(NodeId, bool)> {
        if let Some(&id) = self.field_clones.get(&(template, obj)) {
            return Ok((id, false));
        }
        let tpl = self.nodes[template as usize];
        let NodeKind::FieldTemplate { field, .. } = tpl.kind else {
            return Err(PtaError::invariant(format!(
                "field clone requested for non-template node {} ({:?})",
                template, tpl.kind
            )));
        };
        // Keyed under the object's context: the object node already
        // carries the heap identity the clone should follow.
        let obj_ctx = self.nodes[obj as usize].ctx;
        let id = self.get_or_new_node(obj_ctx, NodeKind::FieldClone { field, obj }, tpl.stmt);
        self.field_clones.insert((template, obj), id);
        Ok((id, true))
    }

    /// Distinct (field, object) clone nodes materialized so far.
    pub fn distinct_field_clones(&self) -> usize {
        let mut seen = FxHashSet::default();
        for &id in self.field_clones.values() {
            seen.insert(id);
        }
        seen.len()
    }

    /// Every node carrying a given program value, across contexts.
    pub fn nodes_of_value(&self, value: ValueId) -> &[NodeId] {
        self.value_nodes.get(&value).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_interning() {
        let mut pag = Pag::new();
        let a = pag.get_or_new_node(0, NodeKind::Local { value: 1 }, None);
        let b = pag.get_or_new_node(0, NodeKind::Local { value: 1 }, None);
        let c = pag.get_or_new_node(1, NodeKind::Local { value: 1 }, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pag.nodes_of_value(1), &[a, c]);
    }

    #[test]
    fn test_edge_idempotence() {
        let mut pag = Pag::new();
        let a = pag.get_or_new_node(0, NodeKind::Local { value: 1 }, None);
        let b = pag.get_or_new_node(0, NodeKind::Local { value: 2 }, None);
        assert!(pag.add_edge(a, b, EdgeKind::Copy, None));
        assert!(!pag.add_edge(a, b, EdgeKind::Copy, None));
        assert_eq!(pag.edge_count(), 1);
        assert_eq!(pag.copy_targets(a), &[b]);
    }

    #[test]
    fn test_template_registers_on_base_node() {
        let mut pag = Pag::new();
        let base = pag.get_or_new_node(0, NodeKind::Local { value: 5 }, None);
        let tpl = pag.get_or_new_field_template(0, base, 5, 2, None);
        assert_eq!(pag.templates_of_base(base), &[tpl]);
        // Re-interning neither duplicates the node nor the registration.
        let again = pag.get_or_new_field_template(0, base, 5, 2, None);
        assert_eq!(again, tpl);
        assert_eq!(pag.templates_of_base(base), &[tpl]);
    }

    #[test]
    fn test_template_can_hang_off_a_global_node() {
        // A static-field base registers against the node the base resolves
        // to, not against a context-local stand-in.
        let mut pag = Pag::new();
        let global = pag.get_or_new_node(CtxId::MAX, NodeKind::StaticField { value: 5 }, None);
        let tpl = pag.get_or_new_field_template(0, global, 5, 2, None);
        assert_eq!(pag.templates_of_base(global), &[tpl]);
        assert!(pag.node_id(0, NodeKind::Local { value: 5 }).is_none());
    }

    #[test]
    fn test_field_clone_per_object() {
        let mut pag = Pag::new();
        let base = pag.get_or_new_node(0, NodeKind::Local { value: 5 }, None);
        let tpl = pag.get_or_new_field_template(0, base, 5, 2, None);
        let obj1 = pag.get_or_new_node(0, NodeKind::HeapObj { site: 0, class: 0 }, None);
        let obj2 = pag.get_or_new_node(0, NodeKind::HeapObj { site: 1, class: 0 }, None);
        let (c1, fresh1) = pag.get_or_clone_field_node(tpl, obj1).unwrap();
        let (c1_again, fresh_again) = pag.get_or_clone_field_node(tpl, obj1).unwrap();
        let (c2, _) = pag.get_or_clone_field_node(tpl, obj2).unwrap();
        assert!(fresh1);
        assert!(!fresh_again);
        assert_eq!(c1, c1_again);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_clone_of_non_template_is_an_error() {
        let mut pag = Pag::new();
        let local = pag.get_or_new_node(0, NodeKind::Local { value: 1 }, None);
        let obj = pag.get_or_new_node(0, NodeKind::HeapObj { site: 0, class: 0 }, None);
        assert!(pag.get_or_clone_field_node(local, obj).is_err());
    }
}
