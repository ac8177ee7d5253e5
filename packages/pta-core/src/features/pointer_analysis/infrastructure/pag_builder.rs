//! PAG construction
//!
//! Two-phase construction. `build_func_pag` summarizes one function body
//! into a context-independent template of symbolic edges and call sites;
//! `instantiate` stamps a template into concrete (context, node) space and
//! wires its statically-known calls, deriving callee contexts under the
//! k-limit. Dynamic call sites are only registered here; the solver asks
//! `add_dynamic_call_edges` to wire them as receiver points-to sets grow.

use super::func_pag::{FuncPag, IntraEdge, VarEnd};
use super::pag::Pag;
use crate::config::PtaConfig;
use crate::errors::{PtaError, Result};
use crate::features::pointer_analysis::domain::{
    CallSite, ContextCache, CtxId, DiffPtsStore, DynCallSite, EdgeKind, NodeId, NodeKind,
};
use crate::shared::models::call_graph::CallGraph;
use crate::shared::models::ir::{
    CalleeRef, FuncId, LValue, Operand, RValue, Scene, Stmt, StmtId, StmtKind, TypeHint, ValueId,
    ValueKind,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

/// Context under which static-field nodes are interned. Statics are
/// globals: one node per field, shared by every calling context.
const GLOBAL_CTX: CtxId = CtxId::MAX;

/// A dynamic call site registered under one caller context.
#[derive(Debug)]
pub struct DynSiteInstance {
    pub ctx: CtxId,
    pub site: DynCallSite,
}

/// Builds and grows the PAG over a fixed Scene.
pub struct PagBuilder<'s> {
    scene: &'s Scene,
    pub ctxs: ContextCache,

    func_pags: FxHashMap<FuncId, FuncPag>,
    /// (context, function) pairs already stamped into the PAG
    instantiated: FxHashSet<(CtxId, FuncId)>,
    /// Reached (context, function) pairs awaiting instantiation
    build_queue: VecDeque<(CtxId, FuncId)>,

    /// Dynamic call sites keyed by their receiver's PAG node
    dyn_sites_by_receiver: FxHashMap<NodeId, Vec<Rc<DynSiteInstance>>>,
    /// (call stmt, receiver object) pairs already dispatched
    handled_dispatch: FxHashSet<(StmtId, NodeId)>,
    /// (receiver node, object) pairs that missed resolution; retried once
    /// per round in case a closure-argument fact arrived since
    unresolved_dispatch: FxHashSet<(NodeId, NodeId)>,
}

impl<'s> PagBuilder<'s> {
    pub fn new(scene: &'s Scene, config: &PtaConfig) -> Self {
        Self {
            scene,
            ctxs: ContextCache::new(config.k_limit),
            func_pags: FxHashMap::default(),
            instantiated: FxHashSet::default(),
            build_queue: VecDeque::new(),
            dyn_sites_by_receiver: FxHashMap::default(),
            handled_dispatch: FxHashSet::default(),
            unresolved_dispatch: FxHashSet::default(),
        }
    }

    /// Queue an entry function under a fresh root context.
    pub fn add_entry(&mut self, func: FuncId) -> Result<CtxId> {
        if self.scene.method(func).is_sdk() {
            return Err(PtaError::scene(format!(
                "entry function `{}` has no body",
                self.scene.method(func).signature
            )));
        }
        let ctx = self.ctxs.new_context(func);
        self.build_queue.push_back((ctx, func));
        Ok(ctx)
    }

    /// Dynamic call sites waiting on a receiver node.
    pub fn dyn_sites_on(&self, recv: NodeId) -> Option<&[Rc<DynSiteInstance>]> {
        self.dyn_sites_by_receiver.get(&recv).map(Vec::as_slice)
    }

    /// Summarize a function body into its context-independent template.
    /// Idempotent; SDK methods get an empty template.
    pub fn build_func_pag(&mut self, func: FuncId) -> Result<()> {
        if self.func_pags.contains_key(&func) {
            return Ok(());
        }
        let mut fpag = FuncPag::new(func);
        for stmt in self.scene.statements(func) {
            self.summarize_stmt(&mut fpag, stmt)?;
        }
        self.func_pags.insert(func, fpag);
        Ok(())
    }

    fn summarize_stmt(&self, fpag: &mut FuncPag, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Return { value } => {
                match value {
                    Some(Operand::Value(v)) => fpag.returns.push(*v),
                    Some(Operand::Composite) => {
                        debug!(func = fpag.func, stmt = stmt.id, "skipping composite return operand");
                    }
                    Some(Operand::Constant) | None => {}
                }
                Ok(())
            }
            StmtKind::Assign { lhs, rhs } => self.summarize_assign(fpag, stmt, lhs, rhs),
        }
    }

    fn summarize_assign(
        &self,
        fpag: &mut FuncPag,
        stmt: &Stmt,
        lhs: &LValue,
        rhs: &RValue,
    ) -> Result<()> {
        let edge = |src, dst, kind| IntraEdge {
            src,
            dst,
            kind,
            stmt: stmt.id,
        };
        match (lhs, rhs) {
            (LValue::Value(l), RValue::New { class, site }) => {
                fpag.internal_edges.push(edge(
                    VarEnd::Alloc {
                        site: *site,
                        class: *class,
                    },
                    VarEnd::Value(*l),
                    EdgeKind::Address,
                ));
            }
            (LValue::Value(l), RValue::FuncRef { func }) => {
                fpag.internal_edges.push(edge(
                    VarEnd::FuncObj { func: *func },
                    VarEnd::Value(*l),
                    EdgeKind::Address,
                ));
            }
            (LValue::Value(l), RValue::Value(r)) => {
                fpag.internal_edges
                    .push(edge(VarEnd::Value(*r), VarEnd::Value(*l), EdgeKind::Copy));
            }
            (LValue::Value(_), RValue::Constant) => {}
            (LValue::Value(l), RValue::InstanceField { base, field }) => {
                fpag.internal_edges.push(edge(
                    VarEnd::Field {
                        base: *base,
                        field: *field,
                    },
                    VarEnd::Value(*l),
                    EdgeKind::Load,
                ));
            }
            (LValue::InstanceField { base, field }, RValue::Value(r)) => {
                fpag.internal_edges.push(edge(
                    VarEnd::Value(*r),
                    VarEnd::Field {
                        base: *base,
                        field: *field,
                    },
                    EdgeKind::Write,
                ));
            }
            (LValue::InstanceField { .. }, RValue::Constant) => {}
            (LValue::Value(l), RValue::Call(call)) => {
                match &call.callee {
                    CalleeRef::Static(callee) => fpag.call_sites.push(CallSite {
                        stmt: stmt.id,
                        caller: fpag.func,
                        callee: *callee,
                        receiver: call.receiver,
                        args: call.args.clone(),
                        lhs: Some(*l),
                    }),
                    CalleeRef::Dynamic { receiver, method } => {
                        fpag.dyn_call_sites.push(DynCallSite {
                            stmt: stmt.id,
                            caller: fpag.func,
                            receiver: *receiver,
                            method: method.clone(),
                            args: call.args.clone(),
                            lhs: Some(*l),
                        })
                    }
                }
            }
            // Field targets with structured right-hand sides are not in
            // lowered three-address form; frontends must emit a temporary.
            (LValue::InstanceField { .. }, _) => {
                return Err(PtaError::scene(format!(
                    "statement `{}` assigns a structured value into a field; expected a lowered temporary",
                    stmt.text
                )));
            }
        }
        Ok(())
    }

    /// PAG node for a symbolic endpoint under a concrete context.
    fn resolve_end(
        &self,
        pag: &mut Pag,
        ctx: CtxId,
        func: FuncId,
        end: VarEnd,
        stmt: Option<StmtId>,
    ) -> NodeId {
        match end {
            VarEnd::Value(v) => self.value_node(pag, ctx, v, stmt),
            VarEnd::Field { base, field } => {
                // The base may be a static field, whose node lives under the
                // global context; the template must hang off that node.
                let base_node = self.value_node(pag, ctx, base, stmt);
                pag.get_or_new_field_template(ctx, base_node, base, field, stmt)
            }
            VarEnd::Alloc { site, class } => {
                pag.get_or_new_node(ctx, NodeKind::HeapObj { site, class }, stmt)
            }
            VarEnd::FuncObj { func } => pag.get_or_new_node(ctx, NodeKind::FuncObj { func }, stmt),
            VarEnd::This => pag.get_or_new_node(ctx, NodeKind::ThisRef { func }, stmt),
        }
    }

    fn value_node(&self, pag: &mut Pag, ctx: CtxId, v: ValueId, stmt: Option<StmtId>) -> NodeId {
        match self.scene.value(v).kind {
            ValueKind::StaticField { .. } => {
                pag.get_or_new_node(GLOBAL_CTX, NodeKind::StaticField { value: v }, stmt)
            }
            _ => pag.get_or_new_node(ctx, NodeKind::Local { value: v }, stmt),
        }
    }

    /// Stamp one (context, function) pair into the PAG. Returns the source
    /// nodes of every edge added, so the solver can re-arm nodes that had
    /// already propagated before this call path was discovered.
    pub fn instantiate(
        &mut self,
        pag: &mut Pag,
        call_graph: &mut CallGraph,
        ctx: CtxId,
        func: FuncId,
    ) -> Result<Vec<NodeId>> {
        if !self.instantiated.insert((ctx, func)) {
            return Ok(vec![]);
        }
        self.build_func_pag(func)?;
        debug!(
            func = %self.scene.method(func).signature,
            ctx, "instantiating function"
        );

        let mut touched = Vec::new();
        let fpag = self.func_pags[&func].clone();

        for e in &fpag.internal_edges {
            let src = self.resolve_end(pag, ctx, func, e.src, Some(e.stmt));
            let dst = self.resolve_end(pag, ctx, func, e.dst, Some(e.stmt));
            if pag.add_edge(src, dst, e.kind, Some(e.stmt)) {
                touched.push(src);
            }
        }

        // Receiver objects land in the ThisRef slot; flow them on into the
        // body's canonical `this` local.
        if let Some(this_local) = self.scene.method(func).this_local {
            let this_ref = pag.get_or_new_node(ctx, NodeKind::ThisRef { func }, None);
            let this_node = self.value_node(pag, ctx, this_local, None);
            if pag.add_edge(this_ref, this_node, EdgeKind::Copy, None) {
                touched.push(this_ref);
            }
        }

        for site in &fpag.call_sites {
            self.wire_static_call(pag, call_graph, ctx, site, &mut touched)?;
        }

        for site in &fpag.dyn_call_sites {
            let recv = self.value_node(pag, ctx, site.receiver, Some(site.stmt));
            self.dyn_sites_by_receiver
                .entry(recv)
                .or_default()
                .push(Rc::new(DynSiteInstance {
                    ctx,
                    site: site.clone(),
                }));
            touched.push(recv);
        }

        Ok(touched)
    }

    fn wire_static_call(
        &mut self,
        pag: &mut Pag,
        call_graph: &mut CallGraph,
        ctx: CtxId,
        site: &CallSite,
        touched: &mut Vec<NodeId>,
    ) -> Result<()> {
        call_graph.register_static_callee(site.stmt, site.caller, site.callee);
        let callee = self.scene.method(site.callee);
        let recv_node = site
            .receiver
            .map(|r| self.value_node(pag, ctx, r, Some(site.stmt)));

        if callee.is_sdk() {
            // Intrinsics have no body to analyze, but their receiver
            // binding is real; record it in the callee's ThisRef slot.
            if callee.is_intrinsic {
                if let Some(recv) = recv_node {
                    let this_ref =
                        pag.get_or_new_node(ctx, NodeKind::ThisRef { func: site.callee }, None);
                    if pag.add_edge(recv, this_ref, EdgeKind::This, Some(site.stmt)) {
                        touched.push(recv);
                    }
                }
            }
            // Fabricate one return object per (method, caller context) and
            // hand it to the destination.
            if let Some(lhs) = site.lhs {
                let obj = pag.get_or_new_node(
                    ctx,
                    NodeKind::SdkObj { method: site.callee },
                    Some(site.stmt),
                );
                let dst = self.value_node(pag, ctx, lhs, Some(site.stmt));
                pag.add_edge(obj, dst, EdgeKind::Address, Some(site.stmt));
            }
            return Ok(());
        }

        let callee_ctx = self.ctxs.context_for(ctx, site.stmt);
        self.build_func_pag(site.callee)?;
        self.wire_call_edges(
            pag,
            ctx,
            callee_ctx,
            site.callee,
            recv_node,
            &site.args,
            site.lhs,
            site.stmt,
            touched,
        );
        if !self.instantiated.contains(&(callee_ctx, site.callee)) {
            self.build_queue.push_back((callee_ctx, site.callee));
        }
        Ok(())
    }

    /// Parameter, receiver, and return wiring shared by static and
    /// dynamically resolved calls.
    #[allow(clippy::too_many_arguments)]
    fn wire_call_edges(
        &mut self,
        pag: &mut Pag,
        caller_ctx: CtxId,
        callee_ctx: CtxId,
        callee: FuncId,
        receiver_node: Option<NodeId>,
        args: &[Operand],
        lhs: Option<ValueId>,
        stmt: StmtId,
        touched: &mut Vec<NodeId>,
    ) {
        let params = self.scene.method(callee).params.clone();
        for (i, arg) in args.iter().enumerate() {
            let Some(&param) = params.get(i) else {
                debug!(stmt, arg = i, "argument beyond callee's parameter list");
                break;
            };
            match arg {
                Operand::Value(v) => {
                    let src = self.value_node(pag, caller_ctx, *v, Some(stmt));
                    let dst = self.value_node(pag, callee_ctx, param, Some(stmt));
                    if pag.add_edge(src, dst, EdgeKind::Copy, Some(stmt)) {
                        touched.push(src);
                    }
                }
                Operand::Constant => {}
                Operand::Composite => {
                    debug!(stmt, arg = i, "skipping composite argument");
                }
            }
        }

        if let Some(recv) = receiver_node {
            let this_ref = pag.get_or_new_node(callee_ctx, NodeKind::ThisRef { func: callee }, None);
            if pag.add_edge(recv, this_ref, EdgeKind::This, Some(stmt)) {
                touched.push(recv);
            }
        }

        if let Some(lhs) = lhs {
            let dst = self.value_node(pag, caller_ctx, lhs, Some(stmt));
            let returns = self.func_pags[&callee].returns.clone();
            for &ret in &returns {
                let src = self.value_node(pag, callee_ctx, ret, Some(stmt));
                if pag.add_edge(src, dst, EdgeKind::Copy, Some(stmt)) {
                    touched.push(src);
                }
            }
        }
    }

    /// Resolve one receiver object against the dynamic call sites waiting
    /// on `recv_node`, wiring newly discovered callees. Returns source
    /// nodes that gained edges and the count of edges resolved.
    pub fn add_dynamic_call_edges(
        &mut self,
        pag: &mut Pag,
        pts: &DiffPtsStore,
        call_graph: &mut CallGraph,
        recv_node: NodeId,
        obj: NodeId,
    ) -> Result<(Vec<NodeId>, usize)> {
        let Some(sites) = self.dyn_sites_by_receiver.get(&recv_node) else {
            return Ok((vec![], 0));
        };
        let sites: Vec<Rc<DynSiteInstance>> = sites.clone();

        let mut touched = Vec::new();
        let mut resolved = 0usize;
        for inst in sites {
            if self.handled_dispatch.contains(&(inst.site.stmt, obj)) {
                continue;
            }
            let callees = self.resolve_dispatch(pag, pts, &inst, obj);
            if callees.is_empty() {
                // Not marked handled: a later closure-argument fact may
                // still make this pair resolvable.
                self.unresolved_dispatch.insert((recv_node, obj));
                debug!(
                    stmt = inst.site.stmt,
                    method = %inst.site.method,
                    "no dispatch target for receiver object"
                );
                continue;
            }
            self.handled_dispatch.insert((inst.site.stmt, obj));

            for callee in callees {
                if call_graph.add_dynamic_edge(inst.site.stmt, inst.site.caller, callee) {
                    resolved += 1;
                }

                if self.scene.method(callee).is_sdk() {
                    if self.scene.method(callee).is_intrinsic {
                        let this_ref = pag.get_or_new_node(
                            inst.ctx,
                            NodeKind::ThisRef { func: callee },
                            None,
                        );
                        if pag.add_edge(recv_node, this_ref, EdgeKind::This, Some(inst.site.stmt)) {
                            touched.push(recv_node);
                        }
                    }
                    if let Some(lhs) = inst.site.lhs {
                        let sdk = pag.get_or_new_node(
                            inst.ctx,
                            NodeKind::SdkObj { method: callee },
                            Some(inst.site.stmt),
                        );
                        let dst = self.value_node(pag, inst.ctx, lhs, Some(inst.site.stmt));
                        pag.add_edge(sdk, dst, EdgeKind::Address, Some(inst.site.stmt));
                    }
                    continue;
                }

                let callee_ctx = self.ctxs.context_for(inst.ctx, inst.site.stmt);
                self.build_func_pag(callee)?;
                let args = inst.site.args.clone();
                self.wire_call_edges(
                    pag,
                    inst.ctx,
                    callee_ctx,
                    callee,
                    Some(recv_node),
                    &args,
                    inst.site.lhs,
                    inst.site.stmt,
                    &mut touched,
                );
                if !self.instantiated.contains(&(callee_ctx, callee)) {
                    self.build_queue.push_back((callee_ctx, callee));
                }
            }
        }
        Ok((touched, resolved))
    }

    /// Re-attempt every (receiver, object) pair that previously missed;
    /// pairs whose sites are all dispatched are dropped from the retry set.
    pub fn retry_unresolved_dispatch(
        &mut self,
        pag: &mut Pag,
        pts: &DiffPtsStore,
        call_graph: &mut CallGraph,
    ) -> Result<(Vec<NodeId>, usize)> {
        let pairs: Vec<(NodeId, NodeId)> = self.unresolved_dispatch.iter().copied().collect();
        let mut touched = Vec::new();
        let mut resolved = 0usize;
        for (recv, obj) in pairs {
            let (t, r) = self.add_dynamic_call_edges(pag, pts, call_graph, recv, obj)?;
            touched.extend(t);
            resolved += r;
            let all_handled = self
                .dyn_sites_by_receiver
                .get(&recv)
                .map(|sites| {
                    sites
                        .iter()
                        .all(|s| self.handled_dispatch.contains(&(s.site.stmt, obj)))
                })
                .unwrap_or(true);
            if all_handled {
                self.unresolved_dispatch.remove(&(recv, obj));
            }
        }
        Ok((touched, resolved))
    }

    /// Dispatch targets for one receiver object: class method lookup along
    /// the superclass chain for heap objects, the function itself for
    /// function values, then the closure-call convention (a single
    /// function-typed argument holds the callee). A miss is silent;
    /// soundness over the modeled program is preserved by simply not
    /// adding an edge.
    fn resolve_dispatch(
        &self,
        pag: &Pag,
        pts: &DiffPtsStore,
        inst: &DynSiteInstance,
        obj: NodeId,
    ) -> Vec<FuncId> {
        match pag.node(obj).kind {
            NodeKind::HeapObj { class, .. } => {
                if let Some(func) = self.scene.resolve_method(class, &inst.site.method) {
                    return vec![func];
                }
                self.closure_argument_callees(pag, pts, inst)
            }
            NodeKind::FuncObj { func } => vec![func],
            _ => vec![],
        }
    }

    /// Closure-call convention: when a method lookup misses and the call
    /// passes exactly one function-typed argument, treat the functions
    /// that argument may hold as the callees.
    fn closure_argument_callees(
        &self,
        pag: &Pag,
        pts: &DiffPtsStore,
        inst: &DynSiteInstance,
    ) -> Vec<FuncId> {
        let mut fn_args = inst.site.args.iter().filter_map(|arg| match arg {
            Operand::Value(v) if self.scene.value(*v).declared_type == TypeHint::Function => {
                Some(*v)
            }
            _ => None,
        });
        let (Some(arg), None) = (fn_args.next(), fn_args.next()) else {
            return vec![];
        };
        let Some(node) = pag.node_id(inst.ctx, NodeKind::Local { value: arg }) else {
            return vec![];
        };
        let Some(set) = pts.pts(node) else {
            return vec![];
        };
        let mut callees: Vec<FuncId> = set
            .iter()
            .filter_map(|&o| match pag.node(o).kind {
                NodeKind::FuncObj { func } => Some(func),
                _ => None,
            })
            .collect();
        callees.sort_unstable();
        callees.dedup();
        callees
    }

    /// Instantiate everything the call wiring has reached so far. Returns
    /// (number instantiated, touched source nodes).
    pub fn drain_build_queue(
        &mut self,
        pag: &mut Pag,
        call_graph: &mut CallGraph,
    ) -> Result<(usize, Vec<NodeId>)> {
        let mut built = 0usize;
        let mut touched = Vec::new();
        while let Some((ctx, func)) = self.build_queue.pop_front() {
            if self.instantiated.contains(&(ctx, func)) {
                continue;
            }
            touched.extend(self.instantiate(pag, call_graph, ctx, func)?);
            built += 1;
        }
        Ok((built, touched))
    }
}
