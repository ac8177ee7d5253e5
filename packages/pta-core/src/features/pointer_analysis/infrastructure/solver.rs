//! Worklist fixpoint solver
//!
//! Inclusion-based propagation over the PAG with differential sets: a
//! node visit pushes only its unflushed diff along outgoing copy edges,
//! materializes field clones for newly seen base objects, and dispatches
//! dynamic call sites against newly seen receiver objects. Because every
//! step only ever adds nodes, edges, or facts, and all three spaces are
//! finite under the k-limit, the loop terminates at the least fixpoint.

use super::dot::DotDumper;
use super::pag::Pag;
use super::pag_builder::PagBuilder;
use crate::config::{DotDump, PtaConfig};
use crate::errors::Result;
use crate::features::pointer_analysis::domain::{DiffPtsStore, EdgeKind, NodeId, NodeKind};
use crate::shared::models::call_graph::CallGraph;
use crate::shared::models::ir::{ClassId, FuncId, Scene, ValueId};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters reported after a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolverStats {
    pub rounds: usize,
    pub nodes: usize,
    pub edges: usize,
    pub contexts: usize,
    pub field_clones: usize,
    pub dyn_edges_resolved: usize,
    /// Individual facts moved along edges
    pub propagated_facts: usize,
    /// Committed facts at the fixpoint
    pub total_facts: usize,
    pub duration_ms: u64,
}

/// A local whose observed runtime class differs from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypeDiff {
    pub value: ValueId,
    pub declared: ClassId,
    pub observed: ClassId,
}

/// One pointer analysis run over a Scene.
pub struct Solver<'s> {
    scene: &'s Scene,
    config: PtaConfig,
    builder: PagBuilder<'s>,

    pag: Pag,
    pts: DiffPtsStore,
    call_graph: CallGraph,

    worklist: VecDeque<NodeId>,
    in_worklist: FxHashSet<NodeId>,
    /// Address edges before this index have been seeded
    addr_cursor: usize,

    stats: SolverStats,
}

impl<'s> Solver<'s> {
    pub fn new(scene: &'s Scene, config: PtaConfig) -> Self {
        let builder = PagBuilder::new(scene, &config);
        Self {
            scene,
            config,
            builder,
            pag: Pag::new(),
            pts: DiffPtsStore::new(),
            call_graph: CallGraph::new(),
            worklist: VecDeque::new(),
            in_worklist: FxHashSet::default(),
            addr_cursor: 0,
            stats: SolverStats::default(),
        }
    }

    /// Run to the fixpoint from the given entry functions.
    pub fn run(&mut self, entries: &[FuncId]) -> Result<()> {
        let start = Instant::now();
        self.config.validate()?;
        let dumper = match self.config.dot_dump {
            DotDump::Off => None,
            _ => Some(DotDumper::new(self.config.output_directory.clone())?),
        };

        for &entry in entries {
            self.builder.add_entry(entry)?;
        }
        let (_, touched) = self
            .builder
            .drain_build_queue(&mut self.pag, &mut self.call_graph)?;
        self.reseed(touched);
        if self.config.dot_dump == DotDump::EveryRound {
            self.dump(dumper.as_ref(), "init")?;
        }

        loop {
            self.stats.rounds += 1;
            self.seed_addr_edges();
            let mut resolved = self.drain()?;
            let (touched, retried) = self.builder.retry_unresolved_dispatch(
                &mut self.pag,
                &self.pts,
                &mut self.call_graph,
            )?;
            self.reseed(touched);
            resolved += retried;
            self.stats.dyn_edges_resolved += resolved;
            let (built, touched) = self
                .builder
                .drain_build_queue(&mut self.pag, &mut self.call_graph)?;
            self.reseed(touched);
            if self.config.dot_dump == DotDump::EveryRound {
                self.dump(dumper.as_ref(), &format!("round_{}", self.stats.rounds))?;
            }
            debug!(
                round = self.stats.rounds,
                resolved, built, "solver round complete"
            );

            let pending = self.addr_cursor < self.pag.addr_edges().len()
                || !self.worklist.is_empty();
            if resolved == 0 && built == 0 && !pending {
                break;
            }
            if self.config.max_rounds > 0 && self.stats.rounds >= self.config.max_rounds {
                warn!(
                    rounds = self.stats.rounds,
                    "stopping before the fixpoint: max_rounds reached"
                );
                break;
            }
        }

        if self.config.dot_dump != DotDump::Off {
            self.dump(dumper.as_ref(), "final")?;
        }

        self.stats.nodes = self.pag.node_count();
        self.stats.edges = self.pag.edge_count();
        self.stats.contexts = self.builder.ctxs.len();
        self.stats.field_clones = self.pag.distinct_field_clones();
        self.stats.total_facts = self.pts.total_facts();
        self.stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            rounds = self.stats.rounds,
            nodes = self.stats.nodes,
            edges = self.stats.edges,
            facts = self.stats.total_facts,
            "pointer analysis converged"
        );
        Ok(())
    }

    /// Seed points-to facts from address edges added since the last pass.
    fn seed_addr_edges(&mut self) {
        while self.addr_cursor < self.pag.addr_edges().len() {
            let (obj, ptr) = self.pag.addr_edges()[self.addr_cursor];
            self.addr_cursor += 1;
            if self.pts.add(ptr, obj) {
                self.enqueue(ptr);
            }
        }
    }

    /// Propagate until the worklist drains. Returns the number of dynamic
    /// call edges resolved along the way.
    fn drain(&mut self) -> Result<usize> {
        let mut resolved = 0usize;
        while let Some(n) = self.worklist.pop_front() {
            self.in_worklist.remove(&n);
            let diff: Vec<NodeId> = match self.pts.diff(n) {
                Some(d) if !d.is_empty() => d.iter().copied().collect(),
                _ => continue,
            };

            self.materialize_field_clones(n, &diff)?;

            if self.builder.dyn_sites_on(n).is_some() {
                for &obj in &diff {
                    let (touched, r) = self.builder.add_dynamic_call_edges(
                        &mut self.pag,
                        &self.pts,
                        &mut self.call_graph,
                        n,
                        obj,
                    )?;
                    resolved += r;
                    self.reseed(touched);
                }
            }

            for dst in self.pag.copy_targets(n).to_vec() {
                let moved = self.pts.calculate_diff(n, dst);
                let mut grew = false;
                for obj in moved {
                    if self.pts.add(dst, obj) {
                        self.stats.propagated_facts += 1;
                        grew = true;
                    }
                }
                if grew {
                    self.enqueue(dst);
                }
            }

            self.pts.flush(n);
        }
        Ok(resolved)
    }

    /// Specialize the field templates hanging off `n` to each newly seen
    /// base object, wiring the clone into the template's loads and writes.
    fn materialize_field_clones(&mut self, n: NodeId, diff: &[NodeId]) -> Result<()> {
        let templates = self.pag.templates_of_base(n).to_vec();
        for template in templates {
            for &obj in diff {
                let (clone, fresh) = self.pag.get_or_clone_field_node(template, obj)?;
                if !fresh {
                    continue;
                }
                for dst in self.pag.load_targets(template).to_vec() {
                    // The clone may predate this template's loads and hold
                    // facts already, so re-arm it for the new edge.
                    if self.pag.add_edge(clone, dst, EdgeKind::Copy, None) {
                        self.reseed_one(clone);
                    }
                }
                for src in self.pag.write_sources(template).to_vec() {
                    if self.pag.add_edge(src, clone, EdgeKind::Copy, None) {
                        self.reseed_one(src);
                    }
                }
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, node: NodeId) {
        if self.in_worklist.insert(node) {
            self.worklist.push_back(node);
        }
    }

    /// Re-arm nodes that gained outgoing edges after propagating.
    fn reseed(&mut self, nodes: Vec<NodeId>) {
        for n in nodes {
            self.reseed_one(n);
        }
    }

    fn reseed_one(&mut self, node: NodeId) {
        self.pts.reset_elem(node);
        self.enqueue(node);
    }

    fn dump(&self, dumper: Option<&DotDumper>, stage: &str) -> Result<()> {
        if let Some(d) = dumper {
            d.dump_pag(self.scene, &self.pag, &self.pts, stage)?;
            d.dump_call_graph(self.scene, &self.call_graph, stage)?;
        }
        Ok(())
    }

    /// Locals whose observed heap classes differ from their declared type.
    /// Meaningful only after `run`.
    pub fn type_diffs(&self) -> Vec<TypeDiff> {
        let mut out = FxHashSet::default();
        for node in self.pag.nodes() {
            let NodeKind::Local { value } = node.kind else {
                continue;
            };
            let crate::shared::models::ir::TypeHint::Class(declared) =
                self.scene.value(value).declared_type
            else {
                continue;
            };
            let Some(pts) = self.pts.pts(node.id) else {
                continue;
            };
            for &obj in pts {
                if let Some(observed) = self.pag.node(obj).kind.class_of() {
                    if observed != declared {
                        out.insert(TypeDiff {
                            value,
                            declared,
                            observed,
                        });
                    }
                }
            }
        }
        let mut diffs: Vec<TypeDiff> = out.into_iter().collect();
        diffs.sort_by_key(|d| (d.value, d.observed));
        diffs
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Hand the analysis artifacts over to the caller.
    pub fn into_parts(self) -> (Pag, DiffPtsStore, CallGraph, SolverStats) {
        (self.pag, self.pts, self.call_graph, self.stats)
    }
}
