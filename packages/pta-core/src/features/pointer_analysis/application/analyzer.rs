//! Analysis facade
//!
//! `PointerAnalysis` wraps configuration and the solver behind a small
//! surface: hand it a Scene and entry points, get back a `PtaResult` to
//! query. Results are value-level: per-context facts are unioned, so a
//! `no_alias` answer holds across every call path the analysis explored.

use crate::config::PtaConfig;
use crate::errors::{PtaError, Result};
use crate::features::pointer_analysis::domain::{DiffPtsStore, NodeId};
use crate::features::pointer_analysis::infrastructure::{Pag, Solver, SolverStats, TypeDiff};
use crate::features::pointer_analysis::ports::AliasOracle;
use crate::shared::models::call_graph::CallGraph;
use crate::shared::models::ir::{ClassId, FuncId, Scene, ValueId};
use rustc_hash::FxHashSet;

/// Entry point for running the pointer analysis.
pub struct PointerAnalysis<'s> {
    scene: &'s Scene,
    config: PtaConfig,
}

impl<'s> PointerAnalysis<'s> {
    pub fn new(scene: &'s Scene) -> Self {
        Self {
            scene,
            config: PtaConfig::default(),
        }
    }

    pub fn with_config(scene: &'s Scene, config: PtaConfig) -> Self {
        Self { scene, config }
    }

    /// Run from entry functions given by id.
    pub fn run(&self, entries: &[FuncId]) -> Result<PtaResult> {
        let mut solver = Solver::new(self.scene, self.config.clone());
        solver.run(entries)?;
        let type_diffs = if self.config.detect_type_diff {
            solver.type_diffs()
        } else {
            vec![]
        };
        let (pag, pts, call_graph, stats) = solver.into_parts();
        Ok(PtaResult {
            pag,
            pts,
            call_graph,
            stats,
            type_diffs,
        })
    }

    /// Run from entry functions given by signature.
    pub fn run_entry_signatures(&self, signatures: &[&str]) -> Result<PtaResult> {
        let entries = signatures
            .iter()
            .map(|sig| {
                self.scene
                    .method_by_signature(sig)
                    .ok_or_else(|| PtaError::scene(format!("unknown entry function `{}`", sig)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.run(&entries)
    }
}

/// Fixpoint artifacts of one run.
#[derive(Debug)]
pub struct PtaResult {
    pub pag: Pag,
    pub pts: DiffPtsStore,
    pub call_graph: CallGraph,
    pub stats: SolverStats,
    pub type_diffs: Vec<TypeDiff>,
}

impl PtaResult {
    /// Union of a value's points-to sets across every context it was
    /// analyzed in.
    pub fn points_to(&self, value: ValueId) -> FxHashSet<NodeId> {
        let mut out = FxHashSet::default();
        for &node in self.pag.nodes_of_value(value) {
            if let Some(pts) = self.pts.pts(node) {
                out.extend(pts.iter().copied());
            }
        }
        out
    }

    /// Heap classes a value may refer to, sorted and deduplicated.
    pub fn pointee_classes(&self, value: ValueId) -> Vec<ClassId> {
        let mut classes: Vec<ClassId> = self
            .points_to(value)
            .into_iter()
            .filter_map(|obj| self.pag.node(obj).kind.class_of())
            .collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }
}

impl AliasOracle for PtaResult {
    fn no_alias(&self, a: ValueId, b: ValueId) -> bool {
        let pa = self.points_to(a);
        if pa.is_empty() {
            return true;
        }
        let pb = self.points_to(b);
        pa.is_disjoint(&pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::SceneBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_alias_distinct_allocations() {
        let mut b = SceneBuilder::new();
        let a = b.class("A", None);
        let main = b.method("main", None);
        let x = b.local(main, "x");
        let y = b.local(main, "y");
        b.assign_new(main, x, a);
        b.assign_new(main, y, a);
        let scene = b.build();

        let result = PointerAnalysis::new(&scene)
            .run_entry_signatures(&["main()"])
            .unwrap();
        assert!(result.no_alias(x, y));
        assert!(!result.may_alias(x, y));
    }

    #[test]
    fn test_copy_establishes_may_alias() {
        let mut b = SceneBuilder::new();
        let a = b.class("A", None);
        let main = b.method("main", None);
        let x = b.local(main, "x");
        let y = b.local(main, "y");
        b.assign_new(main, x, a);
        b.assign_copy(main, y, x);
        let scene = b.build();

        let result = PointerAnalysis::new(&scene)
            .run_entry_signatures(&["main()"])
            .unwrap();
        assert!(result.may_alias(x, y));
        assert_eq!(result.pointee_classes(y), vec![a]);
    }

    #[test]
    fn test_unknown_entry_is_an_error() {
        let scene = SceneBuilder::new().build();
        let err = PointerAnalysis::new(&scene)
            .run_entry_signatures(&["nope()"])
            .unwrap_err();
        assert!(err.to_string().contains("nope()"));
    }
}
