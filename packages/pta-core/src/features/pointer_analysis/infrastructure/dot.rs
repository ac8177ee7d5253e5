//! Graphviz snapshots
//!
//! Writes `pag_<stage>.dot` and `cg_<stage>.dot` into the configured
//! output directory. Diagnostic only; nothing reads these back.

use super::pag::Pag;
use crate::errors::Result;
use crate::features::pointer_analysis::domain::{DiffPtsStore, EdgeKind, NodeKind, PagNode};
use crate::shared::models::call_graph::{CallEdgeKind, CallGraph};
use crate::shared::models::ir::Scene;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub struct DotDumper {
    dir: PathBuf,
}

impl DotDumper {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn node_label(scene: &Scene, node: &PagNode) -> String {
        let label = match node.kind {
            NodeKind::Local { value } => {
                format!("{}@{}", scene.value(value).name, node.ctx)
            }
            NodeKind::StaticField { value } => format!("static {}", scene.value(value).name),
            NodeKind::FieldTemplate { base, field } => format!(
                "{}.{}@{}",
                scene.value(base).name,
                scene.field_name(field),
                node.ctx
            ),
            NodeKind::FieldClone { field, obj } => {
                format!("obj{}.{}", obj, scene.field_name(field))
            }
            NodeKind::ThisRef { func } => format!("this({})", scene.method(func).signature),
            NodeKind::HeapObj { site, class } => {
                format!("new {}#{}", scene.class(class).name, site)
            }
            NodeKind::FuncObj { func } => format!("fn {}", scene.method(func).signature),
            NodeKind::SdkObj { method } => format!("sdk {}", scene.method(method).signature),
        };
        label.replace('"', "'")
    }

    pub fn dump_pag(
        &self,
        scene: &Scene,
        pag: &Pag,
        pts: &DiffPtsStore,
        stage: &str,
    ) -> Result<()> {
        let mut out = String::new();
        let _ = writeln!(out, "digraph pag {{");
        let _ = writeln!(out, "  rankdir=LR;");
        for node in pag.nodes() {
            let label = Self::node_label(scene, node);
            let shape = if node.is_object() { "box" } else { "ellipse" };
            let facts = pts.pts(node.id).map(|s| s.len()).unwrap_or(0);
            let _ = writeln!(
                out,
                "  n{} [label=\"{}\\n|pts|={}\", shape={}];",
                node.id, label, facts, shape
            );
        }
        for edge in pag.edges() {
            let style = match edge.kind {
                EdgeKind::Address => "dashed",
                EdgeKind::Copy => "solid",
                EdgeKind::Load => "dotted",
                EdgeKind::Write => "dotted",
                EdgeKind::This => "bold",
            };
            let _ = writeln!(
                out,
                "  n{} -> n{} [label=\"{:?}\", style={}];",
                edge.src, edge.dst, edge.kind, style
            );
        }
        let _ = writeln!(out, "}}");
        fs::write(self.dir.join(format!("pag_{}.dot", stage)), out)?;
        Ok(())
    }

    pub fn dump_call_graph(&self, scene: &Scene, cg: &CallGraph, stage: &str) -> Result<()> {
        let mut out = String::new();
        let _ = writeln!(out, "digraph callgraph {{");
        for (caller, callee, kind) in cg.edges() {
            let style = match kind {
                CallEdgeKind::Static => "solid",
                CallEdgeKind::Dynamic => "dashed",
            };
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [style={}];",
                scene.method(caller).signature.replace('"', "'"),
                scene.method(callee).signature.replace('"', "'"),
                style
            );
        }
        let _ = writeln!(out, "}}");
        fs::write(self.dir.join(format!("cg_{}.dot", stage)), out)?;
        Ok(())
    }
}
