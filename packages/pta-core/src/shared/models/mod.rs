//! Shared data models

pub mod call_graph;
pub mod ir;
pub mod scene_builder;

pub use call_graph::{CallEdgeKind, CallGraph};
pub use ir::{
    AllocSiteId, CallExpr, CalleeRef, ClassDef, ClassId, FieldId, FuncId, LValue, MethodDef,
    Operand, RValue, Scene, Stmt, StmtId, StmtKind, TypeHint, ValueDef, ValueId, ValueKind,
};
pub use scene_builder::SceneBuilder;
