//! Whole-program pointer analysis
//!
//! Flow-insensitive, field-sensitive, context-sensitive points-to
//! analysis. A Scene is summarized into per-function templates, stamped
//! into a pointer assignment graph under k-limited call-string contexts,
//! and solved to a least fixpoint with a differential worklist. The call
//! graph grows on the fly as receiver points-to sets resolve dynamic
//! dispatch.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{PointerAnalysis, PtaResult};
pub use domain::{ContextCache, CtxId, EdgeKind, NodeId, NodeKind, PagEdge, PagNode};
pub use infrastructure::{Pag, Solver, SolverStats, TypeDiff};
pub use ports::AliasOracle;
