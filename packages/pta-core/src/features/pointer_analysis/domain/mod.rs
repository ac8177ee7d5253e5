//! Domain types for the pointer analysis

pub mod call_site;
pub mod context;
pub mod edge;
pub mod node;
pub mod pts;

pub use call_site::{CallSite, DynCallSite};
pub use context::ContextCache;
pub use edge::{EdgeKind, PagEdge};
pub use node::{CtxId, NodeId, NodeKind, PagNode};
pub use pts::DiffPtsStore;
