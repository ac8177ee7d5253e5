//! PAG edges

use super::node::NodeId;
use crate::shared::models::ir::StmtId;
use serde::{Deserialize, Serialize};

/// Flow kind of a PAG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// `dst` points to the object node `src` (allocation / func-ref seeding)
    Address,

    /// Subset flow: pts(src) ⊆ pts(dst)
    Copy,

    /// `dst = src.field`, where `src` is a field template node
    Load,

    /// `dst.field = src`, where `dst` is a field template node
    Write,

    /// Receiver binding: objects flowing from `src` land in the callee's
    /// `ThisRef` node `dst`
    This,
}

/// A directed PAG edge, tagged with the statement that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PagEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
    pub stmt: Option<StmtId>,
}
