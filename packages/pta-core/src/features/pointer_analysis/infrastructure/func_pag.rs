//! Per-function PAG templates
//!
//! A `FuncPag` is the context-independent summary of one function body:
//! its internal edges over symbolic endpoints plus its call sites. Built
//! once per function, instantiated once per (context, function) pair by
//! stamping every symbolic endpoint into a concrete contexted node.

use crate::features::pointer_analysis::domain::{CallSite, DynCallSite, EdgeKind};
use crate::shared::models::ir::{AllocSiteId, ClassId, FieldId, FuncId, StmtId, ValueId};

/// Symbolic endpoint of an intra-function edge, resolved to a PAG node at
/// instantiation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarEnd {
    /// A local, param, `this` local, or static field
    Value(ValueId),

    /// `base.field` access template
    Field { base: ValueId, field: FieldId },

    /// Heap object from an allocation site
    Alloc { site: AllocSiteId, class: ClassId },

    /// Function value object
    FuncObj { func: FuncId },

    /// The function's implicit receiver slot
    This,
}

/// One context-independent edge of a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntraEdge {
    pub src: VarEnd,
    pub dst: VarEnd,
    pub kind: EdgeKind,
    pub stmt: StmtId,
}

/// Context-independent template of a single function.
#[derive(Debug, Clone, Default)]
pub struct FuncPag {
    pub func: FuncId,
    pub internal_edges: Vec<IntraEdge>,
    pub call_sites: Vec<CallSite>,
    pub dyn_call_sites: Vec<DynCallSite>,
    /// Values flowing out through `return`
    pub returns: Vec<ValueId>,
}

impl FuncPag {
    pub fn new(func: FuncId) -> Self {
        Self {
            func,
            ..Default::default()
        }
    }
}
