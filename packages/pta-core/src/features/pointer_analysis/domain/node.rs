//! PAG nodes
//!
//! Every node is a (context, kind) pair interned to a dense `NodeId`.
//! Pointer nodes name storage locations (locals, `this` references, field
//! templates and their per-object clones, static fields); object nodes
//! name the things pointed at (allocation sites, function values,
//! fabricated SDK return objects).

use crate::shared::models::ir::{AllocSiteId, ClassId, FieldId, FuncId, StmtId, ValueId};
use serde::{Deserialize, Serialize};

/// Dense PAG node identifier
pub type NodeId = u32;
/// Dense context identifier
pub type CtxId = u32;

/// What a PAG node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A local, parameter, or `this`-kinded value of some function body
    Local { value: ValueId },

    /// Field access template `base.field`; never holds points-to facts
    /// itself, it is cloned per concrete base object
    FieldTemplate { base: ValueId, field: FieldId },

    /// Clone of a field template for one concrete base object. The pair
    /// (field id, base object node) identifies it.
    FieldClone { field: FieldId, obj: NodeId },

    /// A static field value (global)
    StaticField { value: ValueId },

    /// The implicit receiver slot of a function instantiation; `This`
    /// edges flow receiver objects into it
    ThisRef { func: FuncId },

    /// Heap object from one allocation site
    HeapObj { site: AllocSiteId, class: ClassId },

    /// Function value object
    FuncObj { func: FuncId },

    /// Fabricated return object of an SDK (body-less) method
    SdkObj { method: FuncId },
}

impl NodeKind {
    /// True for nodes that can appear *inside* points-to sets.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            NodeKind::HeapObj { .. } | NodeKind::FuncObj { .. } | NodeKind::SdkObj { .. }
        )
    }

    /// Class of a heap object node, if it is one.
    #[inline]
    pub fn class_of(&self) -> Option<ClassId> {
        match self {
            NodeKind::HeapObj { class, .. } => Some(*class),
            _ => None,
        }
    }
}

/// An interned PAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagNode {
    pub id: NodeId,
    /// Context the node lives in
    pub ctx: CtxId,
    pub kind: NodeKind,
    /// Statement that introduced the node, when one did (diagnostics)
    pub stmt: Option<StmtId>,
}

impl PagNode {
    #[inline]
    pub fn is_object(&self) -> bool {
        self.kind.is_object()
    }
}
