//! Call sites recorded in function templates

use crate::shared::models::ir::{FuncId, Operand, StmtId, ValueId};

/// A call whose target is known statically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub stmt: StmtId,
    pub caller: FuncId,
    pub callee: FuncId,
    /// Receiver value for instance calls
    pub receiver: Option<ValueId>,
    pub args: Vec<Operand>,
    /// Destination of the call's return value, if the program uses it
    pub lhs: Option<ValueId>,
}

/// A call dispatched on the receiver's runtime type; targets accumulate
/// as the receiver's points-to set grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynCallSite {
    pub stmt: StmtId,
    pub caller: FuncId,
    pub receiver: ValueId,
    pub method: String,
    pub args: Vec<Operand>,
    pub lhs: Option<ValueId>,
}
