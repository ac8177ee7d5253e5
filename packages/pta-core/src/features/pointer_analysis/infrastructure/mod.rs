//! Infrastructure: graph storage, construction, and the fixpoint engine

pub mod dot;
pub mod func_pag;
pub mod pag;
pub mod pag_builder;
pub mod solver;

pub use func_pag::{FuncPag, IntraEdge, VarEnd};
pub use pag::Pag;
pub use pag_builder::PagBuilder;
pub use solver::{Solver, SolverStats, TypeDiff};
