//! # pta-core
//!
//! Whole-program pointer analysis over a language-neutral Scene IR.
//!
//! Pipeline: a frontend produces a [`Scene`] (classes, methods, lowered
//! statements); [`PointerAnalysis`] summarizes reachable functions into
//! templates, instantiates them under k-limited call-string contexts into
//! a pointer assignment graph, and solves the graph to a least fixpoint.
//! The result answers points-to and alias queries and carries the call
//! graph grown during solving.
//!
//! ```
//! use pta_core::{PointerAnalysis, SceneBuilder};
//!
//! let mut b = SceneBuilder::new();
//! let a = b.class("A", None);
//! let main = b.method("main", None);
//! let x = b.local(main, "x");
//! let y = b.local(main, "y");
//! b.assign_new(main, x, a);
//! b.assign_new(main, y, a);
//! let scene = b.build();
//!
//! let result = PointerAnalysis::new(&scene)
//!     .run_entry_signatures(&["main()"])
//!     .unwrap();
//! assert!(pta_core::AliasOracle::no_alias(&result, x, y));
//! ```

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{DotDump, PtaConfig};
pub use errors::{PtaError, Result};
pub use features::pointer_analysis::{
    AliasOracle, PointerAnalysis, PtaResult, Solver, SolverStats, TypeDiff,
};
pub use shared::models::{CallGraph, Scene, SceneBuilder};
