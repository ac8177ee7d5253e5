//! Application layer

pub mod analyzer;

pub use analyzer::{PointerAnalysis, PtaResult};
