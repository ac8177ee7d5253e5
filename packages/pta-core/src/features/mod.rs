//! Feature modules

pub mod pointer_analysis;
