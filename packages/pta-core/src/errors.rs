//! Error types for pta-core
//!
//! Provides unified error handling across the crate.
//!
//! Two classes of failure are distinguished here. Invariant violations
//! (a field clone requested for a node that is not a field template) abort
//! the current analysis run and carry enough context to diagnose the
//! offending node. Expected misses, like an unresolvable dynamic callee,
//! an SDK method without a body, or an unmodeled composite operand, are
//! *not* errors and never appear here; they surface as
//! `Option::None`/empty results at the call sites that tolerate them.

use thiserror::Error;

/// Main error type for pta-core operations
#[derive(Debug, Error)]
pub enum PtaError {
    /// IO error (dot dumps, fixture loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (scene fixtures, stats output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed program model (dangling ids, missing bodies where required)
    #[error("Scene error: {0}")]
    Scene(String),

    /// Internal analysis invariant violated; not attributable to valid input
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PtaError {
    /// Create a scene error
    pub fn scene(msg: impl Into<String>) -> Self {
        PtaError::Scene(msg.into())
    }

    /// Create an invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        PtaError::Invariant(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        PtaError::Config(msg.into())
    }
}

/// Result type alias for pta-core operations
pub type Result<T> = std::result::Result<T, PtaError>;
