//! Analysis configuration
//!
//! All knobs recognized by the pointer analysis. Precision and cost are
//! traded off through `k_limit`: contexts are bounded call strings of at
//! most `k_limit` callee frames, so larger values clone more nodes and
//! resolve more dynamic calls precisely, at a memory cost that multiplies
//! every function-local node by the context cardinality.

use crate::errors::{PtaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// When to emit graphviz snapshots of the PAG and call graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DotDump {
    /// Never write dot files
    Off,

    /// One snapshot after the fixpoint completes
    Final,

    /// Snapshot after initialization, after every solver round, and at the end
    EveryRound,
}

impl Default for DotDump {
    fn default() -> Self {
        DotDump::Off
    }
}

/// Configuration for a pointer analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtaConfig {
    /// Call-string bound for context sensitivity (0 = context-insensitive)
    pub k_limit: usize,

    /// Directory for diagnostic graph dumps
    pub output_directory: PathBuf,

    /// Graphviz snapshot checkpoints
    pub dot_dump: DotDump,

    /// Additionally record, per local, runtime classes differing from the
    /// declared static type
    pub detect_type_diff: bool,

    /// Hard cap on solver rounds (0 = run to fixpoint). The core contract
    /// has no timeout; a caller wanting bounded-time analysis sets this.
    pub max_rounds: usize,
}

impl Default for PtaConfig {
    fn default() -> Self {
        Self {
            k_limit: 1,
            output_directory: PathBuf::from("pta_out"),
            dot_dump: DotDump::default(),
            detect_type_diff: false,
            max_rounds: 0,
        }
    }
}

impl PtaConfig {
    /// Validate the configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if self.k_limit > 16 {
            return Err(PtaError::config(format!(
                "k_limit {} is unreasonably large (max 16)",
                self.k_limit
            )));
        }
        if self.dot_dump != DotDump::Off && self.output_directory.as_os_str().is_empty() {
            return Err(PtaError::config(
                "dot_dump enabled but output_directory is empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PtaConfig::default();
        assert_eq!(config.k_limit, 1);
        assert_eq!(config.dot_dump, DotDump::Off);
        assert!(!config.detect_type_diff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_huge_k() {
        let config = PtaConfig {
            k_limit: 64,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_output_dir_with_dumps() {
        let config = PtaConfig {
            dot_dump: DotDump::Final,
            output_directory: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
