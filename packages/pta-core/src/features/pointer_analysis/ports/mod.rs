//! Ports: interfaces other components consume

use crate::shared::models::ir::ValueId;

/// Alias facts exposed to downstream analyses.
///
/// `no_alias` is the load-bearing guarantee: a `true` answer means the
/// two values can never refer to the same object in any modeled
/// execution. `may_alias` is its negation and inherits the analysis's
/// over-approximation.
pub trait AliasOracle {
    /// True when the values' points-to sets are provably disjoint.
    fn no_alias(&self, a: ValueId, b: ValueId) -> bool;

    /// True when the values may refer to the same object.
    fn may_alias(&self, a: ValueId, b: ValueId) -> bool {
        !self.no_alias(a, b)
    }
}
