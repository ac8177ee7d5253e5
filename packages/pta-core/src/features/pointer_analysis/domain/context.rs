//! Call-string contexts
//!
//! A context is a bounded call string: the most recent `k` call sites on
//! the path that reached a function. Identical strings share one `CtxId`,
//! so recursion and repeated call paths fold into finitely many contexts
//! and the analysis terminates. Keying frames by call site rather than
//! callee keeps two calls to the same function from conflating at k = 1.

use super::node::CtxId;
use crate::shared::models::ir::{FuncId, StmtId};
use rustc_hash::FxHashMap;

/// Interned call strings with k-limiting.
#[derive(Debug)]
pub struct ContextCache {
    contexts: Vec<Vec<StmtId>>,
    index: FxHashMap<Vec<StmtId>, CtxId>,
    k_limit: usize,
}

impl ContextCache {
    pub fn new(k_limit: usize) -> Self {
        Self {
            contexts: Vec::new(),
            index: FxHashMap::default(),
            k_limit,
        }
    }

    #[inline]
    pub fn k_limit(&self) -> usize {
        self.k_limit
    }

    /// Number of distinct contexts allocated so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Allocate a fresh root context for an entry function. Root contexts
    /// carry an empty call string and are deliberately *not* interned:
    /// each entry point gets its own, so facts from two entries never
    /// merge through a shared root.
    pub fn new_context(&mut self, _func: FuncId) -> CtxId {
        let id = self.contexts.len() as CtxId;
        self.contexts.push(Vec::new());
        id
    }

    /// Derive the context for a call made at `call_site` under `parent`:
    /// append the frame, drop the oldest frames beyond `k_limit`, intern.
    pub fn context_for(&mut self, parent: CtxId, call_site: StmtId) -> CtxId {
        let mut string = self.contexts[parent as usize].clone();
        string.push(call_site);
        if string.len() > self.k_limit {
            let excess = string.len() - self.k_limit;
            string.drain(..excess);
        }
        if let Some(&id) = self.index.get(&string) {
            return id;
        }
        let id = self.contexts.len() as CtxId;
        self.contexts.push(string.clone());
        self.index.insert(string, id);
        id
    }

    /// The call string of a context, most recent call site last.
    pub fn call_string(&self, ctx: CtxId) -> &[StmtId] {
        &self.contexts[ctx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_limit_truncates_oldest() {
        let mut cache = ContextCache::new(2);
        let root = cache.new_context(0);
        let c1 = cache.context_for(root, 10);
        let c2 = cache.context_for(c1, 11);
        let c3 = cache.context_for(c2, 12);
        assert_eq!(cache.call_string(c3), &[11, 12]);
    }

    #[test]
    fn test_identical_strings_share_id() {
        let mut cache = ContextCache::new(2);
        let root = cache.new_context(0);
        let a = cache.context_for(root, 10);
        let b = cache.context_for(root, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_recursion_folds_to_finitely_many() {
        // A self-call from one site under k=1 stabilizes to one context.
        let mut cache = ContextCache::new(1);
        let root = cache.new_context(5);
        let c1 = cache.context_for(root, 5);
        let c2 = cache.context_for(c1, 5);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_root_contexts_are_distinct() {
        let mut cache = ContextCache::new(2);
        let a = cache.new_context(0);
        let b = cache.new_context(1);
        assert_ne!(a, b);
        assert!(cache.call_string(a).is_empty());
        assert!(cache.call_string(b).is_empty());
    }

    #[test]
    fn test_k_zero_is_context_insensitive() {
        let mut cache = ContextCache::new(0);
        let root = cache.new_context(0);
        let a = cache.context_for(root, 10);
        let b = cache.context_for(a, 11);
        assert_eq!(a, b);
        assert!(cache.call_string(a).is_empty());
    }
}
