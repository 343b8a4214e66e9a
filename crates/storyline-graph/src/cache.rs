//! Process-wide graph and hook caches
//!
//! Provides [`GraphCache`], mapping a [`ModuleSetKey`] to its object graph
//! and hook instance set. Entries are built at most once per key with an
//! atomic compute-if-absent and are never evicted.

use crate::error::ConfigError;
use crate::graph::ObjectGraph;
use crate::hooks::{HookInstanceSet, HookRegistration};
use crate::module::{ModuleSet, ModuleSetKey};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static GLOBAL: Lazy<GraphCache> = Lazy::new(GraphCache::new);

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Object graphs built
    pub graphs_built: u64,
    /// Graph lookups served from the cache
    pub graph_hits: u64,
    /// Hook instance sets created
    pub hook_sets_built: u64,
    /// Hook lookups served from the cache
    pub hook_hits: u64,
}

/// Concurrent `ModuleSetKey` keyed caches
#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: DashMap<ModuleSetKey, Arc<ObjectGraph>>,
    hooks: DashMap<ModuleSetKey, Arc<HookInstanceSet>>,
    graphs_built: AtomicU64,
    graph_hits: AtomicU64,
    hook_sets_built: AtomicU64,
    hook_hits: AtomicU64,
}

impl GraphCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache shared by the whole process
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Fetch or build the graph for `set`
    ///
    /// Concurrent first requests for one key build the graph once; the
    /// others wait and share the result.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the graph build fails. Nothing is cached then.
    pub fn graph_for(&self, set: &ModuleSet) -> Result<Arc<ObjectGraph>, ConfigError> {
        if let Some(graph) = self.graphs.get(set.key()).map(|entry| Arc::clone(entry.value())) {
            self.graph_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %set.key(), "object graph cache hit");
            return Ok(graph);
        }

        let entry = self
            .graphs
            .entry(set.key().clone())
            .or_try_insert_with(|| {
                self.graphs_built.fetch_add(1, Ordering::Relaxed);
                ObjectGraph::build(set).map(Arc::new)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Fetch or create the hook instance set for `graph`
    ///
    /// The registration merges the hook contributions of every module in
    /// the graph.
    #[must_use]
    pub fn hooks_for(&self, graph: &ObjectGraph) -> Arc<HookInstanceSet> {
        if let Some(hooks) = self.hooks.get(graph.key()).map(|entry| Arc::clone(entry.value())) {
            self.hook_hits.fetch_add(1, Ordering::Relaxed);
            return hooks;
        }

        let entry = self.hooks.entry(graph.key().clone()).or_insert_with(|| {
            self.hook_sets_built.fetch_add(1, Ordering::Relaxed);
            let registration = HookRegistration::collect(graph);
            tracing::debug!(key = %graph.key(), hooks = ?registration.type_names(), "hook registration built");
            Arc::new(HookInstanceSet::new(registration))
        });
        Arc::clone(entry.value())
    }

    /// Check if a graph is cached for `key`
    #[must_use]
    pub fn contains(&self, key: &ModuleSetKey) -> bool {
        self.graphs.contains_key(key)
    }

    /// Number of cached graphs
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Check if no graph is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            graphs_built: self.graphs_built.load(Ordering::Relaxed),
            graph_hits: self.graph_hits.load(Ordering::Relaxed),
            hook_sets_built: self.hook_sets_built.load(Ordering::Relaxed),
            hook_hits: self.hook_hits.load(Ordering::Relaxed),
        }
    }
}
