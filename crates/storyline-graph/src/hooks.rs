//! Lifecycle hooks
//!
//! Modules register hook types while configuring; a [`HookRegistration`]
//! merges every module's contribution for one graph into a single ordered,
//! de-duplicated list, and a [`HookInstanceSet`] holds the live instances
//! resolved from that list.
//!
//! Callbacks always run in registration order, for "before" and "after"
//! alike.

use crate::error::ResolveError;
use crate::graph::ObjectGraph;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Identity of the test class being run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassInfo {
    name: String,
}

impl ClassInfo {
    /// Create class info
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Simple class name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Identity of the test method being run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInfo {
    class_name: String,
    name: String,
}

impl MethodInfo {
    /// Create method info
    #[must_use]
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
        }
    }

    /// Owning class name
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.name)
    }
}

/// Lifecycle callbacks around a class run
pub trait TestHook: Send + Sync + 'static {
    /// Before the test class is instantiated
    fn before_class_creation(&self, _class: &ClassInfo) {}

    /// Before each non-ignored test method
    fn before_test(&self, _method: &MethodInfo) {}

    /// After each non-ignored test method, whatever its outcome
    fn after_test(&self, _method: &MethodInfo) {}
}

type HookResolver = fn(&ObjectGraph) -> Result<Arc<dyn TestHook>, ResolveError>;

fn resolve_hook<H: TestHook>(graph: &ObjectGraph) -> Result<Arc<dyn TestHook>, ResolveError> {
    graph.resolve::<H>().map(|hook| hook as Arc<dyn TestHook>)
}

/// One registered hook type
#[derive(Clone, Copy)]
pub struct HookEntry {
    type_id: TypeId,
    type_name: &'static str,
    resolver: HookResolver,
}

impl HookEntry {
    /// Entry for hook type `H`
    #[must_use]
    pub fn of<H: TestHook>() -> Self {
        Self {
            type_id: TypeId::of::<H>(),
            type_name: std::any::type_name::<H>(),
            resolver: resolve_hook::<H>,
        }
    }

    /// Hook type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolve a live instance from `graph`
    ///
    /// # Errors
    /// Returns [`ResolveError`] if the hook type is not bound or its factory fails.
    pub fn resolve(&self, graph: &ObjectGraph) -> Result<Arc<dyn TestHook>, ResolveError> {
        (self.resolver)(graph)
    }
}

impl fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookEntry").field(&self.type_name).finish()
    }
}

/// Hook types registered by one module
#[derive(Debug, Clone)]
pub struct ModuleHooks {
    module: String,
    hooks: Vec<HookEntry>,
}

impl ModuleHooks {
    pub(crate) fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            hooks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: HookEntry) {
        self.hooks.push(entry);
    }

    /// Registering module
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Registered hook types, in registration order
    #[inline]
    #[must_use]
    pub fn hooks(&self) -> &[HookEntry] {
        &self.hooks
    }
}

/// Ordered, de-duplicated hook types of one graph
#[derive(Debug, Clone, Default)]
pub struct HookRegistration {
    entries: IndexMap<TypeId, HookEntry>,
}

impl HookRegistration {
    /// Merge the contributions of every module in `graph`
    ///
    /// The first registration of a type fixes its position.
    #[must_use]
    pub fn collect(graph: &ObjectGraph) -> Self {
        let mut registration = Self::default();
        for contribution in graph.hook_contributions() {
            for entry in contribution.hooks() {
                registration.register(*entry);
            }
        }
        registration
    }

    /// Append `entry` unless its type is already registered
    pub fn register(&mut self, entry: HookEntry) -> bool {
        if self.entries.contains_key(&entry.type_id) {
            return false;
        }
        self.entries.insert(entry.type_id, entry);
        true
    }

    /// Registered entries, in order
    pub fn entries(&self) -> impl Iterator<Item = &HookEntry> {
        self.entries.values()
    }

    /// Registered type names, in order
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.values().map(HookEntry::type_name).collect()
    }

    /// Number of registered hook types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no hook is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot of live hook instances for one class run
pub type HookSnapshot = Arc<[Arc<dyn TestHook>]>;

/// Registration plus the live instances resolved from it
pub struct HookInstanceSet {
    registration: HookRegistration,
    live: RwLock<HookSnapshot>,
}

impl HookInstanceSet {
    /// Create a set with no live instances yet
    #[must_use]
    pub fn new(registration: HookRegistration) -> Self {
        Self {
            registration,
            live: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Registration this set resolves
    #[inline]
    #[must_use]
    pub fn registration(&self) -> &HookRegistration {
        &self.registration
    }

    /// Re-resolve every registered hook from `graph`
    ///
    /// Shared hooks come back as the same instance, per-resolution hooks as
    /// fresh ones. The live set is replaced only when every hook resolved.
    ///
    /// # Errors
    /// Returns the first [`ResolveError`]; the previous live set is kept.
    pub fn refresh(&self, graph: &ObjectGraph) -> Result<HookSnapshot, ResolveError> {
        let resolved = self
            .registration
            .entries()
            .map(|entry| entry.resolve(graph))
            .collect::<Result<Vec<_>, _>>()?;
        let snapshot: HookSnapshot = Arc::from(resolved);

        *self.live.write() = Arc::clone(&snapshot);
        tracing::debug!(key = %graph.key(), hooks = snapshot.len(), "hook instances refreshed");
        Ok(snapshot)
    }

    /// Current live instances
    #[must_use]
    pub fn instances(&self) -> HookSnapshot {
        Arc::clone(&self.live.read())
    }
}

impl fmt::Debug for HookInstanceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookInstanceSet")
            .field("registration", &self.registration)
            .field("live", &self.live.read().len())
            .finish()
    }
}
