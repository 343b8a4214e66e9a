//! Object graph built from a module set
//!
//! Provides [`ObjectGraph`], the instance container a test class run
//! consumes. Each binding carries an explicit [`Scope`]: shared bindings are
//! built once per graph, per-resolution bindings on every request.

use crate::binder::Binder;
use crate::error::{ConfigError, ResolveError};
use crate::hooks::ModuleHooks;
use crate::module::{ModuleSet, ModuleSetKey};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Boxed `Arc<T>` stored by a binding
pub(crate) type Erased = Box<dyn Any + Send + Sync>;

/// Type-erased binding factory
pub(crate) type ErasedFactory = Arc<dyn Fn(&ObjectGraph) -> Result<Erased, ResolveError> + Send + Sync>;

/// Instance ownership of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// One instance per graph, shared by every resolution
    Shared,
    /// A new instance on every resolution
    #[default]
    PerResolution,
}

pub(crate) struct Binding {
    pub(crate) type_name: &'static str,
    pub(crate) module: String,
    pub(crate) scope: Scope,
    pub(crate) factory: ErasedFactory,
    pub(crate) shared: OnceCell<Erased>,
}

thread_local! {
    static RESOLVING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

struct ResolvingGuard(TypeId);

impl ResolvingGuard {
    fn enter(id: TypeId, type_name: &'static str) -> Result<Self, ResolveError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                return Err(ResolveError::Cycle { type_name });
            }
            stack.push(id);
            Ok(Self(id))
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|id| *id == self.0) {
                stack.remove(pos);
            }
        });
    }
}

/// Instances and hook registrations for one module set
pub struct ObjectGraph {
    key: ModuleSetKey,
    modules: Vec<String>,
    bindings: HashMap<TypeId, Binding>,
    hooks: Vec<ModuleHooks>,
}

impl ObjectGraph {
    /// Build a graph by configuring every module of `set` in key order
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a module cannot be instantiated or
    /// configured, or two modules bind the same type.
    pub fn build(set: &ModuleSet) -> Result<Self, ConfigError> {
        let mut binder = Binder::new();
        for decl in set.modules() {
            let module = decl.instantiate()?;
            binder.configure_module(decl.name(), module.as_ref())?;
        }
        let parts = binder.finish()?;

        tracing::debug!(
            key = %set.key(),
            bindings = parts.bindings.len(),
            modules = parts.modules.len(),
            "object graph built"
        );

        Ok(Self {
            key: set.key().clone(),
            modules: parts.modules,
            bindings: parts.bindings,
            hooks: parts.hooks,
        })
    }

    /// Key of the module set this graph was built from
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ModuleSetKey {
        &self.key
    }

    /// Names of every configured module, installed ones included
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Hook registrations contributed by each module, in configuration order
    #[inline]
    #[must_use]
    pub fn hook_contributions(&self) -> &[ModuleHooks] {
        &self.hooks
    }

    /// Check if `T` is bound
    #[inline]
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<T>())
    }

    /// Scope of the binding for `T`
    #[inline]
    #[must_use]
    pub fn scope_of<T: ?Sized + 'static>(&self) -> Option<Scope> {
        self.bindings.get(&TypeId::of::<T>()).map(|b| b.scope)
    }

    /// Module that bound `T`
    #[must_use]
    pub fn bound_by<T: ?Sized + 'static>(&self) -> Option<&str> {
        self.bindings
            .get(&TypeId::of::<T>())
            .map(|b| b.module.as_str())
    }

    /// Resolve an instance of `T`
    ///
    /// # Errors
    /// - [`ResolveError::NotBound`] if no module bound `T`
    /// - [`ResolveError::Factory`] if the binding's factory failed
    /// - [`ResolveError::Cycle`] if `T` is already being resolved
    pub fn resolve<T>(&self) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let id = TypeId::of::<T>();
        let binding = self
            .bindings
            .get(&id)
            .ok_or(ResolveError::NotBound { type_name })?;

        let _guard = ResolvingGuard::enter(id, type_name)?;
        match binding.scope {
            Scope::Shared => {
                let erased = binding.shared.get_or_try_init(|| (binding.factory)(self))?;
                downcast::<T>(erased, binding.type_name)
            }
            Scope::PerResolution => {
                let erased = (binding.factory)(self)?;
                downcast::<T>(&erased, binding.type_name)
            }
        }
    }

    /// Resolve `T` if bound
    ///
    /// # Errors
    /// Same as [`ObjectGraph::resolve`], except that an unbound type yields `Ok(None)`.
    pub fn try_resolve<T>(&self) -> Result<Option<Arc<T>>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            self.resolve::<T>().map(Some)
        } else {
            Ok(None)
        }
    }
}

fn downcast<T: ?Sized + Send + Sync + 'static>(
    erased: &Erased,
    type_name: &'static str,
) -> Result<Arc<T>, ResolveError> {
    erased
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(ResolveError::TypeMismatch { type_name })
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("key", &self.key)
            .field("modules", &self.modules)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
