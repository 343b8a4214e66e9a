//! Binding registration
//!
//! Provides [`Binder`], handed to every [`Module::configure`] call.
//!
//! [`Module::configure`]: crate::Module::configure

use crate::error::{ConfigError, ResolveError};
use crate::graph::{Binding, Erased, ErasedFactory, ObjectGraph, Scope};
use crate::hooks::{HookEntry, ModuleHooks, TestHook};
use crate::module::Module;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct GraphParts {
    pub(crate) modules: Vec<String>,
    pub(crate) bindings: HashMap<TypeId, Binding>,
    pub(crate) hooks: Vec<ModuleHooks>,
}

/// Collects bindings and hook registrations while modules configure
pub struct Binder {
    modules: Vec<String>,
    bindings: HashMap<TypeId, Binding>,
    hooks: Vec<ModuleHooks>,
    current: Vec<usize>,
    errors: Vec<ConfigError>,
}

impl Binder {
    pub(crate) fn new() -> Self {
        Self {
            modules: Vec::new(),
            bindings: HashMap::new(),
            hooks: Vec::new(),
            current: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn configure_module(&mut self, name: &str, module: &dyn Module) -> Result<(), ConfigError> {
        if self.modules.iter().any(|m| m == name) {
            tracing::trace!(module = name, "module already configured");
            return Ok(());
        }
        self.modules.push(name.to_string());
        self.hooks.push(ModuleHooks::new(name));
        self.current.push(self.hooks.len() - 1);
        let result = module.configure(self);
        self.current.pop();
        result
    }

    pub(crate) fn finish(mut self) -> Result<GraphParts, ConfigError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(GraphParts {
            modules: self.modules,
            bindings: self.bindings,
            hooks: self.hooks,
        })
    }

    /// Name of the module currently configuring
    #[must_use]
    pub fn current_module(&self) -> Option<&str> {
        self.current
            .last()
            .map(|&idx| self.hooks[idx].module())
    }

    /// Bind `T` to a factory
    ///
    /// Binding a type twice fails the graph build with
    /// [`ConfigError::DuplicateBinding`].
    pub fn bind<T, F>(&mut self, scope: Scope, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ObjectGraph) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let module = self.current_module().unwrap_or_default().to_string();

        if let Some(existing) = self.bindings.get(&TypeId::of::<T>()) {
            self.errors.push(ConfigError::DuplicateBinding {
                type_name,
                first: existing.module.clone(),
                second: module,
            });
            return self;
        }

        let erased: ErasedFactory =
            Arc::new(move |graph: &ObjectGraph| factory(graph).map(|arc| Box::new(arc) as Erased));
        self.bindings.insert(
            TypeId::of::<T>(),
            Binding {
                type_name,
                module,
                scope,
                factory: erased,
                shared: OnceCell::new(),
            },
        );
        self
    }

    /// Bind `T` to one existing instance
    pub fn bind_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind::<T, _>(Scope::Shared, move |_| Ok(Arc::clone(&instance)))
    }

    /// Bind `T` to its `Default` constructor
    pub fn bind_default<T>(&mut self, scope: Scope) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.bind::<T, _>(scope, |_| Ok(Arc::new(T::default())))
    }

    /// Register hook type `H` for the current module
    ///
    /// `H` must be bound by some module of the same graph.
    pub fn register_hook<H: TestHook>(&mut self) -> &mut Self {
        if let Some(&idx) = self.current.last() {
            self.hooks[idx].push(HookEntry::of::<H>());
        }
        self
    }

    /// Bind hook type `H` and register it for the current module
    pub fn bind_hook<H, F>(&mut self, scope: Scope, factory: F) -> &mut Self
    where
        H: TestHook,
        F: Fn(&ObjectGraph) -> Result<H, ResolveError> + Send + Sync + 'static,
    {
        self.bind::<H, _>(scope, move |graph| factory(graph).map(Arc::new))
            .register_hook::<H>()
    }

    /// Configure a nested module as part of this graph
    ///
    /// Its bindings and hook registrations join the same graph; installing
    /// a module twice configures it once.
    ///
    /// # Errors
    /// Propagates the nested module's [`ConfigError`].
    pub fn install<M: Module + 'static>(&mut self, module: M) -> Result<&mut Self, ConfigError> {
        self.configure_module(std::any::type_name::<M>(), &module)?;
        Ok(self)
    }
}
