//! Configuration modules and module-set keys
//!
//! A test class declares the modules that build its object graph. Two
//! classes declaring the same set of modules, in any order and with any
//! duplicates, share one [`ModuleSetKey`] and therefore one graph.

use crate::binder::Binder;
use crate::error::ConfigError;
use std::fmt::{self, Display, Formatter};

/// Configuration module contributing bindings and hooks to an object graph
pub trait Module: Send + Sync {
    /// Register bindings and hooks
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the module cannot configure itself.
    fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError>;
}

/// Factory producing a fresh module instance
pub type ModuleFactory = fn() -> Result<Box<dyn Module>, ConfigError>;

/// A module declared by a test class
#[derive(Clone)]
pub struct ModuleDecl {
    name: String,
    factory: ModuleFactory,
}

impl ModuleDecl {
    /// Declare a module type constructed with `Default`
    #[inline]
    #[must_use]
    pub fn of<M: Module + Default + 'static>() -> Self {
        Self {
            name: std::any::type_name::<M>().to_string(),
            factory: instantiate::<M>,
        }
    }

    /// Declare a module with an explicit name and factory
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, factory: ModuleFactory) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// Module name (identity within a module set)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instantiate the module
    ///
    /// # Errors
    /// Returns [`ConfigError::ModuleInstantiation`] when the factory fails.
    pub fn instantiate(&self) -> Result<Box<dyn Module>, ConfigError> {
        (self.factory)().map_err(|err| match err {
            ConfigError::ModuleInstantiation { .. } => err,
            other => ConfigError::instantiation(&self.name, other.to_string()),
        })
    }
}

impl fmt::Debug for ModuleDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDecl").field("name", &self.name).finish()
    }
}

fn instantiate<M: Module + Default + 'static>() -> Result<Box<dyn Module>, ConfigError> {
    Ok(Box::new(M::default()))
}

/// Canonical, order-independent identity of a module set
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleSetKey(String);

impl ModuleSetKey {
    /// Key as a string (`[a, b, c]`)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ModuleSetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// De-duplicated, name-sorted module declarations with their key
#[derive(Debug, Clone)]
pub struct ModuleSet {
    key: ModuleSetKey,
    modules: Vec<ModuleDecl>,
}

impl ModuleSet {
    /// Canonicalize the modules declared by `class`
    ///
    /// # Errors
    /// - [`ConfigError::MissingModules`] if `declared` is `None`
    /// - [`ConfigError::EmptyModules`] if the declaration is empty
    pub fn for_class(class: &str, declared: Option<&[ModuleDecl]>) -> Result<Self, ConfigError> {
        let declared = declared.ok_or_else(|| ConfigError::MissingModules {
            class: class.to_string(),
        })?;
        if declared.is_empty() {
            return Err(ConfigError::EmptyModules {
                class: class.to_string(),
            });
        }

        let mut modules = declared.to_vec();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules.dedup_by(|a, b| a.name == b.name);

        let names: Vec<&str> = modules.iter().map(ModuleDecl::name).collect();
        let key = ModuleSetKey(format!("[{}]", names.join(", ")));
        Ok(Self { key, modules })
    }

    /// Cache key for this set
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ModuleSetKey {
        &self.key
    }

    /// Modules in key order
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[ModuleDecl] {
        &self.modules
    }

    /// Number of distinct modules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Always false for a constructed set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Alpha;
    #[derive(Default)]
    struct Beta;

    impl Module for Alpha {
        fn configure(&self, _binder: &mut Binder) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    impl Module for Beta {
        fn configure(&self, _binder: &mut Binder) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    fn broken() -> Result<Box<dyn Module>, ConfigError> {
        Err(ConfigError::configure("broken", "no default"))
    }

    #[test]
    fn key_ignores_order_and_duplicates() {
        let a = ModuleSet::for_class(
            "A",
            Some(&[ModuleDecl::of::<Beta>(), ModuleDecl::of::<Alpha>()]),
        )
        .unwrap();
        let b = ModuleSet::for_class(
            "B",
            Some(&[
                ModuleDecl::of::<Alpha>(),
                ModuleDecl::of::<Beta>(),
                ModuleDecl::of::<Alpha>(),
            ]),
        )
        .unwrap();

        assert_eq!(a.key(), b.key());
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn missing_declaration_is_error() {
        let err = ModuleSet::for_class("A", None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModules { .. }));
    }

    #[test]
    fn empty_declaration_is_error() {
        let err = ModuleSet::for_class("A", Some(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyModules { .. }));
    }

    #[test]
    fn failing_factory_reports_module() {
        let decl = ModuleDecl::new("broken", broken);
        match decl.instantiate() {
            Err(ConfigError::ModuleInstantiation { module, .. }) => assert_eq!(module, "broken"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    proptest! {
        #[test]
        fn key_is_permutation_invariant(names in proptest::collection::vec("[a-e]", 1..8)) {
            fn factory() -> Result<Box<dyn Module>, ConfigError> {
                Ok(Box::new(Alpha))
            }
            let forward: Vec<ModuleDecl> =
                names.iter().map(|n| ModuleDecl::new(n.clone(), factory)).collect();
            let mut backward = forward.clone();
            backward.reverse();

            let a = ModuleSet::for_class("A", Some(&forward)).unwrap();
            let b = ModuleSet::for_class("B", Some(&backward)).unwrap();
            prop_assert_eq!(a.key(), b.key());
        }
    }
}
