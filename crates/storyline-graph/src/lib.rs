//! storyline object graphs
//!
//! A minimal dependency container for narrated test classes: modules bind
//! types with an explicit [`Scope`] and register lifecycle hooks, and a
//! process-wide [`GraphCache`] builds one graph and one hook set per
//! distinct [`ModuleSetKey`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storyline_graph::{Binder, ConfigError, GraphCache, Module, ModuleDecl, ModuleSet, Scope};
//!
//! #[derive(Default)]
//! struct Settings;
//!
//! impl Module for Settings {
//!     fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError> {
//!         binder.bind::<String, _>(Scope::Shared, |_| Ok(Arc::new("fixture".to_string())));
//!         Ok(())
//!     }
//! }
//!
//! let set = ModuleSet::for_class("MyStory", Some(&[ModuleDecl::of::<Settings>()])).unwrap();
//! let graph = GraphCache::new().graph_for(&set).unwrap();
//! assert_eq!(*graph.resolve::<String>().unwrap(), "fixture");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod binder;
pub mod cache;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod module;

// Re-exports
pub use binder::Binder;
pub use cache::{CacheStats, GraphCache};
pub use error::{ConfigError, ResolveError};
pub use graph::{ObjectGraph, Scope};
pub use hooks::{
    ClassInfo, HookEntry, HookInstanceSet, HookRegistration, HookSnapshot, MethodInfo,
    ModuleHooks, TestHook,
};
pub use module::{Module, ModuleDecl, ModuleFactory, ModuleSet, ModuleSetKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
