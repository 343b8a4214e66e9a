//! storyline narrated test runs
//!
//! Drives test classes whose story methods narrate themselves: every step
//! call is turned into a readable sentence and written to a narration
//! sink, lifecycle hooks run around each method, and collaborators come
//! from an object graph cached per module set.
//!
//! # Core Concepts
//!
//! - [`TestClass`] / [`MethodDecl`]: declared class, modules and methods
//! - [`ClassRunner`]: the class-run state machine
//! - [`Narrator`]: explicit story/step interception
//! - [`ExpectationSpec`]: failure expected from a step
//! - [`NarrationSink`] / [`StoryConverter`]: narration output, overridable
//!   through the graph
//!
//! # Example
//!
//! ```rust
//! use storyline_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Fixtures;
//!
//! impl Module for Fixtures {
//!     fn configure(&self, _binder: &mut Binder) -> Result<(), ConfigError> {
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Arithmetic;
//!
//! let class = TestClass::<Arithmetic>::with_default("Arithmetic")
//!     .with_module::<Fixtures>()
//!     .method(MethodDecl::story("addingTwoNumbers"), |_, narrator| {
//!         let sum = narrator.step("adding_$1_and_$2", &args![2, 3], || Ok(2 + 3))?;
//!         if sum != 5 {
//!             return Err(TestError::assertion("wrong sum"));
//!         }
//!         Ok(())
//!     });
//!
//! let report = run_class(RunnerKind::Story, class).unwrap();
//! report.assert_success();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod decl;
pub mod error;
pub mod expect;
pub mod failure;
pub mod narration;
pub mod narrator;
pub mod notifier;
pub mod runner;

// Re-exports
pub use config::{RunnerConfig, DEFAULT_FINALIZER};
pub use decl::{InstanceFactory, Marker, MethodBody, MethodDecl, Signature, TestClass, TestMethod, Visibility};
pub use error::{InitializationError, RunnerConfigError, ShapeError};
pub use expect::{verify, ExpectationMismatch, ExpectationSpec};
pub use failure::{Failure, FailureKind, StepError, TestError};
pub use narration::{DefaultStoryConverter, LogSink, NarrationSink, StoryConverter, TITLE_SEPARATOR};
pub use narrator::{Narrator, Outcome};
pub use notifier::{RunNotifier, RunReport, TestOutcome, TestRecord};
pub use runner::{run_class, run_class_with, ClassRunner, ClassState, RunnerKind};

pub use storyline_graph::{ClassInfo, MethodInfo};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing narrated test classes
    pub use crate::{
        run_class, ClassRunner, ExpectationSpec, Failure, MethodDecl, Narrator, Outcome,
        RunReport, RunnerKind, StepError, TestClass, TestError,
    };
    pub use storyline_graph::{Binder, ConfigError, Module, Scope, TestHook};
    pub use storyline_text::{args, Value};
}
