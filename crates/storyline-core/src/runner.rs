//! Class run coordination
//!
//! A [`ClassRunner`] drives one run of a [`TestClass`]:
//!
//! 1. validate method shapes
//! 2. fetch or build the graph and hook set for the class's module set
//! 3. refresh the live hooks and run every `before_class_creation`
//! 4. per method: ignored methods only notify; others run the before hooks,
//!    the body, the after hooks (same order), then `test_finished`
//!
//! Each method runs on a fresh instance built from the graph. A panicking
//! body is reported as a failure; with `catch_panics` off it is re-raised
//! once the after hooks and `test_finished` have run.

use crate::config::RunnerConfig;
use crate::decl::{Marker, TestClass, TestMethod, Visibility};
use crate::error::{InitializationError, ShapeError};
use crate::failure::{panic_message, Failure, FailureKind, TestError};
use crate::narrator::Narrator;
use crate::notifier::{RunNotifier, RunReport, TestOutcome};
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use storyline_graph::{ClassInfo, GraphCache, HookSnapshot, MethodInfo, ModuleSet, ObjectGraph, ResolveError};

/// Which methods a runner picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerKind {
    /// Test and story methods, without story narration
    #[default]
    Plain,
    /// Story methods only, each framed by story events
    Story,
}

/// Lifecycle of a class run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    /// Graph and hooks ready
    Created,
    /// `before_class_creation` hooks ran
    ClassHooksRun,
    /// Methods are running
    Running,
    /// Every runnable method ran
    Done,
}

/// Drives one run of a test class
pub struct ClassRunner<T> {
    kind: RunnerKind,
    class: TestClass<T>,
    info: ClassInfo,
    config: RunnerConfig,
    graph: Arc<ObjectGraph>,
    hooks: HookSnapshot,
    narrator: Narrator,
    state: ClassState,
}

impl<T> ClassRunner<T> {
    /// Create a run of `class` with the default configuration
    ///
    /// # Errors
    /// See [`ClassRunner::with_config`].
    pub fn new(kind: RunnerKind, class: TestClass<T>, cache: &GraphCache) -> Result<Self, InitializationError> {
        Self::with_config(kind, class, cache, RunnerConfig::default())
    }

    /// Create a run of `class`
    ///
    /// Runs every `before_class_creation` hook before returning.
    ///
    /// # Errors
    /// - [`InitializationError::Validation`] for unsupported method shapes
    /// - [`InitializationError::Config`] when the module declaration is
    ///   missing or empty, the graph cannot be built, or a hook cannot be
    ///   resolved
    pub fn with_config(
        kind: RunnerKind,
        class: TestClass<T>,
        cache: &GraphCache,
        config: RunnerConfig,
    ) -> Result<Self, InitializationError> {
        let errors = shape_errors(kind, &class);
        if !errors.is_empty() {
            return Err(InitializationError::Validation(errors));
        }

        let set = ModuleSet::for_class(class.name(), class.modules())?;
        let graph = cache.graph_for(&set)?;
        let hooks = cache.hooks_for(&graph).refresh(&graph)?;

        let info = ClassInfo::new(class.name());
        let narrator = Narrator::new(Arc::clone(&graph), info.clone(), config.clone());
        let mut runner = Self {
            kind,
            class,
            info,
            config,
            graph,
            hooks,
            narrator,
            state: ClassState::Created,
        };

        for hook in runner.hooks.iter() {
            hook.before_class_creation(&runner.info);
        }
        runner.state = ClassState::ClassHooksRun;

        tracing::debug!(
            class = runner.info.name(),
            key = %runner.graph.key(),
            hooks = runner.hooks.len(),
            "class run created"
        );
        Ok(runner)
    }

    /// Class identity
    #[inline]
    #[must_use]
    pub fn class_info(&self) -> &ClassInfo {
        &self.info
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ClassState {
        self.state
    }

    /// Graph shared by every class with the same module set
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &Arc<ObjectGraph> {
        &self.graph
    }

    /// Hook instances of this run, in registration order
    #[inline]
    #[must_use]
    pub fn hooks(&self) -> &HookSnapshot {
        &self.hooks
    }

    /// Narrator of this run
    #[inline]
    #[must_use]
    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    /// Methods this runner picks up, in declaration order
    pub fn runnable_methods(&self) -> impl Iterator<Item = &TestMethod<T>> {
        let kind = self.kind;
        self.class
            .methods()
            .iter()
            .filter(move |m| is_runnable(kind, m.decl().marker()))
    }

    /// Check every runnable method's shape
    ///
    /// # Errors
    /// Returns [`InitializationError::Validation`] listing every problem.
    pub fn validate(&self) -> Result<(), InitializationError> {
        let errors = shape_errors(self.kind, &self.class);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(InitializationError::Validation(errors))
        }
    }

    /// Build a test instance through the graph
    ///
    /// # Errors
    /// Returns [`ResolveError`] when a constructor dependency is unbound or
    /// its factory fails.
    pub fn create_test(&self) -> Result<T, ResolveError> {
        self.class.instantiate(&self.graph)
    }

    /// Run the runnable method named `name`
    ///
    /// Returns `None` when no runnable method has that name.
    pub fn run_method(&mut self, name: &str, notifier: &mut dyn RunNotifier) -> Option<TestOutcome> {
        let index = self
            .class
            .methods()
            .iter()
            .position(|m| m.decl().name() == name && is_runnable(self.kind, m.decl().marker()))?;
        self.state = ClassState::Running;
        Some(self.execute(&self.class.methods()[index], notifier))
    }

    /// Run every runnable method in declaration order
    pub fn run(&mut self, notifier: &mut dyn RunNotifier) -> Vec<TestOutcome> {
        self.state = ClassState::Running;
        let outcomes: Vec<TestOutcome> = self
            .runnable_methods()
            .map(|method| self.execute(method, notifier))
            .collect();
        self.state = ClassState::Done;

        tracing::debug!(class = self.info.name(), methods = outcomes.len(), "class run done");
        outcomes
    }

    fn execute(&self, method: &TestMethod<T>, notifier: &mut dyn RunNotifier) -> TestOutcome {
        let decl = method.decl();
        let info = MethodInfo::new(self.info.name(), decl.name());

        if decl.is_ignored() {
            tracing::debug!(method = %info, "method ignored");
            notifier.test_ignored(&info);
            return TestOutcome::Ignored;
        }

        for hook in self.hooks.iter() {
            hook.before_test(&info);
        }

        let mut finished = FinishedGuard {
            notifier,
            method: &info,
        };
        finished.notifier.test_started(&info);

        let (result, payload) = match self.invoke(method) {
            Ok(result) => (result, None),
            Err(payload) => {
                let message = panic_message(payload.as_ref()).unwrap_or_else(|| "non-string panic payload".to_string());
                (Err(TestError::Panicked(message)), Some(payload))
            }
        };

        let outcome = match result {
            Ok(()) => TestOutcome::Passed,
            Err(TestError::AssumptionNotMet(reason)) => {
                finished.notifier.test_assumption_failed(&info, &reason);
                TestOutcome::Skipped(reason)
            }
            Err(err) => {
                tracing::debug!(method = %info, error = %err, "method failed");
                finished.notifier.test_failed(&info, &err);
                TestOutcome::Failed(err.to_string())
            }
        };

        for hook in self.hooks.iter() {
            hook.after_test(&info);
        }
        drop(finished);

        if let Some(payload) = payload.filter(|_| !self.config.catch_panics) {
            panic::resume_unwind(payload);
        }
        outcome
    }

    /// Run the body on a fresh instance; a panic is returned as its payload
    fn invoke(&self, method: &TestMethod<T>) -> thread::Result<Result<(), TestError>> {
        let decl = method.decl();
        let narrated = self.kind == RunnerKind::Story && decl.is_story() && !self.config.is_finalizer(decl.name());

        panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), TestError> {
            let mut instance = self
                .create_test()
                .map_err(|err| Failure::with_message(FailureKind::INSTANTIATION, err.to_string()))?;
            if narrated {
                self.narrator
                    .narrate_story(decl, &[], || method.call(&mut instance, &self.narrator))
            } else {
                method.call(&mut instance, &self.narrator)
            }
        }))
    }
}

impl<T> fmt::Debug for ClassRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRunner")
            .field("kind", &self.kind)
            .field("class", &self.info)
            .field("key", self.graph.key())
            .field("hooks", &self.hooks.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Fires `test_finished` when dropped, unwinding included
struct FinishedGuard<'a> {
    notifier: &'a mut dyn RunNotifier,
    method: &'a MethodInfo,
}

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        self.notifier.test_finished(self.method);
    }
}

fn is_runnable(kind: RunnerKind, marker: &Marker) -> bool {
    match kind {
        RunnerKind::Story => matches!(marker, Marker::Story { .. }),
        RunnerKind::Plain => matches!(marker, Marker::Story { .. } | Marker::Test),
    }
}

fn shape_errors<T>(kind: RunnerKind, class: &TestClass<T>) -> Vec<ShapeError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut runnable = 0usize;

    for decl in class
        .methods()
        .iter()
        .map(TestMethod::decl)
        .filter(|d| is_runnable(kind, d.marker()))
    {
        runnable += 1;
        let method = decl.name().to_string();
        let signature = decl.signature();

        if signature.visibility != Visibility::Public {
            errors.push(ShapeError::NotPublic { method: method.clone() });
        }
        if signature.arity > 0 {
            errors.push(ShapeError::HasParameters {
                method: method.clone(),
                arity: signature.arity,
            });
        }
        if !signature.returns_unit {
            errors.push(ShapeError::NotUnit { method: method.clone() });
        }
        if !seen.insert(decl.name()) {
            errors.push(ShapeError::Duplicate { method });
        }
    }

    if runnable == 0 {
        errors.push(ShapeError::NoRunnableMethods {
            class: class.name().to_string(),
        });
    }
    errors
}

/// Run `class` against the process-wide cache and collect a report
///
/// # Errors
/// Returns [`InitializationError`] when the class run cannot be created.
pub fn run_class<T>(kind: RunnerKind, class: TestClass<T>) -> Result<RunReport, InitializationError> {
    run_class_with(kind, class, GraphCache::global(), RunnerConfig::default())
}

/// Run `class` against `cache` with `config` and collect a report
///
/// # Errors
/// Returns [`InitializationError`] when the class run cannot be created.
pub fn run_class_with<T>(
    kind: RunnerKind,
    class: TestClass<T>,
    cache: &GraphCache,
    config: RunnerConfig,
) -> Result<RunReport, InitializationError> {
    let mut runner = ClassRunner::with_config(kind, class, cache, config)?;
    let mut report = RunReport::new();
    runner.run(&mut report);
    Ok(report)
}
