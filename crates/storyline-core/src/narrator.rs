//! Story and step interception
//!
//! A [`Narrator`] wraps calls explicitly: stories are framed by begin/end
//! events, steps announce themselves and may verify a failure expectation.
//! One narrator exists per class run; its sink and converter are resolved
//! from the graph on first use and live as long as the run.

use crate::config::RunnerConfig;
use crate::decl::MethodDecl;
use crate::expect;
use crate::failure::{Failure, StepError};
use crate::narration::{DefaultStoryConverter, LogSink, NarrationSink, StoryConverter};
use once_cell::sync::OnceCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use storyline_graph::{ClassInfo, ObjectGraph};
use storyline_text::Value;

/// Result of an intercepted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The call returned normally
    Returned(R),
    /// The call failed as expected; the failure is handled
    Handled(Failure),
}

impl<R> Outcome<R> {
    /// Returned value, if any
    pub fn returned(self) -> Option<R> {
        match self {
            Self::Returned(value) => Some(value),
            Self::Handled(_) => None,
        }
    }

    /// Handled failure, if any
    pub fn handled(self) -> Option<Failure> {
        match self {
            Self::Returned(_) => None,
            Self::Handled(failure) => Some(failure),
        }
    }

    /// Check for [`Outcome::Handled`]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Per-class-run interceptor
pub struct Narrator {
    graph: Arc<ObjectGraph>,
    class: ClassInfo,
    config: RunnerConfig,
    sink: OnceCell<Arc<dyn NarrationSink>>,
    converter: OnceCell<Arc<dyn StoryConverter>>,
}

impl Narrator {
    /// Create a narrator for one run of `class`
    #[must_use]
    pub fn new(graph: Arc<ObjectGraph>, class: ClassInfo, config: RunnerConfig) -> Self {
        Self {
            graph,
            class,
            config,
            sink: OnceCell::new(),
            converter: OnceCell::new(),
        }
    }

    /// Class being narrated
    #[inline]
    #[must_use]
    pub fn class(&self) -> &ClassInfo {
        &self.class
    }

    /// Graph of the class run
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Runner settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Sink for this run: the bound `dyn NarrationSink`, else [`LogSink`]
    pub fn sink(&self) -> &Arc<dyn NarrationSink> {
        self.sink
            .get_or_init(|| resolve_or_default::<dyn NarrationSink>(&self.graph, || Arc::new(LogSink::new())))
    }

    /// Converter for this run: the bound `dyn StoryConverter`, else
    /// [`DefaultStoryConverter`]
    pub fn converter(&self) -> &Arc<dyn StoryConverter> {
        self.converter.get_or_init(|| {
            resolve_or_default::<dyn StoryConverter>(&self.graph, || {
                Arc::new(DefaultStoryConverter::with_config(self.config.formatter.clone()))
            })
        })
    }

    /// Intercept a call of `decl` with `arguments`
    ///
    /// - the finalizer runs untouched
    /// - a story is framed by begin/end events
    /// - a step announces itself; with an expectation, its failure (or
    ///   panic) is captured and verified, and a satisfied expectation
    ///   yields [`Outcome::Handled`]
    ///
    /// End events fire only when no unhandled failure escapes.
    ///
    /// # Errors
    /// - [`StepError::Failed`] for an unhandled failure of the call
    /// - [`StepError::Expectation`] when the declared expectation does not hold
    pub fn intercept<R, F>(&self, decl: &MethodDecl, arguments: &[Value], call: F) -> Result<Outcome<R>, StepError>
    where
        F: FnOnce() -> Result<R, Failure>,
    {
        if self.config.is_finalizer(decl.name()) {
            return Ok(Outcome::Returned(call()?));
        }
        if decl.is_story() {
            return Ok(Outcome::Returned(self.narrate_story(decl, arguments, call)?));
        }
        match decl.expectation() {
            None => self.narrate_step(decl, arguments, call).map(Outcome::Returned),
            Some(spec) => {
                let class_name = self.class_text();
                let text = self.converter().convert_method(decl, arguments);
                self.sink().on_step_begins(&class_name, &text);

                let outcome = self.capture(call).map(|_| ());
                let handled = expect::verify(spec, outcome)?;
                tracing::debug!(step = decl.name(), failure = %handled, "expected failure handled");

                self.sink().on_step_ends(&class_name, &text);
                Ok(Outcome::Handled(handled))
            }
        }
    }

    /// Narrate an ad-hoc step named `name`
    ///
    /// # Errors
    /// Returns [`StepError::Failed`] when `call` fails.
    pub fn step<R, F>(&self, name: &str, arguments: &[Value], call: F) -> Result<R, StepError>
    where
        F: FnOnce() -> Result<R, Failure>,
    {
        if self.config.is_finalizer(name) {
            return Ok(call()?);
        }
        self.narrate_step(&MethodDecl::step(name), arguments, call)
    }

    /// Frame `call` with story begin/end events
    ///
    /// # Errors
    /// Propagates the error of `call`; the end event is skipped then.
    pub fn narrate_story<R, E, F>(&self, decl: &MethodDecl, arguments: &[Value], call: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        let class_name = self.class_text();
        let story = self.converter().convert_method(decl, arguments);
        self.sink().on_story_begins(&class_name, &story);
        let value = call()?;
        self.sink().on_story_ends(&class_name, &story);
        Ok(value)
    }

    fn narrate_step<R, F>(&self, decl: &MethodDecl, arguments: &[Value], call: F) -> Result<R, StepError>
    where
        F: FnOnce() -> Result<R, Failure>,
    {
        let class_name = self.class_text();
        let text = self.converter().convert_method(decl, arguments);
        self.sink().on_step_begins(&class_name, &text);
        let value = call()?;
        self.sink().on_step_ends(&class_name, &text);
        Ok(value)
    }

    fn capture<R, F>(&self, call: F) -> Result<R, Failure>
    where
        F: FnOnce() -> Result<R, Failure>,
    {
        if !self.config.catch_panics {
            return call();
        }
        panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| Err(Failure::from_panic(payload.as_ref())))
    }

    fn class_text(&self) -> String {
        self.converter().convert_class(&self.class)
    }
}

impl fmt::Debug for Narrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Narrator")
            .field("class", &self.class)
            .field("graph", &self.graph.key())
            .field("sink_resolved", &self.sink.get().is_some())
            .field("converter_resolved", &self.converter.get().is_some())
            .finish()
    }
}

fn resolve_or_default<T>(graph: &ObjectGraph, default: impl FnOnce() -> Arc<T>) -> Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    match graph.try_resolve::<T>() {
        Ok(Some(bound)) => bound,
        Ok(None) => default(),
        Err(err) => {
            tracing::warn!(
                type_name = std::any::type_name::<T>(),
                error = %err,
                "bound narration component failed to resolve, using default"
            );
            default()
        }
    }
}
