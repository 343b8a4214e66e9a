//! Testing utilities for the storyline workspace
//!
//! Shared fixtures: recording sink and notifier, order-recording hooks and
//! modules counting their own configurations.

#![allow(missing_docs)]

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};
use storyline_core::{NarrationSink, RunNotifier, TestError};
use storyline_graph::{Binder, ClassInfo, ConfigError, MethodInfo, Module, Scope, TestHook};
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Install a test-writer subscriber honouring `RUST_LOG` (default `warn`)
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// Narration

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    StoryBegins { class: String, text: String },
    StepBegins { class: String, text: String },
    StepEnds { class: String, text: String },
    StoryEnds { class: String, text: String },
}

impl NarrationEvent {
    pub fn text(&self) -> &str {
        match self {
            Self::StoryBegins { text, .. }
            | Self::StepBegins { text, .. }
            | Self::StepEnds { text, .. }
            | Self::StoryEnds { text, .. } => text,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NarrationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NarrationEvent> {
        self.events.lock().clone()
    }

    /// Texts of every begin event, in order
    pub fn narration(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, NarrationEvent::StoryBegins { .. } | NarrationEvent::StepBegins { .. }))
            .map(|e| e.text().to_string())
            .collect()
    }

    fn push(&self, event: NarrationEvent) {
        self.events.lock().push(event);
    }
}

impl NarrationSink for RecordingSink {
    fn on_story_begins(&self, class_name: &str, story: &str) {
        self.push(NarrationEvent::StoryBegins {
            class: class_name.to_string(),
            text: story.to_string(),
        });
    }

    fn on_step_begins(&self, class_name: &str, step: &str) {
        self.push(NarrationEvent::StepBegins {
            class: class_name.to_string(),
            text: step.to_string(),
        });
    }

    fn on_step_ends(&self, class_name: &str, step: &str) {
        self.push(NarrationEvent::StepEnds {
            class: class_name.to_string(),
            text: step.to_string(),
        });
    }

    fn on_story_ends(&self, class_name: &str, story: &str) {
        self.push(NarrationEvent::StoryEnds {
            class: class_name.to_string(),
            text: story.to_string(),
        });
    }
}

// Notifications

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    Started(String),
    Ignored(String),
    AssumptionFailed(String, String),
    Failed(String, String),
    Finished(String),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<NotifierEvent>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, predicate: impl Fn(&NotifierEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    pub fn finished(&self, method: &str) -> usize {
        self.count(|e| matches!(e, NotifierEvent::Finished(m) if m == method))
    }
}

impl RunNotifier for RecordingNotifier {
    fn test_started(&mut self, method: &MethodInfo) {
        self.events.push(NotifierEvent::Started(method.name().to_string()));
    }

    fn test_ignored(&mut self, method: &MethodInfo) {
        self.events.push(NotifierEvent::Ignored(method.name().to_string()));
    }

    fn test_assumption_failed(&mut self, method: &MethodInfo, reason: &str) {
        self.events.push(NotifierEvent::AssumptionFailed(
            method.name().to_string(),
            reason.to_string(),
        ));
    }

    fn test_failed(&mut self, method: &MethodInfo, error: &TestError) {
        self.events
            .push(NotifierEvent::Failed(method.name().to_string(), error.to_string()));
    }

    fn test_finished(&mut self, method: &MethodInfo) {
        self.events.push(NotifierEvent::Finished(method.name().to_string()));
    }
}

// Order-recording hooks

/// Shared state the ordered hooks write to
///
/// Hook `A` sets the counter to zero, `B` increments it and `C` doubles
/// it, so the final value tells the callback order apart.
#[derive(Debug, Default)]
pub struct OrderLog {
    counter: AtomicI64,
    calls: Mutex<Vec<String>>,
}

impl OrderLog {
    pub fn counter(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn set_counter(&self, value: i64) {
        self.counter.store(value, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

macro_rules! ordered_hook {
    ($name:ident, $label:literal, |$log:ident| $apply:expr) => {
        #[derive(Debug)]
        pub struct $name {
            log: Arc<OrderLog>,
        }

        impl $name {
            pub fn new(log: Arc<OrderLog>) -> Self {
                Self { log }
            }

            fn apply(&self) {
                let $log = &self.log;
                $apply;
            }
        }

        impl TestHook for $name {
            fn before_class_creation(&self, class: &ClassInfo) {
                self.log.record(format!("{}.class({})", $label, class.name()));
            }

            fn before_test(&self, method: &MethodInfo) {
                self.apply();
                self.log.record(format!("{}.before({})", $label, method.name()));
            }

            fn after_test(&self, method: &MethodInfo) {
                self.apply();
                self.log.record(format!("{}.after({})", $label, method.name()));
            }
        }
    };
}

ordered_hook!(HookA, "A", |log| log.set_counter(0));
ordered_hook!(HookB, "B", |log| log.set_counter(log.counter() + 1));
ordered_hook!(HookC, "C", |log| log.set_counter(log.counter() * 2));

/// Binds a shared [`OrderLog`] and the hooks `A`, `B`, `C` in that order
#[derive(Debug, Default)]
pub struct OrderedHooksModule;

impl Module for OrderedHooksModule {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError> {
        binder
            .bind_default::<OrderLog>(Scope::Shared)
            .bind_hook::<HookA, _>(Scope::Shared, |g| Ok(HookA::new(g.resolve()?)))
            .bind_hook::<HookB, _>(Scope::PerResolution, |g| Ok(HookB::new(g.resolve()?)))
            .bind_hook::<HookC, _>(Scope::Shared, |g| Ok(HookC::new(g.resolve()?)));
        Ok(())
    }
}

// Configuration counting

static CONFIGURATIONS: Lazy<Mutex<HashMap<&'static str, usize>>> = Lazy::new(Mutex::default);

/// Module counting how often it is configured, keyed by `Tag`
///
/// Use a distinct tag type per test so counts never mix.
#[derive(Debug)]
pub struct CountingModule<Tag: 'static> {
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag: 'static> Default for CountingModule<Tag> {
    fn default() -> Self {
        Self { _tag: PhantomData }
    }
}

impl<Tag: 'static> Module for CountingModule<Tag> {
    fn configure(&self, _binder: &mut Binder) -> Result<(), ConfigError> {
        *CONFIGURATIONS
            .lock()
            .entry(std::any::type_name::<Tag>())
            .or_insert(0) += 1;
        Ok(())
    }
}

/// Number of times `CountingModule<Tag>` was configured
pub fn configurations<Tag: 'static>() -> usize {
    CONFIGURATIONS
        .lock()
        .get(std::any::type_name::<Tag>())
        .copied()
        .unwrap_or(0)
}

/// Module binding a [`RecordingSink`] as the narration sink
#[derive(Debug, Default)]
pub struct RecordingSinkModule;

impl Module for RecordingSinkModule {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError> {
        binder
            .bind_default::<RecordingSink>(Scope::Shared)
            .bind::<dyn NarrationSink, _>(Scope::Shared, |g| {
                g.resolve::<RecordingSink>().map(|sink| sink as Arc<dyn NarrationSink>)
            });
        Ok(())
    }
}
