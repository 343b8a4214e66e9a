//! Narration output
//!
//! Provides the [`NarrationSink`] receiving story and step events, and the
//! [`StoryConverter`] turning classes and method calls into the text those
//! events carry. Both can be overridden by binding `dyn NarrationSink` or
//! `dyn StoryConverter` in a module.

use crate::decl::MethodDecl;
use storyline_graph::ClassInfo;
use storyline_text::{FormatterConfig, MessageConverter, Value};

/// Line framing a story announcement
pub const TITLE_SEPARATOR: &str = "------------------------------------------------------------";

/// Receives narration events
#[cfg_attr(test, mockall::automock)]
pub trait NarrationSink: Send + Sync {
    /// A story starts
    fn on_story_begins(&self, class_name: &str, story: &str);

    /// A step starts
    fn on_step_begins(&self, class_name: &str, step: &str);

    /// A step completed without an unhandled failure
    fn on_step_ends(&self, class_name: &str, step: &str);

    /// A story completed without an unhandled failure
    fn on_story_ends(&self, class_name: &str, story: &str);
}

/// Default sink writing to the `story` tracing target
///
/// The target is always `story`, so `RUST_LOG=story=info` turns narration
/// on for every class. Each event names its class in a `class` field; to
/// follow one class, filter on that field rather than on the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    /// Create sink
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NarrationSink for LogSink {
    fn on_story_begins(&self, class_name: &str, story: &str) {
        tracing::info!(target: "story", class = class_name, "{TITLE_SEPARATOR}");
        tracing::info!(target: "story", class = class_name, "  {story}");
        tracing::info!(target: "story", class = class_name, "  by {class_name}");
        tracing::info!(target: "story", class = class_name, "{TITLE_SEPARATOR}");
    }

    fn on_step_begins(&self, class_name: &str, step: &str) {
        tracing::info!(target: "story", class = class_name, "{step}");
    }

    fn on_step_ends(&self, class_name: &str, step: &str) {
        tracing::debug!(target: "story", class = class_name, step, "step ends");
    }

    fn on_story_ends(&self, class_name: &str, story: &str) {
        tracing::debug!(target: "story", class = class_name, story, "story ends");
    }
}

/// Turns classes and method calls into narration text
pub trait StoryConverter: Send + Sync {
    /// Text naming the class
    fn convert_class(&self, class: &ClassInfo) -> String;

    /// Text narrating a call of `method` with `arguments`
    fn convert_method(&self, method: &MethodDecl, arguments: &[Value]) -> String;
}

/// Sentence-pipeline converter
///
/// Stories are framed as `Story "<sentence>"`, followed by ` [<id>]` when
/// the story declares an identifier.
#[derive(Debug, Default)]
pub struct DefaultStoryConverter {
    converter: MessageConverter,
}

impl DefaultStoryConverter {
    /// Create converter with default formatting
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create converter with custom argument formatting
    #[must_use]
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            converter: MessageConverter::with_config(config),
        }
    }
}

impl StoryConverter for DefaultStoryConverter {
    fn convert_class(&self, class: &ClassInfo) -> String {
        class.name().to_string()
    }

    fn convert_method(&self, method: &MethodDecl, arguments: &[Value]) -> String {
        let sentence = self
            .converter
            .convert(method.name(), method.templates(), arguments);
        if !method.is_story() {
            return sentence;
        }
        match method.story_id().filter(|id| !id.is_empty()) {
            Some(id) => format!("Story \"{sentence}\" [{id}]"),
            None => format!("Story \"{sentence}\""),
        }
    }
}
