//! Test class and method declarations
//!
//! Markers that would be annotations elsewhere are plain builder metadata
//! here: a [`TestClass`] lists its modules, its instance factory and its
//! methods, each described by a [`MethodDecl`].

use crate::expect::ExpectationSpec;
use crate::failure::TestError;
use crate::narrator::Narrator;
use std::fmt;
use storyline_graph::{Module, ModuleDecl, ObjectGraph, ResolveError};

/// Role of a method in a narrated class
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Marker {
    /// Top-level story, optionally identified
    Story {
        /// Story identifier appended to the narration
        id: Option<String>,
    },
    /// Narrated step
    #[default]
    Step,
    /// Plain test method
    Test,
}

/// Declared method visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Callable by the runner
    #[default]
    Public,
    /// Hidden from the runner
    Private,
}

/// Declared method shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Visibility
    pub visibility: Visibility,
    /// Number of parameters
    pub arity: usize,
    /// Whether the method returns unit
    pub returns_unit: bool,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            arity: 0,
            returns_unit: true,
        }
    }
}

/// Metadata of one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    name: String,
    marker: Marker,
    ignored: bool,
    expected: Option<ExpectationSpec>,
    templates: Vec<Option<String>>,
    signature: Signature,
}

impl MethodDecl {
    /// Declare a method with `marker`
    #[must_use]
    pub fn new(name: impl Into<String>, marker: Marker) -> Self {
        Self {
            name: name.into(),
            marker,
            ignored: false,
            expected: None,
            templates: Vec::new(),
            signature: Signature::default(),
        }
    }

    /// Declare a story
    #[must_use]
    pub fn story(name: impl Into<String>) -> Self {
        Self::new(name, Marker::Story { id: None })
    }

    /// Declare a narrated step
    #[must_use]
    pub fn step(name: impl Into<String>) -> Self {
        Self::new(name, Marker::Step)
    }

    /// Declare a plain test
    #[must_use]
    pub fn test(name: impl Into<String>) -> Self {
        Self::new(name, Marker::Test)
    }

    /// Attach a story identifier; turns the method into a story
    #[must_use]
    pub fn with_story_id(mut self, id: impl Into<String>) -> Self {
        self.marker = Marker::Story { id: Some(id.into()) };
        self
    }

    /// Skip this method
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Expect the method to fail as described by `spec`
    #[must_use]
    pub fn expecting(mut self, spec: ExpectationSpec) -> Self {
        self.expected = Some(spec);
        self
    }

    /// Display template of each parameter, by position
    #[must_use]
    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(|t| t.map(Into::into)).collect();
        self
    }

    /// Declared shape
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marker
    #[inline]
    #[must_use]
    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Check for a story marker
    #[inline]
    #[must_use]
    pub fn is_story(&self) -> bool {
        matches!(self.marker, Marker::Story { .. })
    }

    /// Story identifier, when declared
    #[must_use]
    pub fn story_id(&self) -> Option<&str> {
        match &self.marker {
            Marker::Story { id } => id.as_deref(),
            _ => None,
        }
    }

    /// Check for the ignored flag
    #[inline]
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Failure expectation
    #[inline]
    #[must_use]
    pub fn expectation(&self) -> Option<&ExpectationSpec> {
        self.expected.as_ref()
    }

    /// Parameter templates
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[Option<String>] {
        &self.templates
    }

    /// Declared shape
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Builds a test instance from the class's object graph
pub type InstanceFactory<T> = Box<dyn Fn(&ObjectGraph) -> Result<T, ResolveError> + Send + Sync>;

/// Test method body
pub type MethodBody<T> = Box<dyn Fn(&mut T, &Narrator) -> Result<(), TestError> + Send + Sync>;

/// A declared method with its body
pub struct TestMethod<T> {
    decl: MethodDecl,
    body: MethodBody<T>,
}

impl<T> TestMethod<T> {
    /// Method metadata
    #[inline]
    #[must_use]
    pub fn decl(&self) -> &MethodDecl {
        &self.decl
    }

    pub(crate) fn call(&self, instance: &mut T, narrator: &Narrator) -> Result<(), TestError> {
        (self.body)(instance, narrator)
    }
}

impl<T> fmt::Debug for TestMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod").field("decl", &self.decl).finish()
    }
}

/// A narrated test class
pub struct TestClass<T> {
    name: String,
    modules: Option<Vec<ModuleDecl>>,
    factory: InstanceFactory<T>,
    methods: Vec<TestMethod<T>>,
}

impl<T> TestClass<T> {
    /// Declare a class whose instances come from `factory`
    ///
    /// No module is declared yet; running the class without declaring
    /// modules is a configuration error.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ObjectGraph) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            modules: None,
            factory: Box::new(factory),
            methods: Vec::new(),
        }
    }

    /// Declare the class's modules
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<ModuleDecl>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Declare one more module
    #[must_use]
    pub fn with_module<M: Module + Default + 'static>(mut self) -> Self {
        self.modules
            .get_or_insert_with(Vec::new)
            .push(ModuleDecl::of::<M>());
        self
    }

    /// Add a method
    #[must_use]
    pub fn method<F>(mut self, decl: MethodDecl, body: F) -> Self
    where
        F: Fn(&mut T, &Narrator) -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.methods.push(TestMethod {
            decl,
            body: Box::new(body),
        });
        self
    }

    /// Simple class name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared modules; `None` when the class declares none
    #[inline]
    #[must_use]
    pub fn modules(&self) -> Option<&[ModuleDecl]> {
        self.modules.as_deref()
    }

    /// Methods in declaration order
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[TestMethod<T>] {
        &self.methods
    }

    /// Build a test instance
    ///
    /// # Errors
    /// Returns [`ResolveError`] when the factory cannot resolve its dependencies.
    pub fn instantiate(&self, graph: &ObjectGraph) -> Result<T, ResolveError> {
        (self.factory)(graph)
    }
}

impl<T: Default + 'static> TestClass<T> {
    /// Declare a class built with `Default`
    #[must_use]
    pub fn with_default(name: impl Into<String>) -> Self {
        Self::new(name, |_| Ok(T::default()))
    }
}

impl<T> fmt::Debug for TestClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("name", &self.name)
            .field("modules", &self.modules)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
