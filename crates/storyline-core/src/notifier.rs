//! Run notifications and reports
//!
//! [`RunNotifier`] is how a class run talks to its host. [`RunReport`] is
//! a notifier collecting outcomes, for driving class runs from `#[test]`
//! functions.

use crate::failure::TestError;
use serde::Serialize;
use std::fmt;
use storyline_graph::MethodInfo;

/// Receives per-method run events
pub trait RunNotifier {
    /// The method body is about to run
    fn test_started(&mut self, method: &MethodInfo);

    /// The method is ignored; no other event follows
    fn test_ignored(&mut self, method: &MethodInfo);

    /// The method was skipped by an unmet assumption
    fn test_assumption_failed(&mut self, method: &MethodInfo, reason: &str);

    /// The method failed
    fn test_failed(&mut self, method: &MethodInfo, error: &TestError);

    /// The method completed, whatever its outcome
    fn test_finished(&mut self, method: &MethodInfo);
}

/// Final outcome of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TestOutcome {
    /// Completed without failure
    Passed,
    /// Failed, with the rendered error
    Failed(String),
    /// Skipped by an unmet assumption
    Skipped(String),
    /// Not run
    Ignored,
}

/// Outcome of one method with its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    /// Method name
    pub method: String,
    /// Outcome
    pub outcome: TestOutcome,
}

/// Notifier collecting one record per method
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    class_name: Option<String>,
    records: Vec<TestRecord>,
    #[serde(skip)]
    pending: Option<(String, Option<TestOutcome>)>,
}

impl RunReport {
    /// Create empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Class name of the recorded methods
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Records in run order
    #[must_use]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Outcome of `method`
    #[must_use]
    pub fn outcome(&self, method: &str) -> Option<&TestOutcome> {
        self.records
            .iter()
            .find(|r| r.method == method)
            .map(|r| &r.outcome)
    }

    /// Number of passed methods
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Passed))
    }

    /// Number of failed methods
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Failed(_)))
    }

    /// Number of skipped methods
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Skipped(_)))
    }

    /// Number of ignored methods
    #[must_use]
    pub fn ignored(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Ignored))
    }

    /// Check that no method failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Panic with every failure when a method failed
    ///
    /// # Panics
    /// Panics when at least one method failed.
    pub fn assert_success(&self) {
        if self.is_success() {
            return;
        }
        let failures: Vec<String> = self
            .records
            .iter()
            .filter_map(|r| match &r.outcome {
                TestOutcome::Failed(reason) => Some(format!("  {}: {reason}", r.method)),
                _ => None,
            })
            .collect();
        panic!(
            "{} of {} method(s) failed in {}:\n{}",
            failures.len(),
            self.records.len(),
            self.class_name().unwrap_or("<unknown>"),
            failures.join("\n")
        );
    }

    fn count(&self, predicate: impl Fn(&TestOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }

    fn remember_class(&mut self, method: &MethodInfo) {
        if self.class_name.is_none() {
            self.class_name = Some(method.class_name().to_string());
        }
    }

    fn settle(&mut self, outcome: TestOutcome) {
        if let Some((_, slot)) = self.pending.as_mut() {
            slot.get_or_insert(outcome);
        }
    }
}

impl RunNotifier for RunReport {
    fn test_started(&mut self, method: &MethodInfo) {
        self.remember_class(method);
        self.pending = Some((method.name().to_string(), None));
    }

    fn test_ignored(&mut self, method: &MethodInfo) {
        self.remember_class(method);
        self.records.push(TestRecord {
            method: method.name().to_string(),
            outcome: TestOutcome::Ignored,
        });
    }

    fn test_assumption_failed(&mut self, _method: &MethodInfo, reason: &str) {
        self.settle(TestOutcome::Skipped(reason.to_string()));
    }

    fn test_failed(&mut self, _method: &MethodInfo, error: &TestError) {
        self.settle(TestOutcome::Failed(error.to_string()));
    }

    fn test_finished(&mut self, method: &MethodInfo) {
        let (name, outcome) = self
            .pending
            .take()
            .unwrap_or_else(|| (method.name().to_string(), None));
        self.records.push(TestRecord {
            method: name,
            outcome: outcome.unwrap_or(TestOutcome::Passed),
        });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} passed, {} failed, {} skipped, {} ignored",
            self.class_name().unwrap_or("<unknown>"),
            self.passed(),
            self.failed(),
            self.skipped(),
            self.ignored()
        )
    }
}
