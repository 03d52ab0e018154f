//! Assertion recording and the end-of-run summary
//!
//! A failed check is data, not control flow: `record` never returns an error,
//! so one broken expectation does not hide the ones after it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// A single named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub description: String,
    pub passed: bool,
}

/// Aggregate counts over every recorded assertion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Shared handle to the assertion list.
///
/// Cloning is cheap and every clone appends to the same list, which lets
/// gateway stubs running inside the application record checks of their own.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    assertions: Arc<Mutex<Vec<Assertion>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check and print it
    pub fn record(&self, description: impl Into<String>, passed: bool) {
        let description = description.into();
        if passed {
            info!("  ✓ {}", description);
        } else {
            error!("  ✗ {}", description);
        }
        self.assertions.lock().push(Assertion { description, passed });
    }

    /// Print an informational line; not counted
    pub fn log(&self, message: impl AsRef<str>) {
        info!("{}", message.as_ref());
    }

    /// Counts for the current list, without printing
    pub fn counts(&self) -> Summary {
        let assertions = self.assertions.lock();
        let passed = assertions.iter().filter(|a| a.passed).count();
        Summary {
            total: assertions.len(),
            passed,
            failed: assertions.len() - passed,
        }
    }

    /// Compute and print the summary
    pub fn summary(&self) -> Summary {
        let summary = self.counts();

        info!("");
        info!(
            "Summary: {} assertions, {} passed, {} failed",
            summary.total, summary.passed, summary.failed
        );
        if summary.success() {
            info!("PASS");
        } else {
            error!("FAIL");
        }

        summary
    }

    /// Snapshot of every assertion recorded so far
    pub fn assertions(&self) -> Vec<Assertion> {
        self.assertions.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.assertions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.lock().is_empty()
    }

    /// Assertions recorded at or after `start`, as returned by an earlier `len()`
    pub fn since(&self, start: usize) -> Vec<Assertion> {
        let assertions = self.assertions.lock();
        assertions.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_every_record() {
        let recorder = Recorder::new();
        let outcomes = [true, false, true, true, false];
        for (i, passed) in outcomes.iter().enumerate() {
            recorder.record(format!("check {i}"), *passed);
        }

        let summary = recorder.summary();
        assert_eq!(summary.total, outcomes.len());
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.passed, 3);
        assert!(!summary.success());
    }

    #[test]
    fn test_empty_run_succeeds() {
        let summary = Recorder::new().summary();
        assert_eq!(summary, Summary::default());
        assert!(summary.success());
    }

    #[test]
    fn test_summary_leaves_list_untouched() {
        let recorder = Recorder::new();
        recorder.record("one", true);
        recorder.log("not counted");

        let first = recorder.summary();
        let second = recorder.summary();
        assert_eq!(first, second);
        assert_eq!(recorder.assertions().len(), 1);
    }

    #[test]
    fn test_clones_share_the_list() {
        let recorder = Recorder::new();
        let stub_side = recorder.clone();
        stub_side.record("recorded from a stub", false);

        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.counts().failed, 1);
    }

    #[test]
    fn test_since_returns_tail() {
        let recorder = Recorder::new();
        recorder.record("a", true);
        let mark = recorder.len();
        recorder.record("b", false);

        let tail = recorder.since(mark);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].description, "b");
        assert!(recorder.since(10).is_empty());
    }
}
