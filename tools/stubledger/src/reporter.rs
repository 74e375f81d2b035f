//! Assertion sinks the ledger reports failures through.

use crate::types::CallSite;
use std::sync::{Arc, Mutex, MutexGuard};

pub trait TestReporter {
    /// Records the outcome of a check at `site`. A `false` condition is a
    /// failure described by `message`.
    fn assert_true(&self, site: &CallSite, condition: bool, message: &str);
}

/// Fails the running test by panicking on the first false assertion.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl TestReporter for PanicReporter {
    fn assert_true(&self, site: &CallSite, condition: bool, message: &str) {
        if !condition {
            panic!("{site}: {message}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    pub site: CallSite,
    pub message: String,
}

/// Keeps every assertion for later inspection. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    failures: Arc<Mutex<Vec<ReportedFailure>>>,
    passes: Arc<Mutex<usize>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<ReportedFailure> {
        lock(&self.failures).clone()
    }

    pub fn failure_count(&self) -> usize {
        lock(&self.failures).len()
    }

    pub fn pass_count(&self) -> usize {
        *lock(&self.passes)
    }

    pub fn reset(&self) {
        lock(&self.failures).clear();
        *lock(&self.passes) = 0;
    }
}

impl TestReporter for CollectingReporter {
    fn assert_true(&self, site: &CallSite, condition: bool, message: &str) {
        if condition {
            *lock(&self.passes) += 1;
            return;
        }
        lock(&self.failures).push(ReportedFailure {
            site: site.clone(),
            message: message.to_string(),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
