//! The stub ledger: pending return values keyed by mocked function.
//!
//! Records are kept in insertion order and the first record whose function
//! identity matches a call is the one served. A non-sticky record is removed
//! when served; a sticky one stays until the ledger is cleared.
//!
//! The Recording/Playing mode is tracked for callers and logs only. It never
//! changes what `will_return` or `stubbed_result` do.

use crate::checks::{NoopChecker, ParameterChecker, ParameterMask};
use crate::config::{LedgerConfig, ReporterKind};
use crate::errors::LedgerError;
use crate::identity::FunctionId;
use crate::logging::{JsonlLogger, LedgerEvent};
use crate::reporter::{CollectingReporter, PanicReporter, ReportedFailure, TestReporter};
use crate::types::{CallSite, LedgerMode, StubValue};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRecord {
    pub function: FunctionId,
    pub result: StubValue,
    /// Survives being served.
    pub sticky: bool,
}

/// A call announced with `expect`, checked by a verifying tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub function: FunctionId,
    pub site: CallSite,
    pub calls: usize,
}

pub struct StubLedger {
    records: Option<Vec<StubRecord>>,
    expectations: Vec<Expectation>,
    mode: LedgerMode,
    pending_sticky: bool,
    verify_expectations: bool,
    reporter: Box<dyn TestReporter>,
    /// Read handle on `reporter` when it is a collecting one.
    collector: Option<CollectingReporter>,
    checker: Box<dyn ParameterChecker>,
    logger: Option<JsonlLogger>,
}

impl Default for StubLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StubLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubLedger")
            .field("records", &self.records)
            .field("expectations", &self.expectations)
            .field("mode", &self.mode)
            .field("pending_sticky", &self.pending_sticky)
            .field("verify_expectations", &self.verify_expectations)
            .field("collector", &self.collector)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl StubLedger {
    pub fn new() -> Self {
        Self {
            records: None,
            expectations: Vec::new(),
            mode: LedgerMode::Playing,
            pending_sticky: false,
            verify_expectations: false,
            reporter: Box::new(PanicReporter),
            collector: None,
            checker: Box::new(NoopChecker),
            logger: None,
        }
    }

    /// Builds a ledger from config. With `reporter.kind = "collect"` the
    /// failures stay readable through `collected_failures`.
    pub fn from_config(cfg: &LedgerConfig) -> Self {
        let logger = cfg.logging.path.as_ref().map(|path| {
            JsonlLogger::new(path).with_max_payload_bytes(cfg.logging.max_payload_bytes)
        });
        let ledger = Self {
            verify_expectations: cfg.tally.verify_expectations,
            logger,
            ..Self::new()
        };
        match cfg.reporter.kind {
            ReporterKind::Panic => ledger,
            ReporterKind::Collect => ledger.with_collecting_reporter(CollectingReporter::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: impl TestReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self.collector = None;
        self
    }

    /// Reports into `reporter` and keeps a clone of it for `collector`.
    pub fn with_collecting_reporter(mut self, reporter: CollectingReporter) -> Self {
        self.reporter = Box::new(reporter.clone());
        self.collector = Some(reporter);
        self
    }

    pub fn with_checker(mut self, checker: impl ParameterChecker + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }

    pub fn with_logger(mut self, logger: JsonlLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_expectation_checks(mut self, enabled: bool) -> Self {
        self.verify_expectations = enabled;
        self
    }

    // ── Declaring ──────────────────────────────────────────────────────────────

    /// Announces a call to `function` and enters Recording mode.
    pub fn expect(&mut self, function: &FunctionId, site: &CallSite) {
        self.mode = LedgerMode::Recording;
        self.expectations.push(Expectation {
            function: function.clone(),
            site: site.clone(),
            calls: 0,
        });
        self.log(LedgerEvent::Expect, || {
            json!({ "function": function.name(), "site": site.to_string() })
        });
    }

    /// Enters Recording mode without announcing a required call.
    pub fn mock(&mut self, function: &FunctionId, site: &CallSite) {
        self.mode = LedgerMode::Recording;
        self.log(LedgerEvent::Mock, || {
            json!({ "function": function.name(), "site": site.to_string() })
        });
    }

    /// Makes the next `will_return` register a sticky record.
    pub fn always(&mut self) -> &mut Self {
        self.pending_sticky = true;
        self
    }

    pub fn will_return(&mut self, function: &FunctionId, value: impl Into<StubValue>) {
        let sticky = self.pending_sticky;
        self.push_record(function, value.into(), sticky);
    }

    pub fn will_always_return(&mut self, function: &FunctionId, value: impl Into<StubValue>) {
        self.push_record(function, value.into(), true);
    }

    fn push_record(&mut self, function: &FunctionId, result: StubValue, sticky: bool) {
        self.records.get_or_insert_with(Vec::new).push(StubRecord {
            function: function.clone(),
            result,
            sticky,
        });
        self.pending_sticky = false;
        self.log(LedgerEvent::WillReturn, || {
            json!({ "function": function.name(), "value": result.get(), "sticky": sticky })
        });
    }

    pub fn play(&mut self) {
        self.mode = LedgerMode::Playing;
        self.pending_sticky = false;
        self.log(LedgerEvent::Play, || json!({}));
    }

    pub fn mask(&mut self, parameters: &str) {
        self.checker.mask(&ParameterMask::parse(parameters));
    }

    // ── Serving ────────────────────────────────────────────────────────────────

    /// Serves the first pending record for `function`.
    ///
    /// With no matching record the miss is reported once through the ledger's
    /// reporter and `LedgerError::UnstubbedCall` is returned. A reporter that
    /// panics ends the call there instead.
    pub fn stubbed_result(
        &mut self,
        function: &FunctionId,
        site: &CallSite,
    ) -> Result<StubValue, LedgerError> {
        let served = self.records.as_mut().and_then(|records| {
            let index = records.iter().position(|record| record.function == *function)?;
            if records[index].sticky {
                Some((records[index].result, true))
            } else {
                Some((records.remove(index).result, false))
            }
        });

        let Some((value, sticky)) = served else {
            let message = format!("No return value set for function [{}]", function.name());
            self.log(LedgerEvent::UnstubbedCall, || {
                json!({ "function": function.name(), "site": site.to_string() })
            });
            self.reporter.assert_true(site, false, &message);
            return Err(LedgerError::UnstubbedCall {
                function: function.name().to_string(),
                file: site.file.clone(),
                line: site.line,
            });
        };

        self.credit_expectation(function);
        self.log(LedgerEvent::StubbedResult, || {
            json!({
                "function": function.name(),
                "site": site.to_string(),
                "value": value.get(),
                "sticky": sticky,
            })
        });
        Ok(value)
    }

    /// One served call satisfies one `expect`: the earliest unmet one, or the
    /// latest declaration once all are met.
    fn credit_expectation(&mut self, function: &FunctionId) {
        let matching = self
            .expectations
            .iter()
            .enumerate()
            .filter(|(_, expectation)| expectation.function == *function)
            .map(|(index, expectation)| (index, expectation.calls))
            .collect::<Vec<_>>();
        let target = matching
            .iter()
            .find(|(_, calls)| *calls == 0)
            .or(matching.last())
            .map(|(index, _)| *index);
        if let Some(index) = target {
            self.expectations[index].calls += 1;
        }
    }

    pub fn checked_integer(&self, site: &CallSite, parameter: &str, value: i64) {
        self.checker.checked_integer(site, parameter, value);
    }

    pub fn checked_string(&self, site: &CallSite, parameter: &str, value: &str) {
        self.checker.checked_string(site, parameter, value);
    }

    pub fn checked_address(&self, site: &CallSite, parameter: &str, address: usize) {
        self.checker.checked_address(site, parameter, address);
    }

    // ── Teardown ───────────────────────────────────────────────────────────────

    /// Drops every pending record and expectation. Safe on an untouched ledger.
    pub fn clear_mocks(&mut self) {
        let dropped = self.records.take().map_or(0, |records| records.len());
        self.expectations.clear();
        self.log(LedgerEvent::Clear, || json!({ "dropped_records": dropped }));
    }

    /// End-of-test hook. Clears the ledger; when expectation checks are on,
    /// first reports every `expect`ed function that was never served.
    ///
    /// Returns the number of failures reported.
    pub fn tally_mocks(&mut self, reporter: &dyn TestReporter) -> usize {
        let expectations = std::mem::take(&mut self.expectations);
        self.clear_mocks();
        if !self.verify_expectations {
            self.log(LedgerEvent::Tally, || json!({ "verified": false, "failures": 0 }));
            return 0;
        }

        let unmet = expectations
            .iter()
            .filter(|expectation| expectation.calls == 0)
            .collect::<Vec<_>>();
        let failures = unmet.len();
        self.log(LedgerEvent::Tally, || json!({ "verified": true, "failures": failures }));
        for expectation in unmet {
            reporter.assert_true(
                &expectation.site,
                false,
                &format!(
                    "Expected call to [{}] was never made",
                    expectation.function.name()
                ),
            );
        }
        failures
    }

    // ── Inspection ─────────────────────────────────────────────────────────────

    pub fn mode(&self) -> LedgerMode {
        self.mode
    }

    pub fn pending_sticky(&self) -> bool {
        self.pending_sticky
    }

    pub fn records(&self) -> &[StubRecord] {
        self.records.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Whether backing storage exists (first `will_return` since the last clear).
    pub fn is_allocated(&self) -> bool {
        self.records.is_some()
    }

    pub fn pending_for(&self, function: &FunctionId) -> usize {
        self.records()
            .iter()
            .filter(|record| record.function == *function)
            .count()
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn collector(&self) -> Option<&CollectingReporter> {
        self.collector.as_ref()
    }

    /// Failures reported so far through a collecting reporter. Empty when the
    /// ledger reports some other way.
    pub fn collected_failures(&self) -> Vec<ReportedFailure> {
        self.collector
            .as_ref()
            .map(CollectingReporter::failures)
            .unwrap_or_default()
    }

    fn log(&self, event: LedgerEvent, payload: impl FnOnce() -> Value) {
        if let Some(logger) = &self.logger {
            let _ = logger.record(event, payload());
        }
    }
}
