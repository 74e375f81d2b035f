//! Drive a ledger from a script and collect what each call returned.

use crate::config::LedgerConfig;
use crate::identity::FunctionRegistry;
use crate::ledger::StubLedger;
use crate::reporter::{CollectingReporter, ReportedFailure, TestReporter};
use crate::script::entry::{ScriptEntry, StubScript};
use crate::types::{CallSite, StubValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub function: String,
    pub site: CallSite,
    /// `None` when no stub was registered for the call.
    pub value: Option<StubValue>,
    pub expected: Option<StubValue>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub calls: Vec<CallOutcome>,
    pub failures: Vec<ReportedFailure>,
    pub tally_failures: usize,
    pub all_passed: bool,
}

/// Play `script` on a fresh ledger built from `cfg`, then tally it.
///
/// Failures are always collected, whatever reporter `cfg` names, so a miss
/// ends up in the report rather than aborting playback.
pub fn play_script(script: &StubScript, cfg: &LedgerConfig) -> ScriptReport {
    let reporter = CollectingReporter::new();
    let mut ledger = StubLedger::from_config(cfg).with_collecting_reporter(reporter.clone());
    let mut report = play_script_on(script, &mut ledger, &reporter);
    report.tally_failures += ledger.tally_mocks(&reporter);
    finish(report, &reporter)
}

/// Play `script` on an existing ledger. The ledger is expected to report
/// into `reporter`; it is left as the script leaves it.
pub fn play_script_on(
    script: &StubScript,
    ledger: &mut StubLedger,
    reporter: &CollectingReporter,
) -> ScriptReport {
    let mut registry = FunctionRegistry::new();
    let mut calls = Vec::new();
    let mut tally_failures = 0;

    for line in &script.lines {
        let default_site = || {
            CallSite::new(
                script.source.clone(),
                u32::try_from(line.number).unwrap_or(u32::MAX),
            )
        };
        match &line.entry {
            ScriptEntry::Expect(decl) => {
                let site = site_or(&decl.file, decl.line, default_site);
                ledger.expect(&registry.resolve(&decl.function), &site);
            }
            ScriptEntry::Mock(decl) => {
                let site = site_or(&decl.file, decl.line, default_site);
                ledger.mock(&registry.resolve(&decl.function), &site);
            }
            ScriptEntry::Always => {
                ledger.always();
            }
            ScriptEntry::WillReturn(stub) => {
                ledger.will_return(&registry.resolve(&stub.function), stub.value);
            }
            ScriptEntry::WillAlwaysReturn(stub) => {
                ledger.will_always_return(&registry.resolve(&stub.function), stub.value);
            }
            ScriptEntry::Play => ledger.play(),
            ScriptEntry::Mask(mask) => ledger.mask(&mask.parameters),
            ScriptEntry::Call(call) => {
                let site = site_or(&call.file, call.line, default_site);
                let function = registry.resolve(&call.function);
                let expected = call.expect_value.map(StubValue);
                let value = ledger.stubbed_result(&function, &site).ok();
                let passed = match (value, expected) {
                    (None, _) => false,
                    (Some(actual), Some(wanted)) => {
                        let matches = actual == wanted;
                        reporter.assert_true(
                            &site,
                            matches,
                            &format!(
                                "Call to [{}] returned {actual}, expected {wanted}",
                                call.function
                            ),
                        );
                        matches
                    }
                    (Some(_), None) => true,
                };
                calls.push(CallOutcome {
                    function: call.function.clone(),
                    site,
                    value,
                    expected,
                    passed,
                });
            }
            ScriptEntry::Clear => ledger.clear_mocks(),
            ScriptEntry::Tally => tally_failures += ledger.tally_mocks(reporter),
        }
    }

    finish(
        ScriptReport {
            calls,
            failures: Vec::new(),
            tally_failures,
            all_passed: false,
        },
        reporter,
    )
}

fn finish(mut report: ScriptReport, reporter: &CollectingReporter) -> ScriptReport {
    report.failures = reporter.failures();
    report.all_passed = report.failures.is_empty() && report.calls.iter().all(|c| c.passed);
    report
}

fn site_or(
    file: &Option<String>,
    line: Option<u32>,
    default_site: impl FnOnce() -> CallSite,
) -> CallSite {
    let fallback = default_site();
    CallSite {
        file: file.clone().unwrap_or(fallback.file),
        line: line.unwrap_or(fallback.line),
    }
}
