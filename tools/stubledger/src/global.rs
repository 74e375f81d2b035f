//! Default ledger shared by everything running on the current thread.
//!
//! The Rust test harness runs each test on its own thread, so this behaves as
//! a per-test ledger. Tests that reuse a thread must still call `clear_mocks`
//! (or `tally_mocks`) before the next test starts.
//!
//! A reporter installed here must not call back into this module.

use crate::config::LedgerConfig;
use crate::errors::LedgerError;
use crate::identity::FunctionId;
use crate::ledger::StubLedger;
use crate::reporter::{ReportedFailure, TestReporter};
use crate::types::{CallSite, StubValue};
use std::cell::RefCell;

thread_local! {
    static LEDGER: RefCell<StubLedger> = RefCell::new(StubLedger::new());
}

pub fn with_ledger<R>(f: impl FnOnce(&mut StubLedger) -> R) -> R {
    LEDGER.with(|cell| f(&mut *cell.borrow_mut()))
}

/// Replaces this thread's ledger, returning the previous one.
pub fn install_ledger(ledger: StubLedger) -> StubLedger {
    LEDGER.with(|cell| cell.replace(ledger))
}

pub fn configure(cfg: &LedgerConfig) -> StubLedger {
    install_ledger(StubLedger::from_config(cfg))
}

pub fn expect(function: &FunctionId, site: &CallSite) {
    with_ledger(|ledger| ledger.expect(function, site));
}

pub fn mock(function: &FunctionId, site: &CallSite) {
    with_ledger(|ledger| ledger.mock(function, site));
}

pub fn always() {
    with_ledger(|ledger| {
        ledger.always();
    });
}

pub fn will_return(function: &FunctionId, value: impl Into<StubValue>) {
    let value = value.into();
    with_ledger(|ledger| ledger.will_return(function, value));
}

pub fn will_always_return(function: &FunctionId, value: impl Into<StubValue>) {
    let value = value.into();
    with_ledger(|ledger| ledger.will_always_return(function, value));
}

pub fn play() {
    with_ledger(StubLedger::play);
}

pub fn stubbed_result(function: &FunctionId, site: &CallSite) -> Result<StubValue, LedgerError> {
    with_ledger(|ledger| ledger.stubbed_result(function, site))
}

pub fn mask(parameters: &str) {
    with_ledger(|ledger| ledger.mask(parameters));
}

pub fn checked_integer(site: &CallSite, parameter: &str, value: i64) {
    with_ledger(|ledger| ledger.checked_integer(site, parameter, value));
}

pub fn checked_string(site: &CallSite, parameter: &str, value: &str) {
    with_ledger(|ledger| ledger.checked_string(site, parameter, value));
}

pub fn checked_address(site: &CallSite, parameter: &str, address: usize) {
    with_ledger(|ledger| ledger.checked_address(site, parameter, address));
}

pub fn clear_mocks() {
    with_ledger(StubLedger::clear_mocks);
}

pub fn tally_mocks(reporter: &dyn TestReporter) -> usize {
    with_ledger(|ledger| ledger.tally_mocks(reporter))
}

/// Failures collected by this thread's ledger, when it was configured with
/// `reporter.kind = "collect"`.
pub fn collected_failures() -> Vec<ReportedFailure> {
    with_ledger(|ledger| ledger.collected_failures())
}

/// `CallSite` for the line the macro is written on.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!())
    };
}

/// `global::expect` at the current call site.
#[macro_export]
macro_rules! expect_call {
    ($function:expr) => {
        $crate::global::expect(&$function, &$crate::call_site!())
    };
}

/// `global::mock` at the current call site.
#[macro_export]
macro_rules! mock_call {
    ($function:expr) => {
        $crate::global::mock(&$function, &$crate::call_site!())
    };
}

/// `global::stubbed_result` at the current call site.
#[macro_export]
macro_rules! stubbed_result {
    ($function:expr) => {
        $crate::global::stubbed_result(&$function, &$crate::call_site!())
    };
}

#[cfg(test)]
mod tests {
    use super::{clear_mocks, install_ledger, play, will_return, with_ledger};
    use crate::identity::FunctionId;
    use crate::ledger::StubLedger;
    use crate::reporter::CollectingReporter;
    use crate::types::{LedgerMode, StubValue};

    #[test]
    fn thread_ledger_round_trip_through_macros() {
        clear_mocks();
        let f = FunctionId::new("f");
        crate::expect_call!(f);
        assert_eq!(with_ledger(|l| l.mode()), LedgerMode::Recording);
        will_return(&f, 11);
        play();
        assert_eq!(crate::stubbed_result!(f).expect("stub"), StubValue(11));
        clear_mocks();
    }

    #[test]
    fn other_threads_see_their_own_ledger() {
        clear_mocks();
        let f = FunctionId::new("f");
        will_return(&f, 1);
        let seen = std::thread::spawn(|| with_ledger(|l| l.len()))
            .join()
            .expect("join");
        assert_eq!(seen, 0);
        assert_eq!(with_ledger(|l| l.len()), 1);
        clear_mocks();
    }

    #[test]
    fn install_returns_previous_ledger() {
        let reporter = CollectingReporter::new();
        let previous = install_ledger(StubLedger::new().with_reporter(reporter.clone()));
        let h = FunctionId::new("h");
        assert!(crate::stubbed_result!(h).is_err());
        assert_eq!(reporter.failure_count(), 1);
        install_ledger(previous);
    }
}
