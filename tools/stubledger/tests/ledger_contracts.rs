use stubledger::{
    CallSite, CollectingReporter, FunctionId, LedgerError, LedgerMode, StubLedger, StubValue,
};

// ── helpers ───────────────────────────────────────────────────────────────────

fn collecting_ledger() -> (StubLedger, CollectingReporter) {
    let reporter = CollectingReporter::new();
    let ledger = StubLedger::new().with_reporter(reporter.clone());
    (ledger, reporter)
}

fn at(line: u32) -> CallSite {
    CallSite::new("ledger_contracts.rs", line)
}

fn serve(ledger: &mut StubLedger, function: &FunctionId) -> StubValue {
    ledger
        .stubbed_result(function, &at(0))
        .unwrap_or_else(|e| panic!("expected a stub for {function}: {e}"))
}

// ── single-use records ────────────────────────────────────────────────────────

#[test]
fn served_record_returns_value_and_is_consumed() {
    let (mut ledger, _reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    for value in [3isize, -1, 0, isize::MAX] {
        ledger.will_return(&f, value);
        assert_eq!(ledger.pending_for(&f), 1);
        assert_eq!(serve(&mut ledger, &f), StubValue(value));
        assert_eq!(ledger.pending_for(&f), 0);
    }
}

#[test]
fn records_for_one_function_are_served_in_registration_order() {
    let (mut ledger, _reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    ledger.will_return(&f, 1);
    ledger.will_return(&f, 2);
    assert_eq!(serve(&mut ledger, &f), StubValue(1));
    assert_eq!(serve(&mut ledger, &f), StubValue(2));
}

#[test]
fn distinct_functions_are_served_independently() {
    let (mut ledger, _reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    let g = FunctionId::new("g");
    ledger.will_return(&f, 1);
    ledger.will_return(&g, 2);
    assert_eq!(serve(&mut ledger, &g), StubValue(2));
    assert_eq!(serve(&mut ledger, &f), StubValue(1));
    assert!(ledger.is_empty());
}

#[test]
fn same_named_functions_do_not_share_records() {
    let (mut ledger, reporter) = collecting_ledger();
    let outer_read = FunctionId::new("read");
    let inner_read = FunctionId::new("read");
    ledger.will_return(&outer_read, 10);

    assert!(ledger.stubbed_result(&inner_read, &at(1)).is_err());
    assert_eq!(reporter.failure_count(), 1);
    assert_eq!(serve(&mut ledger, &outer_read), StubValue(10));
}

// ── sticky records ────────────────────────────────────────────────────────────

#[test]
fn sticky_record_is_served_repeatedly_and_stays() {
    let (mut ledger, _reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    ledger.always().will_return(&f, 7);
    for _ in 0..5 {
        assert_eq!(serve(&mut ledger, &f), StubValue(7));
        assert_eq!(ledger.pending_for(&f), 1);
    }
}

#[test]
fn explicit_sticky_form_matches_always() {
    let (mut ledger, _reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    ledger.will_always_return(&f, true);
    assert!(serve(&mut ledger, &f).as_bool());
    assert!(serve(&mut ledger, &f).as_bool());
    assert!(ledger.records()[0].sticky);
}

// ── misses ────────────────────────────────────────────────────────────────────

#[test]
fn unstubbed_call_reports_exactly_once_and_yields_no_value() {
    let (mut ledger, reporter) = collecting_ledger();
    let h = FunctionId::new("h");

    let result = ledger.stubbed_result(&h, &at(77));
    match result {
        Err(LedgerError::UnstubbedCall {
            function,
            file,
            line,
        }) => {
            assert_eq!(function, "h");
            assert_eq!(file, "ledger_contracts.rs");
            assert_eq!(line, 77);
        }
        other => panic!("expected unstubbed call, got {other:?}"),
    }
    assert_eq!(reporter.failure_count(), 1);
    assert_eq!(reporter.pass_count(), 0);
}

#[test]
#[should_panic(expected = "ledger_contracts.rs:5: No return value set for function [missing]")]
fn default_reporter_fails_the_test_at_the_call_site() {
    let mut ledger = StubLedger::new();
    let missing = FunctionId::new("missing");
    let _ = ledger.stubbed_result(&missing, &at(5));
}

// ── lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn clear_is_idempotent_on_a_fresh_ledger() {
    let mut ledger = StubLedger::new();
    ledger.clear_mocks();
    ledger.clear_mocks();
    assert!(!ledger.is_allocated());
}

#[test]
fn clear_drops_sticky_records_too() {
    let (mut ledger, reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    ledger.will_always_return(&f, 1);
    ledger.clear_mocks();
    assert!(ledger.stubbed_result(&f, &at(2)).is_err());
    assert_eq!(reporter.failure_count(), 1);
}

#[test]
fn mode_transitions_do_not_change_serving() {
    let f = FunctionId::new("f");

    let (mut scripted, _r1) = collecting_ledger();
    scripted.mock(&f, &at(1));
    assert_eq!(scripted.mode(), LedgerMode::Recording);
    scripted.play();
    assert_eq!(scripted.mode(), LedgerMode::Playing);
    scripted.will_return(&f, 4);
    scripted.will_return(&f, 5);

    let (mut bare, _r2) = collecting_ledger();
    bare.will_return(&f, 4);
    bare.will_return(&f, 5);

    assert_eq!(scripted.records(), bare.records());
    assert_eq!(serve(&mut scripted, &f), serve(&mut bare, &f));
    assert_eq!(serve(&mut scripted, &f), serve(&mut bare, &f));
}

#[test]
fn open_scenario_serves_once_then_fails() {
    let (mut ledger, reporter) = collecting_ledger();
    let open = FunctionId::new("open");
    ledger.expect(&open, &at(10));
    ledger.will_return(&open, 42);
    ledger.play();

    assert_eq!(serve(&mut ledger, &open), StubValue(42));
    let err = ledger
        .stubbed_result(&open, &at(12))
        .expect_err("second call must miss");
    assert!(err.is_unstubbed_call());
    assert_eq!(reporter.failures()[0].site, at(12));
}

#[test]
fn mask_and_parameter_checks_leave_ledger_untouched() {
    let (mut ledger, reporter) = collecting_ledger();
    let f = FunctionId::new("f");
    ledger.will_return(&f, 1);
    ledger.mask("path, flags");
    ledger.checked_integer(&at(1), "flags", 3);
    ledger.checked_string(&at(1), "path", "/tmp/x");
    ledger.checked_address(&at(1), "buffer", 0xdead);

    assert_eq!(ledger.len(), 1);
    assert_eq!(reporter.failure_count(), 0);
    assert_eq!(serve(&mut ledger, &f), StubValue(1));
}
