use assert_cmd::cargo::cargo_bin_cmd;

fn fixture(path: &str) -> String {
    format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("--help");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");

    assert!(stdout.contains("check"));
    assert!(stdout.contains("play"));
}

#[test]
fn check_prints_summary_and_fingerprint() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("check").arg(fixture("scripts/file_copy.jsonl"));
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("check ok: entries=12 declarations=1 stubs=3 sticky=1 calls=4 functions=2"));
    assert!(stdout.contains("fingerprint=sha256:"));
}

#[test]
fn play_passing_script_exits_zero() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("play")
        .arg(fixture("scripts/file_copy.jsonl"))
        .arg("--config")
        .arg(fixture("configs/verify.toml"));
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("play complete: calls=4 failures=0 tally_failures=0"));
}

#[test]
fn play_unstubbed_script_exits_one() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("play").arg(fixture("scripts/unstubbed.jsonl"));
    let out = cmd.assert().code(1);
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("function=open outcome=unstubbed message=at main.c:30 "));
    assert!(stdout.contains("failure main.c:30: No return value set for function [open]"));
}

#[test]
fn verify_flag_turns_unmet_expectation_into_failure() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("play")
        .arg(fixture("scripts/unmet_expectation.jsonl"))
        .arg("--verify-expectations");
    cmd.assert().code(1);
}

#[test]
fn invalid_config_exits_two() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("play")
        .arg(fixture("scripts/file_copy.jsonl"))
        .arg("--config")
        .arg(fixture("configs/invalid.toml"));
    cmd.assert().code(2);
}

#[test]
fn malformed_script_exits_two() {
    let mut cmd = cargo_bin_cmd!("stubledger");
    cmd.arg("check").arg(fixture("scripts/malformed.jsonl"));
    cmd.assert().code(2);
}
