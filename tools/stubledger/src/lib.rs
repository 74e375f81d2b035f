pub mod checks;
pub mod config;
pub mod errors;
pub mod global;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod reporter;
pub mod script;
pub mod types;

pub use errors::LedgerError;
pub use identity::FunctionId;
pub use ledger::{StubLedger, StubRecord};
pub use reporter::{CollectingReporter, PanicReporter, TestReporter};
pub use types::{CallSite, LedgerMode, StubValue};

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use config::{load_config, CliOverrides};
use logging::structured_fallback_line;
use script::entry::StubScript;
use script::player::play_script;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "stubledger")]
#[command(about = "Check and play stub ledger scripts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse a script and print a summary of its entries.
    Check { script: PathBuf },
    /// Play a script against a fresh ledger and report every call.
    Play {
        script: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        verify_expectations: bool,
    },
}

pub fn run() -> Result<i32, LedgerError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| LedgerError::Io(e.to_string()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_args(&args, &cwd, &mut out)
}

pub fn run_with_args(
    args: &[OsString],
    cwd: &Path,
    out: &mut dyn Write,
) -> Result<i32, LedgerError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                write_out(out, &error.to_string())?;
                return Ok(0);
            }
            _ => return Err(LedgerError::Cli(error.to_string())),
        },
    };

    match cli.command {
        Command::Check { script } => {
            let script = StubScript::load(&absolutize(cwd, &script))?;
            let summary = script.summary();
            write_line(
                out,
                &format!(
                    "check ok: entries={} declarations={} stubs={} sticky={} calls={} functions={} fingerprint={}",
                    summary.entries,
                    summary.declarations,
                    summary.stubs,
                    summary.sticky_stubs,
                    summary.calls,
                    summary.functions,
                    script.fingerprint()?
                ),
            )?;
            Ok(0)
        }
        Command::Play {
            script,
            config,
            log,
            verify_expectations,
        } => {
            let overrides = CliOverrides {
                config_path: config.map(|path| absolutize(cwd, &path)),
                log_path: log,
                reporter: None,
                verify_expectations,
            };
            let cfg = load_config(&overrides, cwd)?;
            let script = StubScript::load(&absolutize(cwd, &script))?;
            let report = play_script(&script, &cfg);

            for call in &report.calls {
                let (outcome, message) = match (call.value, call.expected) {
                    (None, _) => ("unstubbed", format!("at {}", call.site)),
                    (Some(value), _) if call.passed => ("ok", format!("value {value}")),
                    (Some(value), expected) => (
                        "mismatch",
                        format!(
                            "value {value} expected {}",
                            expected.map(|v| v.to_string()).unwrap_or_default()
                        ),
                    ),
                };
                write_line(out, &structured_fallback_line(&call.function, outcome, &message))?;
            }
            for failure in &report.failures {
                write_line(out, &format!("failure {}: {}", failure.site, failure.message))?;
            }
            write_line(
                out,
                &format!(
                    "play complete: calls={} failures={} tally_failures={}",
                    report.calls.len(),
                    report.failures.len(),
                    report.tally_failures
                ),
            )?;
            Ok(if report.all_passed { 0 } else { 1 })
        }
    }
}

pub fn render_help() -> String {
    Cli::command().render_long_help().to_string()
}

fn absolutize(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<(), LedgerError> {
    out.write_all(text.as_bytes())
        .map_err(|e| LedgerError::Io(e.to_string()))
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<(), LedgerError> {
    writeln!(out, "{line}").map_err(|e| LedgerError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{render_help, run_with_args};
    use std::ffi::OsString;
    use std::path::Path;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn help_mentions_both_subcommands() {
        let help = render_help();
        assert!(help.contains("check"));
        assert!(help.contains("play"));
    }

    #[test]
    fn help_flag_exits_zero() {
        let mut out = Vec::new();
        let code = run_with_args(&args(&["stubledger", "--help"]), Path::new("/"), &mut out)
            .expect("help");
        assert_eq!(code, 0);
        assert!(String::from_utf8_lossy(&out).contains("Usage"));
    }

    #[test]
    fn unknown_subcommand_is_a_cli_error() {
        let mut out = Vec::new();
        let err = run_with_args(&args(&["stubledger", "rewind"]), Path::new("/"), &mut out)
            .expect_err("cli error");
        assert!(err.to_string().starts_with("cli error:"));
    }

    #[test]
    fn play_relative_script_resolves_against_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("s.jsonl"),
            concat!(
                "{\"type\":\"will_return\",\"function\":\"f\",\"value\":3}\n",
                "{\"type\":\"call\",\"function\":\"f\",\"expect_value\":3}\n",
            ),
        )
        .expect("write script");

        let mut out = Vec::new();
        let code = run_with_args(&args(&["stubledger", "play", "s.jsonl"]), dir.path(), &mut out)
            .expect("play");
        let text = String::from_utf8_lossy(&out).to_string();
        assert_eq!(code, 0);
        assert!(text.contains("function=f outcome=ok message=value 3 "));
        assert!(text.contains("play complete: calls=1 failures=0 tally_failures=0"));
    }
}
