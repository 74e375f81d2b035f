//! JSONL event log of ledger activity.
//!
//! Each line is one `LogRecord`. Sequence numbers are per logger and start
//! at 1, so a log shared by several ledgers still shows each one's order.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::Cell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// What the ledger was doing when the line was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Expect,
    Mock,
    WillReturn,
    Play,
    StubbedResult,
    UnstubbedCall,
    Clear,
    Tally,
}

impl LedgerEvent {
    pub fn level(self) -> LogLevel {
        match self {
            Self::UnstubbedCall => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expect => "expect",
            Self::Mock => "mock",
            Self::WillReturn => "will_return",
            Self::Play => "play",
            Self::StubbedResult => "stubbed_result",
            Self::UnstubbedCall => "unstubbed_call",
            Self::Clear => "clear",
            Self::Tally => "tally",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub seq: u64,
    pub level: LogLevel,
    pub event_type: LedgerEvent,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    next_seq: Cell<u64>,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            next_seq: Cell::new(1),
        }
    }

    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    pub fn record(&self, event: LedgerEvent, payload: Value) -> Result<(), LedgerError> {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let line = serde_json::to_string(&LogRecord {
            seq,
            level: event.level(),
            event_type: event,
            payload: clip_payload(payload, self.max_payload_bytes),
        })
        .map_err(|e| LedgerError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::Io(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| LedgerError::Io(e.to_string()))
    }
}

/// Reads back every record of a ledger log, naming the first bad line.
pub fn read_log(path: &Path) -> Result<Vec<LogRecord>, LedgerError> {
    let raw = fs::read_to_string(path).map_err(|e| LedgerError::Io(e.to_string()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| LedgerError::Io(format!("log line {}: {e}", idx + 1)))
        })
        .collect()
}

/// One-line rendering of a played call for plain-text output.
pub fn structured_fallback_line(function: &str, outcome: &str, message: &str) -> String {
    format!(
        "function={function} outcome={outcome} message={} ",
        message.replace('\n', "\\n")
    )
}

/// Oversized payloads are replaced by a marked preview of their JSON text.
fn clip_payload(payload: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&payload).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return payload;
    }
    let mut cut = max_bytes.min(rendered.len());
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    json!({
        "clipped_bytes": rendered.len() - cut,
        "preview": &rendered[..cut],
    })
}
