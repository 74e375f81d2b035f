//! Serializable script entries and the script file itself.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

// ── ScriptEntry ───────────────────────────────────────────────────────────────

/// One JSONL line of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEntry {
    Expect(DeclareEntry),
    Mock(DeclareEntry),
    Always,
    WillReturn(ReturnEntry),
    WillAlwaysReturn(ReturnEntry),
    Play,
    Mask(MaskEntry),
    Call(CallEntry),
    Clear,
    Tally,
}

impl ScriptEntry {
    pub fn function(&self) -> Option<&str> {
        match self {
            Self::Expect(d) | Self::Mock(d) => Some(d.function.as_str()),
            Self::WillReturn(r) | Self::WillAlwaysReturn(r) => Some(r.function.as_str()),
            Self::Call(c) => Some(c.function.as_str()),
            Self::Always | Self::Play | Self::Mask(_) | Self::Clear | Self::Tally => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareEntry {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEntry {
    pub function: String,
    pub value: isize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub parameters: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEntry {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// When set, a call returning anything else fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_value: Option<isize>,
}

// ── StubScript ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line in the source file.
    pub number: usize,
    pub entry: ScriptEntry,
}

/// A parsed script, ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubScript {
    pub source: String,
    pub lines: Vec<ScriptLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptSummary {
    pub entries: usize,
    pub declarations: usize,
    pub stubs: usize,
    pub sticky_stubs: usize,
    pub calls: usize,
    pub functions: usize,
}

impl StubScript {
    pub fn from_entries(source: impl Into<String>, entries: Vec<ScriptEntry>) -> Self {
        let lines = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| ScriptLine {
                number: idx + 1,
                entry,
            })
            .collect();
        Self {
            source: source.into(),
            lines,
        }
    }

    /// Load and parse a JSONL script file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| LedgerError::Io(e.to_string()))?;
        Self::parse(&path.display().to_string(), &raw)
    }

    pub fn parse(source: &str, raw: &str) -> Result<Self, LedgerError> {
        let mut lines = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: ScriptEntry = serde_json::from_str(line)
                .map_err(|e| LedgerError::Script(format!("script line {}: {e}", idx + 1)))?;
            lines.push(ScriptLine {
                number: idx + 1,
                entry,
            });
        }
        if lines.is_empty() {
            return Err(LedgerError::Script(format!("script {source} has no entries")));
        }
        Ok(Self {
            source: source.to_string(),
            lines,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
        }
        let mut payload = self.to_jsonl()?;
        payload.push('\n');
        std::fs::write(path, payload).map_err(|e| LedgerError::Io(e.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScriptEntry> {
        self.lines.iter().map(|line| &line.entry)
    }

    /// `sha256:` plus the first 16 hex chars of the canonical JSONL form.
    pub fn fingerprint(&self) -> Result<String, LedgerError> {
        let hash = Sha256::digest(self.to_jsonl()?.as_bytes());
        Ok(format!("sha256:{}", hex_bytes(&hash[..8])))
    }

    pub fn summary(&self) -> ScriptSummary {
        let mut summary = ScriptSummary {
            entries: self.lines.len(),
            ..ScriptSummary::default()
        };
        let mut functions = BTreeSet::new();
        let mut pending_sticky = false;
        for entry in self.entries() {
            if let Some(name) = entry.function() {
                functions.insert(name);
            }
            match entry {
                ScriptEntry::Expect(_) | ScriptEntry::Mock(_) => summary.declarations += 1,
                ScriptEntry::Always => pending_sticky = true,
                ScriptEntry::WillReturn(_) => {
                    summary.stubs += 1;
                    if pending_sticky {
                        summary.sticky_stubs += 1;
                    }
                    pending_sticky = false;
                }
                ScriptEntry::WillAlwaysReturn(_) => {
                    summary.stubs += 1;
                    summary.sticky_stubs += 1;
                    pending_sticky = false;
                }
                ScriptEntry::Play => pending_sticky = false,
                ScriptEntry::Call(_) => summary.calls += 1,
                ScriptEntry::Mask(_) | ScriptEntry::Clear | ScriptEntry::Tally => {}
            }
        }
        summary.functions = functions.len();
        summary
    }

    fn to_jsonl(&self) -> Result<String, LedgerError> {
        let rendered = self
            .entries()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Script(e.to_string()))?;
        Ok(rendered.join("\n"))
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
