use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the ledger is between an expectation and `play`, or serving calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    Recording,
    #[default]
    Playing,
}

impl LedgerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Playing => "playing",
        }
    }
}

/// Source location of a mocked call or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A stubbed return value: wide enough for any integer or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StubValue(pub isize);

impl StubValue {
    pub fn get(self) -> isize {
        self.0
    }

    pub fn as_i32(self) -> Option<i32> {
        i32::try_from(self.0).ok()
    }

    pub fn as_bool(self) -> bool {
        self.0 != 0
    }

    pub fn as_address(self) -> usize {
        self.0 as usize
    }
}

impl From<isize> for StubValue {
    fn from(value: isize) -> Self {
        Self(value)
    }
}

impl From<i32> for StubValue {
    fn from(value: i32) -> Self {
        Self(value as isize)
    }
}

impl From<bool> for StubValue {
    fn from(value: bool) -> Self {
        Self(isize::from(value))
    }
}

impl From<usize> for StubValue {
    fn from(address: usize) -> Self {
        Self(address as isize)
    }
}

impl From<StubValue> for isize {
    fn from(value: StubValue) -> Self {
        value.0
    }
}

impl fmt::Display for StubValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
