//! Extension points for argument verification.
//!
//! Generated mock shims call these hooks with each argument before asking the
//! ledger for a stubbed result. The default checker accepts everything.

use crate::types::CallSite;

pub trait ParameterChecker {
    fn checked_integer(&self, _site: &CallSite, _parameter: &str, _value: i64) {}

    fn checked_string(&self, _site: &CallSite, _parameter: &str, _value: &str) {}

    fn checked_address(&self, _site: &CallSite, _parameter: &str, _address: usize) {}

    /// Parameters named in `mask` should be excluded from verification.
    fn mask(&self, _mask: &ParameterMask) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChecker;

impl ParameterChecker for NoopChecker {}

/// Parameter names parsed from a list such as `"path, flags"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMask {
    names: Vec<String>,
}

impl ParameterMask {
    pub fn parse(parameters: &str) -> Self {
        let names = parameters
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.names.iter().any(|name| name == parameter)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
