//! Identity tokens for mocked functions.
//!
//! Two `FunctionId`s match only when they come from the same `FunctionId::new`
//! call (or a clone of it). The name is carried for diagnostics and never takes
//! part in comparison, so two differently scoped functions that share a name
//! cannot collide.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct FunctionId {
    token: u64,
    name: Arc<str>,
}

impl FunctionId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

impl PartialEq for FunctionId {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for FunctionId {}

impl Hash for FunctionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl fmt::Debug for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.token)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Stable `FunctionId` for one expansion site.
///
/// Every place the macro is written gets its own identity, initialized on
/// first use and reused afterwards:
///
/// ```
/// fn open_id() -> stubledger::FunctionId {
///     stubledger::mocked_function!("open")
/// }
/// assert_eq!(open_id(), open_id());
/// assert_ne!(open_id(), stubledger::mocked_function!("open"));
/// ```
#[macro_export]
macro_rules! mocked_function {
    ($name:expr) => {{
        static ID: ::std::sync::OnceLock<$crate::FunctionId> = ::std::sync::OnceLock::new();
        ID.get_or_init(|| $crate::FunctionId::new($name)).clone()
    }};
}

/// Interns function names so one name maps to one identity within a scope.
///
/// Used where functions are only known by name, e.g. stub scripts.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    ids: HashMap<String, FunctionId>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, name: &str) -> FunctionId {
        if let Some(id) = self.ids.get(name) {
            return id.clone();
        }
        let id = FunctionId::new(name);
        self.ids.insert(name.to_string(), id.clone());
        id
    }

    pub fn get(&self, name: &str) -> Option<&FunctionId> {
        self.ids.get(name)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
