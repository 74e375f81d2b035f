//! Stub scripts: ledger sessions written down as data.
//!
//! # Overview
//!
//! A script is a JSONL file (one `ScriptEntry` per line) that replays the
//! calls a test would make against the ledger:
//! 1. **Declarations** – `expect`, `mock`, `mask`
//! 2. **Stubs** – `always`, `will_return`, `will_always_return`, then `play`
//! 3. **Calls** – `call` entries standing in for the code under test
//! 4. **Teardown** – `clear`, `tally`
//!
//! Functions are named in the script and interned per run, so one name is one
//! identity. The player drives a fresh ledger with a collecting reporter and
//! reports every call outcome, which makes scripts usable as regression
//! fixtures for mock setups.

pub mod entry;
pub mod player;
