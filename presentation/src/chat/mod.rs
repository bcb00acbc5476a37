//! Interactive chat module
//!
//! Provides a readline-based REPL that answers one question per line for a
//! fixed tenant.

mod repl;

pub use repl::ChatRepl;
