//! Subcommand handlers.
//!
//! Handlers write to the given sink rather than stdout so the REPL can
//! reuse them.

pub mod helpers;
pub mod import;
pub mod repl;
pub mod reviews;
pub mod stats;
