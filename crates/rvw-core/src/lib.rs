//! Domain logic for the rvw review browser.
//!
//! This crate owns the review and filter value types, the filter/sort/paginate
//! query model, the storage backends (SQLite and in-memory), JSON ingestion,
//! and the service facade consumed by the CLI and TUI.

pub mod bootstrap;
pub mod core;
pub mod ingest;
pub mod model;
pub mod query;
pub mod store;
