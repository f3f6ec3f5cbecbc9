//! Service layer for rvw-core.
//!
//! [`ReviewService`] wraps whichever [`ReviewStore`] was selected at process
//! start and adds the operations the CLI and TUI share: paged browsing with
//! totals, lookups that report not-found, imports, and statistics.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use rvw_core::core::{ReviewService, StoreConfig};
//! use rvw_core::model::Filters;
//! use rvw_core::store::StoreBackend;
//!
//! let config = StoreConfig::new(StoreBackend::Sqlite, Path::new("reviews.db"));
//! let service = ReviewService::open(config).unwrap();
//! let filters = Filters::builder().min_rating(4).build().unwrap();
//! let page = service.browse(Some(&filters), 1, 20).unwrap();
//! ```

pub mod errors;

pub use errors::{CoreError, CoreResult, ValidationError};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bootstrap::needs_reload;
use crate::ingest::{read_dump, IngestReport};
use crate::model::{Filters, Review};
use crate::query::page_count;
use crate::store::memory::MemoryStore;
use crate::store::{open_store, ReviewStats, ReviewStore, StoreBackend};

/// Which store to open and where it lives.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    backend: StoreBackend,
    db_path: PathBuf,
}

impl StoreConfig {
    #[must_use]
    pub fn new(backend: StoreBackend, db_path: &Path) -> Self {
        Self {
            backend,
            db_path: db_path.to_path_buf(),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Path to the SQLite database (unused by the memory backend).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// One page of reviews plus the totals needed to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: u64,
}

/// Facade over the configured review store.
pub struct ReviewService {
    config: StoreConfig,
    store: Box<dyn ReviewStore + Send>,
}

impl ReviewService {
    /// Open the store described by `config`.
    pub fn open(config: StoreConfig) -> CoreResult<Self> {
        let store = open_store(config.backend(), config.db_path())?;
        Ok(Self { config, store })
    }

    /// A service over an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            config: StoreConfig::new(StoreBackend::Memory, Path::new("")),
            store: Box::new(MemoryStore::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying store, for operations not wrapped here.
    #[must_use]
    pub fn store(&self) -> &dyn ReviewStore {
        self.store.as_ref()
    }

    /// One page of matching reviews with the total match count.
    pub fn browse(
        &self,
        filters: Option<&Filters>,
        page: i64,
        page_size: i64,
    ) -> CoreResult<ReviewPage> {
        let reviews = self.store.query(filters, page, page_size)?;
        let total = self.store.count(filters)?;
        Ok(ReviewPage {
            reviews,
            total,
            page,
            page_size,
            total_pages: page_count(total, page_size),
        })
    }

    /// Get a review by id.
    ///
    /// Returns `Err(CoreError::ReviewNotFound)` if it does not exist.
    pub fn get(&self, id: i64) -> CoreResult<Review> {
        self.get_optional(id)?
            .ok_or(CoreError::ReviewNotFound { id })
    }

    /// Get a review by id, returning `None` if not found.
    pub fn get_optional(&self, id: i64) -> CoreResult<Option<Review>> {
        self.store.get_by_id(id)
    }

    /// Reviews whose text or title contains any keyword.
    pub fn search(&self, keywords: &[String]) -> CoreResult<Vec<Review>> {
        self.store.get_by_keywords(keywords)
    }

    pub fn stats(&self, filters: Option<&Filters>) -> CoreResult<ReviewStats> {
        self.store.stats(filters)
    }

    pub fn total_count(&self) -> CoreResult<u64> {
        self.store.total_count()
    }

    /// Insert or replace reviews by id.
    pub fn save(&mut self, reviews: &[Review]) -> CoreResult<()> {
        self.store.save(reviews)
    }

    /// Parse a dump file and save every valid review in one batch.
    pub fn import_file(&mut self, path: &Path) -> CoreResult<IngestReport> {
        let dump = read_dump(path)?;
        self.store.save(&dump.reviews)?;
        let report = IngestReport {
            imported: dump.reviews.len(),
            skipped: dump.skipped,
        };
        tracing::info!(
            path = %path.display(),
            imported = report.imported,
            skipped = report.skipped,
            "imported reviews"
        );
        Ok(report)
    }

    /// Import `path` only when the database is missing or older than it.
    ///
    /// The memory backend always imports. Returns `None` when the database
    /// was already up to date.
    pub fn import_if_stale(&mut self, path: &Path) -> CoreResult<Option<IngestReport>> {
        let stale = match self.config.backend() {
            StoreBackend::Memory => true,
            StoreBackend::Sqlite => {
                self.store.total_count()? == 0 || needs_reload(path, self.config.db_path())?
            }
        };
        if !stale {
            tracing::info!(path = %path.display(), "database is up to date, skipping import");
            return Ok(None);
        }
        self.import_file(path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DUMP: &str = r#"[
        {"id": 1, "reviewedDate": "2023-01-01", "rating": 5, "author": "Jane Smith"},
        {"id": 2, "reviewedDate": "2023-02-01", "rating": 3, "author": "John"},
        {"id": 3, "reviewedDate": "2023-03-01", "rating": 5},
        {"id": 4, "reviewedDate": "2023-03-01", "rating": 0}
    ]"#;

    #[test]
    fn test_import_and_browse() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("reviews.json");
        fs::write(&dump, DUMP).unwrap();

        let mut service = ReviewService::in_memory();
        let report = service.import_file(&dump).unwrap();
        assert_eq!(report, IngestReport { imported: 3, skipped: 1 });

        let page = service.browse(None, 1, 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.reviews.len(), 2);
    }

    #[test]
    fn test_get_not_found() {
        let service = ReviewService::in_memory();
        let err = service.get(77).unwrap_err();
        assert!(matches!(err, CoreError::ReviewNotFound { id: 77 }));
        assert!(service.get_optional(77).unwrap().is_none());
    }

    #[test]
    fn test_import_if_stale_sqlite() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("reviews.json");
        fs::write(&dump, DUMP).unwrap();
        let db = dir.path().join("reviews.db");

        let config = StoreConfig::new(StoreBackend::Sqlite, &db);
        let mut service = ReviewService::open(config).unwrap();

        // Fresh empty database always loads.
        let first = service.import_if_stale(&dump).unwrap();
        assert_eq!(first.map(|r| r.imported), Some(3));

        // Database was written after the dump, so it is current.
        let second = service.import_if_stale(&dump).unwrap();
        assert!(second.is_none());
        assert_eq!(service.total_count().unwrap(), 3);
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let mut service = ReviewService::in_memory();
        let err = service.import_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
