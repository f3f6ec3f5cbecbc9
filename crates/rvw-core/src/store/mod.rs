//! Review storage backends.
//!
//! [`ReviewStore`] is the one contract the rest of the application depends
//! on. [`sqlite::SqliteStore`] implements it by generating SQL,
//! [`memory::MemoryStore`] by filtering an in-process map. For the same
//! stored reviews and the same arguments, both return the same reviews in the
//! same order.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::core::CoreResult;
use crate::model::{Filters, Review, MAX_RATING, MIN_RATING};

/// Query, count and save operations over a review collection.
pub trait ReviewStore {
    /// Reviews matching `filters`, sorted and sliced to one page.
    ///
    /// `None` filters match everything. A page beyond the end, or a page or
    /// page size below 1, yields an empty vector.
    fn query(&self, filters: Option<&Filters>, page: i64, page_size: i64)
        -> CoreResult<Vec<Review>>;

    /// Total number of reviews matching `filters`.
    fn count(&self, filters: Option<&Filters>) -> CoreResult<u64>;

    /// Look up one review. A missing id is `Ok(None)`.
    fn get_by_id(&self, id: i64) -> CoreResult<Option<Review>>;

    /// One unfiltered page in natural order.
    fn get_page(&self, page: i64, page_size: i64) -> CoreResult<Vec<Review>> {
        self.query(None, page, page_size)
    }

    fn total_count(&self) -> CoreResult<u64> {
        self.count(None)
    }

    /// Reviews whose text or title contains any of `keywords`.
    ///
    /// An empty keyword list yields an empty vector, not every review.
    fn get_by_keywords(&self, keywords: &[String]) -> CoreResult<Vec<Review>>;

    /// Insert or replace reviews by id.
    fn save(&mut self, reviews: &[Review]) -> CoreResult<()>;

    /// Aggregate statistics over the reviews matching `filters`.
    fn stats(&self, filters: Option<&Filters>) -> CoreResult<ReviewStats>;
}

/// Which backend to open at process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StoreBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

#[must_use]
pub fn parse_backend(value: &str) -> Option<StoreBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sqlite" | "sql" | "db" => Some(StoreBackend::Sqlite),
        "memory" | "mem" | "in-memory" => Some(StoreBackend::Memory),
        _ => None,
    }
}

/// Open the selected backend. `db_path` is only used by SQLite.
pub fn open_store(
    backend: StoreBackend,
    db_path: &Path,
) -> CoreResult<Box<dyn ReviewStore + Send>> {
    let store: Box<dyn ReviewStore + Send> = match backend {
        StoreBackend::Sqlite => Box::new(sqlite::SqliteStore::open(db_path)?),
        StoreBackend::Memory => Box::new(memory::MemoryStore::new()),
    };
    tracing::debug!(backend = backend.as_str(), "opened review store");
    Ok(store)
}

/// Review count for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: Option<String>,
    pub count: u64,
}

/// Aggregate statistics over a filtered set of reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total: u64,
    /// Mean rating, absent when nothing matched.
    pub average_rating: Option<f64>,
    /// Counts keyed by star rating, 1 through 5, zeros included.
    pub rating_histogram: BTreeMap<u8, u64>,
    /// Most reviewed sources first, then by name.
    pub by_source: Vec<SourceCount>,
}

impl ReviewStats {
    /// Build stats from per-rating and per-source counts.
    ///
    /// The average is derived from the histogram so every backend computes
    /// it the same way.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(
        ratings: impl IntoIterator<Item = (u8, u64)>,
        sources: impl IntoIterator<Item = (Option<String>, u64)>,
    ) -> Self {
        let mut rating_histogram: BTreeMap<u8, u64> =
            (MIN_RATING..=MAX_RATING).map(|r| (r, 0)).collect();
        for (rating, count) in ratings {
            *rating_histogram.entry(rating).or_insert(0) += count;
        }

        let total: u64 = rating_histogram.values().sum();
        let weighted: u64 = rating_histogram
            .iter()
            .map(|(rating, count)| u64::from(*rating) * count)
            .sum();
        let average_rating = (total > 0).then(|| weighted as f64 / total as f64);

        let mut merged: BTreeMap<Option<String>, u64> = BTreeMap::new();
        for (source, count) in sources {
            *merged.entry(source).or_insert(0) += count;
        }
        let mut by_source: Vec<SourceCount> = merged
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect();
        by_source.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));

        Self {
            total,
            average_rating,
            rating_histogram,
            by_source,
        }
    }
}
