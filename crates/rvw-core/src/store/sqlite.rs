//! SQLite-backed review store.
//!
//! Filters are compiled into a parameterized `WHERE` clause over the single
//! `reviews` table. Every public operation opens its own connection and drops
//! it before returning, so a failed call leaves nothing behind for the next.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use crate::core::{CoreError, CoreResult};
use crate::model::{Filters, Review, SortOrder, DATE_FORMAT, TIME_FORMAT};
use crate::query::PageWindow;

use super::{ReviewStats, ReviewStore};

/// How long a call waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    review TEXT,
    author TEXT,
    reviewSource TEXT,
    title TEXT,
    productName TEXT,
    reviewedDate TEXT NOT NULL,
    rating INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_rating ON reviews(rating);
CREATE INDEX IF NOT EXISTS idx_reviews_reviewed_date ON reviews(reviewedDate);
";

const SELECT_COLUMNS: &str =
    "SELECT id, review, author, reviewSource, title, productName, reviewedDate, rating FROM reviews";

const UPSERT_SQL: &str = "
INSERT INTO reviews (id, review, author, reviewSource, title, productName, reviewedDate, rating)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    review = excluded.review,
    author = excluded.author,
    reviewSource = excluded.reviewSource,
    title = excluded.title,
    productName = excluded.productName,
    reviewedDate = excluded.reviewedDate,
    rating = excluded.rating
";

/// Review store over a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the database at `path`, creating the file, its parent
    /// directories, and the `reviews` table if they don't exist.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.init_schema().map_err(CoreError::Persistence)?;
        Ok(store)
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directories: {}", parent.display())
                })?;
            }
        }
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize schema")?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("Failed to open database: {}", self.path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        Ok(conn)
    }

    fn query_reviews(
        &self,
        filters: Option<&Filters>,
        window: PageWindow,
    ) -> Result<Vec<Review>> {
        let clause = WhereClause::from_filters(filters);
        let order = filters.map_or(SortOrder::Natural, Filters::sort_order);

        let mut sql = format!("{SELECT_COLUMNS}{}", clause.sql);
        sql.push_str(order_by(order));
        sql.push_str(" LIMIT ? OFFSET ?");

        let limit = window.limit() as i64;
        let offset = window.offset() as i64;
        let mut params = clause.param_refs();
        params.push(&limit);
        params.push(&offset);

        tracing::debug!(%sql, params = params.len(), "query reviews");
        let conn = self.connect()?;
        select_reviews(&conn, &sql, &params)
    }

    fn count_reviews(&self, filters: Option<&Filters>) -> Result<u64> {
        let clause = WhereClause::from_filters(filters);
        let sql = format!("SELECT COUNT(*) FROM reviews{}", clause.sql);
        tracing::debug!(%sql, "count reviews");

        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(&sql, clause.param_refs().as_slice(), |row| row.get(0))
            .context("Failed to count reviews")?;
        Ok(count as u64)
    }

    fn review_by_id(&self, id: i64) -> Result<Option<Review>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                params![id],
                review_from_row,
            )
            .optional()
            .context("Failed to query review")?;
        Ok(row.flatten())
    }

    fn reviews_by_keywords(&self, keywords: &[String]) -> Result<Vec<Review>> {
        let mut fragments = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();
        for keyword in keywords.iter().filter(|k| !k.trim().is_empty()) {
            fragments.push("(review LIKE ? ESCAPE '\\' OR title LIKE ? ESCAPE '\\')");
            let pattern = like_pattern(keyword);
            param_values.push(Box::new(pattern.clone()));
            param_values.push(Box::new(pattern));
        }
        if fragments.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{SELECT_COLUMNS} WHERE {} ORDER BY id",
            fragments.join(" OR ")
        );
        let params: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();

        tracing::debug!(%sql, keywords = fragments.len(), "keyword search");
        let conn = self.connect()?;
        select_reviews(&conn, &sql, &params)
    }

    fn upsert_reviews(&self, reviews: &[Review]) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        {
            let mut stmt = tx
                .prepare(UPSERT_SQL)
                .context("Failed to prepare upsert")?;
            for review in reviews {
                stmt.execute(params![
                    review.id(),
                    review.text(),
                    review.author(),
                    review.source(),
                    review.title(),
                    review.product_name(),
                    review.stored_date(),
                    i64::from(review.rating()),
                ])
                .with_context(|| format!("Failed to save review {}", review.id()))?;
            }
        }
        tx.commit().context("Failed to commit reviews")?;
        tracing::debug!(count = reviews.len(), "saved reviews");
        Ok(())
    }

    fn aggregate(&self, filters: Option<&Filters>) -> Result<ReviewStats> {
        let clause = WhereClause::from_filters(filters);
        let params = clause.param_refs();
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT rating, COUNT(*) FROM reviews{} GROUP BY rating",
                clause.sql
            ))
            .context("Failed to prepare rating histogram")?;
        let ratings = stmt
            .query_map(params.as_slice(), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .context("Failed to execute rating histogram")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read rating histogram")?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT reviewSource, COUNT(*) FROM reviews{} GROUP BY reviewSource",
                clause.sql
            ))
            .context("Failed to prepare source counts")?;
        let sources = stmt
            .query_map(params.as_slice(), |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
            })
            .context("Failed to execute source counts")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read source counts")?;

        let ratings = ratings.into_iter().filter_map(|(rating, count)| {
            u8::try_from(rating).ok().map(|r| (r, count as u64))
        });
        let sources = sources
            .into_iter()
            .map(|(source, count)| (source, count as u64));
        Ok(ReviewStats::from_counts(ratings, sources))
    }
}

impl ReviewStore for SqliteStore {
    fn query(
        &self,
        filters: Option<&Filters>,
        page: i64,
        page_size: i64,
    ) -> CoreResult<Vec<Review>> {
        let Some(window) = PageWindow::new(page, page_size) else {
            return Ok(Vec::new());
        };
        self.query_reviews(filters, window)
            .map_err(CoreError::Persistence)
    }

    fn count(&self, filters: Option<&Filters>) -> CoreResult<u64> {
        self.count_reviews(filters).map_err(CoreError::Persistence)
    }

    fn get_by_id(&self, id: i64) -> CoreResult<Option<Review>> {
        self.review_by_id(id).map_err(CoreError::Persistence)
    }

    fn get_by_keywords(&self, keywords: &[String]) -> CoreResult<Vec<Review>> {
        self.reviews_by_keywords(keywords)
            .map_err(CoreError::Persistence)
    }

    fn save(&mut self, reviews: &[Review]) -> CoreResult<()> {
        self.upsert_reviews(reviews)
            .map_err(CoreError::Persistence)
    }

    fn stats(&self, filters: Option<&Filters>) -> CoreResult<ReviewStats> {
        self.aggregate(filters).map_err(CoreError::Persistence)
    }
}

// ============================================================================
// SQL generation
// ============================================================================

/// A `WHERE` clause and its positional parameters, in append order.
struct WhereClause {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    fn from_filters(filters: Option<&Filters>) -> Self {
        let mut clause = Self {
            sql: String::from(" WHERE 1=1"),
            params: Vec::new(),
        };
        let Some(f) = filters else {
            return clause;
        };

        if let Some(r) = f.rating() {
            clause.push(" AND rating = ?", i64::from(r));
        }
        if let Some(r) = f.min_rating() {
            clause.push(" AND rating >= ?", i64::from(r));
        }
        if let Some(r) = f.max_rating() {
            clause.push(" AND rating <= ?", i64::from(r));
        }
        if let Some(s) = f.author_name() {
            clause.push(" AND author LIKE ? ESCAPE '\\'", like_pattern(s));
        }
        if let Some(s) = f.review_title() {
            clause.push(" AND title LIKE ? ESCAPE '\\'", like_pattern(s));
        }
        if let Some(s) = f.product_name() {
            clause.push(" AND productName LIKE ? ESCAPE '\\'", like_pattern(s));
        }
        if let Some(s) = f.store_name() {
            clause.push(" AND reviewSource LIKE ? ESCAPE '\\'", like_pattern(s));
        }
        if let Some(d) = f.review_date() {
            // Prefix match tolerates a stored time suffix.
            clause.push(
                " AND reviewedDate LIKE ?",
                format!("{}%", d.format(DATE_FORMAT)),
            );
        }
        if let Some(d) = f.start_date() {
            clause.push(
                " AND substr(reviewedDate, 1, 10) >= ?",
                d.format(DATE_FORMAT).to_string(),
            );
        }
        if let Some(d) = f.end_date() {
            clause.push(
                " AND substr(reviewedDate, 1, 10) <= ?",
                d.format(DATE_FORMAT).to_string(),
            );
        }
        // Rows stored without a time suffix pass time predicates.
        if let Some(t) = f.start_time() {
            clause.push(
                " AND (length(reviewedDate) <= 10 OR substr(reviewedDate, 12) >= ?)",
                t.format(TIME_FORMAT).to_string(),
            );
        }
        if let Some(t) = f.end_time() {
            clause.push(
                " AND (length(reviewedDate) <= 10 OR substr(reviewedDate, 12) <= ?)",
                t.format(TIME_FORMAT).to_string(),
            );
        }

        clause
    }

    fn push(&mut self, fragment: &str, param: impl ToSql + 'static) {
        self.sql.push_str(fragment);
        self.params.push(Box::new(param));
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(AsRef::as_ref).collect()
    }
}

/// `ORDER BY` for a sort order. `id` is always the last key so ties fall
/// back to natural order.
const fn order_by(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Natural => " ORDER BY id",
        SortOrder::RatingDesc => " ORDER BY rating DESC, id",
        SortOrder::DateDesc => " ORDER BY reviewedDate DESC, id",
        SortOrder::RatingThenDateDesc => " ORDER BY rating DESC, reviewedDate DESC, id",
    }
}

/// `%value%` with LIKE metacharacters in `value` escaped by `\`.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============================================================================
// Row mapping
// ============================================================================

fn select_reviews(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Review>> {
    let mut stmt = conn
        .prepare(sql)
        .context("Failed to prepare review query")?;
    let rows = stmt
        .query_map(params, review_from_row)
        .context("Failed to execute review query")?;

    let mut results = Vec::new();
    for row in rows {
        if let Some(review) = row.context("Failed to read review row")? {
            results.push(review);
        }
    }
    Ok(results)
}

/// Split a stored `reviewedDate` into its date and optional time.
///
/// The date is the leading 10 characters. The time is whatever follows the
/// separator at position 10; an unparseable time is treated as absent.
fn parse_stored_date(stored: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let date = NaiveDate::parse_from_str(stored.get(..10)?, DATE_FORMAT).ok()?;
    let time = stored.get(11..).filter(|t| !t.is_empty()).and_then(|t| {
        NaiveTime::parse_from_str(t, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .ok()
    });
    Some((date, time))
}

/// Map a row to a review. Rows that no longer form a valid review (bad date,
/// out of range rating) are skipped with a warning.
fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Option<Review>> {
    let id: i64 = row.get(0)?;
    let stored_date: String = row.get(6)?;
    let rating: i64 = row.get(7)?;

    let Some((date, time)) = parse_stored_date(&stored_date) else {
        tracing::warn!(id, %stored_date, "skipping review with unparseable date");
        return Ok(None);
    };

    let built = Review::builder(id, date, rating)
        .text(row.get::<_, Option<String>>(1)?)
        .author(row.get::<_, Option<String>>(2)?)
        .source(row.get::<_, Option<String>>(3)?)
        .title(row.get::<_, Option<String>>(4)?)
        .product_name(row.get::<_, Option<String>>(5)?)
        .reviewed_time(time)
        .build();

    match built {
        Ok(review) => Ok(Some(review)),
        Err(e) => {
            tracing::warn!(id, error = %e, "skipping invalid review row");
            Ok(None)
        }
    }
}
