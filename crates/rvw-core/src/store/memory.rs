//! In-process review store for tests and demos.

use std::collections::BTreeMap;

use crate::core::CoreResult;
use crate::model::{Filters, Review};
use crate::query::{matches, matches_any_keyword, sort_reviews, PageWindow};

use super::{ReviewStats, ReviewStore};

/// Reviews held in a map keyed by id.
///
/// Iteration order is ascending id, which is also the natural order of the
/// SQLite table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    reviews: BTreeMap<i64, Review>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `reviews` (later duplicates win).
    #[must_use]
    pub fn with_reviews(reviews: impl IntoIterator<Item = Review>) -> Self {
        Self {
            reviews: reviews.into_iter().map(|r| (r.id(), r)).collect(),
        }
    }

    fn filtered<'a>(&'a self, filters: Option<&'a Filters>) -> impl Iterator<Item = &'a Review> {
        self.reviews
            .values()
            .filter(move |r| filters.is_none_or(|f| matches(f, r)))
    }
}

impl ReviewStore for MemoryStore {
    fn query(
        &self,
        filters: Option<&Filters>,
        page: i64,
        page_size: i64,
    ) -> CoreResult<Vec<Review>> {
        let Some(window) = PageWindow::new(page, page_size) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<Review> = self.filtered(filters).cloned().collect();
        if let Some(f) = filters {
            sort_reviews(&mut selected, f.sort_order());
        }
        Ok(window.slice(&selected))
    }

    fn count(&self, filters: Option<&Filters>) -> CoreResult<u64> {
        Ok(self.filtered(filters).count() as u64)
    }

    fn get_by_id(&self, id: i64) -> CoreResult<Option<Review>> {
        Ok(self.reviews.get(&id).cloned())
    }

    fn get_by_keywords(&self, keywords: &[String]) -> CoreResult<Vec<Review>> {
        Ok(self
            .reviews
            .values()
            .filter(|r| matches_any_keyword(keywords, r))
            .cloned()
            .collect())
    }

    fn save(&mut self, reviews: &[Review]) -> CoreResult<()> {
        for review in reviews {
            self.reviews.insert(review.id(), review.clone());
        }
        Ok(())
    }

    fn stats(&self, filters: Option<&Filters>) -> CoreResult<ReviewStats> {
        let mut ratings: BTreeMap<u8, u64> = BTreeMap::new();
        let mut sources: BTreeMap<Option<String>, u64> = BTreeMap::new();
        for review in self.filtered(filters) {
            *ratings.entry(review.rating()).or_insert(0) += 1;
            *sources
                .entry(review.source().map(str::to_string))
                .or_insert(0) += 1;
        }
        Ok(ReviewStats::from_counts(ratings, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn review(id: i64, rating: i64, date: &str) -> Review {
        Review::builder(
            id,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            rating,
        )
        .build()
        .unwrap()
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::with_reviews([
            review(1, 5, "2023-01-01"),
            review(2, 3, "2023-02-01"),
            review(3, 5, "2023-03-01"),
        ])
    }

    #[test]
    fn test_query_min_rating_sorted() {
        let store = sample_store();
        let f = Filters::builder()
            .min_rating(4)
            .sort_by_rating(true)
            .sort_by_date(true)
            .build()
            .unwrap();
        let ids: Vec<i64> = store
            .query(Some(&f), 1, 10)
            .unwrap()
            .iter()
            .map(Review::id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_none_filters_equal_default_filters() {
        let store = sample_store();
        let all = store.query(None, 1, 10).unwrap();
        let defaults = store.query(Some(&Filters::default()), 1, 10).unwrap();
        assert_eq!(all, defaults);
        assert_eq!(all.len(), 3);
        assert_eq!(store.count(None).unwrap(), 3);
    }

    #[test]
    fn test_pages_beyond_end_and_bad_sizes_are_empty() {
        let store = sample_store();
        assert!(store.query(None, 2, 10).unwrap().is_empty());
        assert!(store.query(None, 1, 0).unwrap().is_empty());
        assert!(store.query(None, 1, -1).unwrap().is_empty());
        assert!(store.query(None, 0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_get_page_natural_order() {
        let store = sample_store();
        let page: Vec<i64> = store.get_page(2, 2).unwrap().iter().map(Review::id).collect();
        assert_eq!(page, vec![3]);
        assert_eq!(store.total_count().unwrap(), 3);
    }

    #[test]
    fn test_save_replaces_by_id() {
        let mut store = sample_store();
        let replacement = review(2, 1, "2024-01-01");
        store.save(std::slice::from_ref(&replacement)).unwrap();
        assert_eq!(store.get_by_id(2).unwrap(), Some(replacement));
        assert_eq!(store.total_count().unwrap(), 3);
        assert!(store.get_by_id(99).unwrap().is_none());
    }

    #[test]
    fn test_keywords_empty_list() {
        let store = sample_store();
        assert!(store.get_by_keywords(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let store = sample_store();
        let stats = store.stats(None).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.rating_histogram[&5], 2);
        assert_eq!(stats.by_source.len(), 1);
        assert_eq!(stats.by_source[0].count, 3);
    }
}
