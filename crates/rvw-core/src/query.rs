//! Matching, ordering and pagination rules shared by every store.
//!
//! The SQLite backend compiles these rules to SQL; the in-memory backend
//! calls them directly. Both must agree on every input, so any change here
//! needs a matching change in `store::sqlite`.

use std::cmp::Ordering;

use chrono::NaiveTime;

use crate::model::{Filters, Review, SortOrder};

/// Case-insensitive substring test with ASCII case folding, the same folding
/// SQLite's `LIKE` applies.
///
/// An absent haystack never matches.
#[must_use]
pub fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| {
        h.to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    })
}

/// Time predicates only apply to reviews that carry a time of day.
fn time_matches(time: Option<NaiveTime>, start: Option<NaiveTime>, end: Option<NaiveTime>) -> bool {
    let Some(time) = time else {
        return true;
    };
    start.is_none_or(|s| time >= s) && end.is_none_or(|e| time <= e)
}

/// Does `review` satisfy every predicate set in `filters`?
#[must_use]
pub fn matches(filters: &Filters, review: &Review) -> bool {
    let rating = review.rating();
    let date = review.reviewed_date();

    filters.rating().is_none_or(|r| rating == r)
        && filters.min_rating().is_none_or(|r| rating >= r)
        && filters.max_rating().is_none_or(|r| rating <= r)
        && filters
            .author_name()
            .is_none_or(|s| contains_ignore_case(review.author(), s))
        && filters
            .review_title()
            .is_none_or(|s| contains_ignore_case(review.title(), s))
        && filters
            .product_name()
            .is_none_or(|s| contains_ignore_case(review.product_name(), s))
        && filters
            .store_name()
            .is_none_or(|s| contains_ignore_case(review.source(), s))
        && filters.review_date().is_none_or(|d| date == d)
        && filters.start_date().is_none_or(|d| date >= d)
        && filters.end_date().is_none_or(|d| date <= d)
        && time_matches(review.reviewed_time(), filters.start_time(), filters.end_time())
}

/// Does `review` contain any keyword in its text or title?
///
/// Blank keywords are ignored; an empty keyword set matches nothing. Other
/// keywords match as given, surrounding whitespace included.
#[must_use]
pub fn matches_any_keyword(keywords: &[String], review: &Review) -> bool {
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| contains_ignore_case(review.text(), k) || contains_ignore_case(review.title(), k))
}

/// Most recent first. A date without a time sorts before the same date with one.
fn cmp_date_desc(a: &Review, b: &Review) -> Ordering {
    (b.reviewed_date(), b.reviewed_time()).cmp(&(a.reviewed_date(), a.reviewed_time()))
}

/// Sort `reviews` in place by `order`.
///
/// The sort is stable, so callers must pass reviews in natural (ascending id)
/// order for ties to resolve the same way as the SQL backend.
pub fn sort_reviews(reviews: &mut [Review], order: SortOrder) {
    match order {
        SortOrder::Natural => {}
        SortOrder::RatingDesc => reviews.sort_by(|a, b| b.rating().cmp(&a.rating())),
        SortOrder::DateDesc => reviews.sort_by(cmp_date_desc),
        SortOrder::RatingThenDateDesc => reviews.sort_by(|a, b| {
            b.rating()
                .cmp(&a.rating())
                .then_with(|| cmp_date_desc(a, b))
        }),
    }
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    offset: u64,
    limit: u64,
}

impl PageWindow {
    /// Resolve `page`/`page_size` to an offset and limit.
    ///
    /// Returns `None` for windows that can never contain rows: a page or page
    /// size below 1, or an offset that overflows.
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Option<Self> {
        if page < 1 || page_size < 1 {
            return None;
        }
        let limit = u64::try_from(page_size).ok()?;
        let offset = u64::try_from(page - 1).ok()?.checked_mul(limit)?;
        // SQLite binds integers as i64.
        i64::try_from(offset).ok()?;
        Some(Self { offset, limit })
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    #[must_use]
    pub const fn limit(self) -> u64 {
        self.limit
    }

    /// Take this window out of an already filtered and sorted sequence.
    #[must_use]
    pub fn slice<T: Clone>(self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let len = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.iter().skip(start).take(len).cloned().collect()
    }
}

/// Number of pages needed to show `total` rows at `page_size` per page.
#[must_use]
pub fn page_count(total: u64, page_size: i64) -> u64 {
    match u64::try_from(page_size) {
        Ok(size) if size > 0 => total.div_ceil(size),
        _ => 0,
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

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case(Some("Jane Smith"), "jane"));
        assert!(contains_ignore_case(Some("Jane Smith"), "SMITH"));
        assert!(!contains_ignore_case(Some("John"), "jane"));
        assert!(!contains_ignore_case(None, "jane"));
    }

    #[test]
    fn test_unset_filters_match_everything() {
        let f = Filters::default();
        assert!(matches(&f, &review(1, 1, "2020-01-01")));
        assert!(matches(&f, &review(2, 5, "2024-12-31")));
    }

    #[test]
    fn test_rating_predicates() {
        let r = review(1, 3, "2023-01-01");
        assert!(matches(&Filters::builder().rating(3).build().unwrap(), &r));
        assert!(!matches(&Filters::builder().rating(4).build().unwrap(), &r));
        assert!(matches(&Filters::builder().min_rating(3).build().unwrap(), &r));
        assert!(!matches(&Filters::builder().min_rating(4).build().unwrap(), &r));
        assert!(matches(&Filters::builder().max_rating(3).build().unwrap(), &r));
        assert!(!matches(&Filters::builder().max_rating(2).build().unwrap(), &r));
    }

    #[test]
    fn test_author_substring() {
        let jane = Review::builder(1, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .author(Some("Jane Smith"))
            .build()
            .unwrap();
        let john = Review::builder(2, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .author(Some("John"))
            .build()
            .unwrap();
        let anon = review(3, 4, "2023-01-01");

        let f = Filters::builder().author_name("jane").build().unwrap();
        assert!(matches(&f, &jane));
        assert!(!matches(&f, &john));
        assert!(!matches(&f, &anon));
    }

    #[test]
    fn test_date_predicates() {
        let r = review(1, 3, "2023-02-15");
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        assert!(matches(&Filters::builder().review_date(d("2023-02-15")).build().unwrap(), &r));
        assert!(!matches(&Filters::builder().review_date(d("2023-02-16")).build().unwrap(), &r));

        let inclusive = Filters::builder()
            .start_date(d("2023-02-15"))
            .end_date(d("2023-02-15"))
            .build()
            .unwrap();
        assert!(matches(&inclusive, &r));

        assert!(!matches(&Filters::builder().start_date(d("2023-02-16")).build().unwrap(), &r));
        assert!(!matches(&Filters::builder().end_date(d("2023-02-14")).build().unwrap(), &r));
    }

    #[test]
    fn test_time_range_skips_reviews_without_time() {
        let untimed = review(1, 3, "2023-02-15");
        let morning = Review::builder(2, NaiveDate::from_ymd_opt(2023, 2, 15).unwrap(), 3)
            .reviewed_time(Some(at(8, 30)))
            .build()
            .unwrap();
        let evening = Review::builder(3, NaiveDate::from_ymd_opt(2023, 2, 15).unwrap(), 3)
            .reviewed_time(Some(at(20, 0)))
            .build()
            .unwrap();

        let f = Filters::builder()
            .start_time(at(9, 0))
            .end_time(at(17, 0))
            .build()
            .unwrap();
        assert!(matches(&f, &untimed));
        assert!(!matches(&f, &morning));
        assert!(!matches(&f, &evening));

        let inclusive = Filters::builder().start_time(at(8, 30)).build().unwrap();
        assert!(matches(&inclusive, &morning));
    }

    #[test]
    fn test_keywords_or_across_text_and_title() {
        let by_text = Review::builder(1, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .text(Some("alpha release"))
            .build()
            .unwrap();
        let by_title = Review::builder(2, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .title(Some("Beta version"))
            .build()
            .unwrap();
        let neither = Review::builder(3, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .text(Some("gamma"))
            .build()
            .unwrap();

        let keywords = vec!["alpha".to_string(), "beta".to_string()];
        assert!(matches_any_keyword(&keywords, &by_text));
        assert!(matches_any_keyword(&keywords, &by_title));
        assert!(!matches_any_keyword(&keywords, &neither));
        assert!(!matches_any_keyword(&[], &by_text));
        assert!(!matches_any_keyword(&["  ".to_string()], &by_text));
    }

    #[test]
    fn test_keywords_keep_surrounding_whitespace() {
        let joined = Review::builder(1, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .text(Some("alphabeta"))
            .build()
            .unwrap();
        let spaced = Review::builder(2, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .text(Some("alpha beta"))
            .build()
            .unwrap();

        let keywords = vec![" beta".to_string()];
        assert!(!matches_any_keyword(&keywords, &joined));
        assert!(matches_any_keyword(&keywords, &spaced));
    }

    #[test]
    fn test_sort_rating_then_date() {
        let mut reviews = vec![
            review(1, 5, "2023-01-01"),
            review(2, 3, "2023-02-01"),
            review(3, 5, "2023-03-01"),
        ];
        sort_reviews(&mut reviews, SortOrder::RatingThenDateDesc);
        let ids: Vec<i64> = reviews.iter().map(Review::id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_ties_keep_input_order() {
        let mut reviews = vec![
            review(1, 4, "2023-01-01"),
            review(2, 4, "2023-01-01"),
            review(3, 4, "2023-01-01"),
        ];
        sort_reviews(&mut reviews, SortOrder::RatingThenDateDesc);
        let ids: Vec<i64> = reviews.iter().map(Review::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_date_desc_untimed_before_timed_same_day() {
        let timed = Review::builder(1, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 4)
            .reviewed_time(Some(at(12, 0)))
            .build()
            .unwrap();
        let untimed = review(2, 4, "2023-01-01");
        let mut reviews = vec![untimed, timed];
        sort_reviews(&mut reviews, SortOrder::DateDesc);
        assert_eq!(reviews[0].id(), 1);
    }

    #[test]
    fn test_page_window() {
        let w = PageWindow::new(2, 10).unwrap();
        assert_eq!(w.offset(), 10);
        assert_eq!(w.limit(), 10);

        assert!(PageWindow::new(0, 10).is_none());
        assert!(PageWindow::new(1, 0).is_none());
        assert!(PageWindow::new(1, -5).is_none());
        assert!(PageWindow::new(i64::MAX, i64::MAX).is_none());
    }

    #[test]
    fn test_page_window_slice() {
        let items: Vec<i32> = (1..=7).collect();
        assert_eq!(PageWindow::new(1, 3).unwrap().slice(&items), vec![1, 2, 3]);
        assert_eq!(PageWindow::new(3, 3).unwrap().slice(&items), vec![7]);
        assert!(PageWindow::new(4, 3).unwrap().slice(&items).is_empty());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(11, 0), 0);
    }
}
