//! Filter criteria for review queries.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::{truncate_time, validate_date, validate_rating, DATE_FORMAT, TIME_FORMAT};
use crate::core::ValidationError;

/// How matching reviews are ordered, derived from the two sort flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Storage order (ascending id).
    Natural,
    /// Highest rating first.
    RatingDesc,
    /// Most recent first.
    DateDesc,
    /// Highest rating first, most recent first within a rating.
    RatingThenDateDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn from_flags(sort_by_date: bool, sort_by_rating: bool) -> Self {
        match (sort_by_date, sort_by_rating) {
            (true, true) => Self::RatingThenDateDesc,
            (false, true) => Self::RatingDesc,
            (true, false) => Self::DateDesc,
            (false, false) => Self::Natural,
        }
    }
}

/// Immutable selection and ordering criteria.
///
/// Every field is optional; an unset field places no constraint.
/// `Filters::default()` matches every review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    rating: Option<u8>,
    min_rating: Option<u8>,
    max_rating: Option<u8>,
    author_name: Option<String>,
    review_title: Option<String>,
    product_name: Option<String>,
    store_name: Option<String>,
    review_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    sort_by_date: bool,
    sort_by_rating: bool,
}

impl Filters {
    #[must_use]
    pub fn builder() -> FiltersBuilder {
        FiltersBuilder::default()
    }

    #[must_use]
    pub const fn rating(&self) -> Option<u8> {
        self.rating
    }

    #[must_use]
    pub const fn min_rating(&self) -> Option<u8> {
        self.min_rating
    }

    #[must_use]
    pub const fn max_rating(&self) -> Option<u8> {
        self.max_rating
    }

    #[must_use]
    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    #[must_use]
    pub fn review_title(&self) -> Option<&str> {
        self.review_title.as_deref()
    }

    #[must_use]
    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    #[must_use]
    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    #[must_use]
    pub const fn review_date(&self) -> Option<NaiveDate> {
        self.review_date
    }

    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    #[must_use]
    pub const fn start_time(&self) -> Option<NaiveTime> {
        self.start_time
    }

    #[must_use]
    pub const fn end_time(&self) -> Option<NaiveTime> {
        self.end_time
    }

    #[must_use]
    pub const fn sort_by_date(&self) -> bool {
        self.sort_by_date
    }

    #[must_use]
    pub const fn sort_by_rating(&self) -> bool {
        self.sort_by_rating
    }

    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        SortOrder::from_flags(self.sort_by_date, self.sort_by_rating)
    }

    /// True when no predicate is set (sort flags are ignored).
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.rating.is_none()
            && self.min_rating.is_none()
            && self.max_rating.is_none()
            && self.author_name.is_none()
            && self.review_title.is_none()
            && self.product_name.is_none()
            && self.store_name.is_none()
            && self.review_date.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    /// Start a builder pre-populated with this value's fields.
    #[must_use]
    pub fn to_builder(&self) -> FiltersBuilder {
        FiltersBuilder {
            inner: self.clone(),
        }
    }
}

/// Builder for [`Filters`]. Consumed by `build()`.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct FiltersBuilder {
    inner: Filters,
}

/// Empty substrings match everything, so they are stored as unset.
fn non_empty(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|s| !s.is_empty())
}

impl FiltersBuilder {
    pub fn rating(mut self, rating: impl Into<Option<u8>>) -> Self {
        self.inner.rating = rating.into();
        self
    }

    pub fn min_rating(mut self, rating: impl Into<Option<u8>>) -> Self {
        self.inner.min_rating = rating.into();
        self
    }

    pub fn max_rating(mut self, rating: impl Into<Option<u8>>) -> Self {
        self.inner.max_rating = rating.into();
        self
    }

    pub fn author_name(mut self, author: impl Into<String>) -> Self {
        self.inner.author_name = non_empty(author);
        self
    }

    pub fn review_title(mut self, title: impl Into<String>) -> Self {
        self.inner.review_title = non_empty(title);
        self
    }

    pub fn product_name(mut self, product: impl Into<String>) -> Self {
        self.inner.product_name = non_empty(product);
        self
    }

    pub fn store_name(mut self, store: impl Into<String>) -> Self {
        self.inner.store_name = non_empty(store);
        self
    }

    pub fn review_date(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.inner.review_date = date.into();
        self
    }

    pub fn start_date(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.inner.start_date = date.into();
        self
    }

    pub fn end_date(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.inner.end_date = date.into();
        self
    }

    /// Sub-second precision is dropped.
    pub fn start_time(mut self, time: impl Into<Option<NaiveTime>>) -> Self {
        self.inner.start_time = time.into().map(truncate_time);
        self
    }

    /// Sub-second precision is dropped.
    pub fn end_time(mut self, time: impl Into<Option<NaiveTime>>) -> Self {
        self.inner.end_time = time.into().map(truncate_time);
        self
    }

    pub fn sort_by_date(mut self, enabled: bool) -> Self {
        self.inner.sort_by_date = enabled;
        self
    }

    pub fn sort_by_rating(mut self, enabled: bool) -> Self {
        self.inner.sort_by_rating = enabled;
        self
    }

    /// Validate and produce the filters.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a rating is outside 1..=5 or a
    /// min/max, date or time range is inverted, or a date falls outside years
    /// 0..=9999.
    pub fn build(self) -> Result<Filters, ValidationError> {
        let f = self.inner;

        for (field, value) in [
            ("review_date", f.review_date),
            ("start_date", f.start_date),
            ("end_date", f.end_date),
        ] {
            if let Some(d) = value {
                validate_date(field, d)?;
            }
        }

        for (field, value) in [
            ("rating", f.rating),
            ("min_rating", f.min_rating),
            ("max_rating", f.max_rating),
        ] {
            if let Some(v) = value {
                validate_rating(field, i64::from(v))?;
            }
        }

        if let (Some(min), Some(max)) = (f.min_rating, f.max_rating) {
            if min > max {
                return Err(ValidationError::RatingRangeInverted { min, max });
            }
        }
        if let (Some(start), Some(end)) = (f.start_date, f.end_date) {
            if start > end {
                return Err(ValidationError::DateRangeInverted {
                    start: start.format(DATE_FORMAT).to_string(),
                    end: end.format(DATE_FORMAT).to_string(),
                });
            }
        }
        if let (Some(start), Some(end)) = (f.start_time, f.end_time) {
            if start > end {
                return Err(ValidationError::TimeRangeInverted {
                    start: start.format(TIME_FORMAT).to_string(),
                    end: end.format(TIME_FORMAT).to_string(),
                });
            }
        }

        Ok(f)
    }
}
