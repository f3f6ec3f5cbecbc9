//! Value types for reviews and filter criteria.
//!
//! Both types are immutable once built. Construction goes through a builder
//! whose `build()` validates every field and either returns the finished
//! value or a [`ValidationError`].

mod filters;

pub use filters::{Filters, FiltersBuilder, SortOrder};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

use crate::core::ValidationError;

/// Lowest valid star rating.
pub const MIN_RATING: u8 = 1;
/// Highest valid star rating.
pub const MAX_RATING: u8 = 5;

/// Format of the date portion of a stored review date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of the optional time suffix of a stored review date.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Earliest year a stored date can carry.
pub const MIN_YEAR: i32 = 0;
/// Latest year a stored date can carry.
pub const MAX_YEAR: i32 = 9999;

/// Dates are stored as fixed-width `YYYY-MM-DD` text, so the year must fit in
/// four unsigned digits.
pub(crate) fn validate_date(field: &'static str, date: NaiveDate) -> Result<(), ValidationError> {
    let year = date.year();
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::YearOutOfRange { field, year })
    }
}

/// Check that `value` is a valid rating and narrow it.
pub(crate) fn validate_rating(field: &'static str, value: i64) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or(ValidationError::RatingOutOfRange { field, value })
}

/// Drop sub-second precision so stored and in-memory times compare equal.
pub(crate) fn truncate_time(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// A single product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_name: Option<String>,
    reviewed_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewed_time: Option<NaiveTime>,
    rating: u8,
}

impl Review {
    /// Start building a review from its required fields.
    ///
    /// The rating is validated by [`ReviewBuilder::build`].
    #[must_use]
    pub const fn builder(id: i64, reviewed_date: NaiveDate, rating: i64) -> ReviewBuilder {
        ReviewBuilder {
            id,
            reviewed_date,
            rating,
            text: None,
            author: None,
            source: None,
            title: None,
            product_name: None,
            reviewed_time: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// The store or site the review was collected from.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    #[must_use]
    pub const fn reviewed_date(&self) -> NaiveDate {
        self.reviewed_date
    }

    /// Time of day the review was posted, when the dump carried one.
    #[must_use]
    pub const fn reviewed_time(&self) -> Option<NaiveTime> {
        self.reviewed_time
    }

    #[must_use]
    pub const fn rating(&self) -> u8 {
        self.rating
    }

    /// The review date as stored: `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS`
    /// when a time of day is known.
    #[must_use]
    pub fn stored_date(&self) -> String {
        let date = self.reviewed_date.format(DATE_FORMAT);
        match self.reviewed_time {
            Some(time) => format!("{date}T{}", time.format(TIME_FORMAT)),
            None => date.to_string(),
        }
    }
}

/// Builder for [`Review`]. Consumed by `build()`.
#[derive(Debug, Clone)]
#[must_use]
pub struct ReviewBuilder {
    id: i64,
    reviewed_date: NaiveDate,
    rating: i64,
    text: Option<String>,
    author: Option<String>,
    source: Option<String>,
    title: Option<String>,
    product_name: Option<String>,
    reviewed_time: Option<NaiveTime>,
}

impl ReviewBuilder {
    pub fn text(mut self, text: Option<impl Into<String>>) -> Self {
        self.text = text.map(Into::into);
        self
    }

    pub fn author(mut self, author: Option<impl Into<String>>) -> Self {
        self.author = author.map(Into::into);
        self
    }

    pub fn source(mut self, source: Option<impl Into<String>>) -> Self {
        self.source = source.map(Into::into);
        self
    }

    pub fn title(mut self, title: Option<impl Into<String>>) -> Self {
        self.title = title.map(Into::into);
        self
    }

    pub fn product_name(mut self, product_name: Option<impl Into<String>>) -> Self {
        self.product_name = product_name.map(Into::into);
        self
    }

    /// Sub-second precision is dropped.
    pub fn reviewed_time(mut self, time: Option<NaiveTime>) -> Self {
        self.reviewed_time = time.map(truncate_time);
        self
    }

    /// Validate and produce the review.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RatingOutOfRange`] if the rating is not in 1..=5
    /// and [`ValidationError::YearOutOfRange`] if the date's year is not in
    /// 0..=9999.
    pub fn build(self) -> Result<Review, ValidationError> {
        let rating = validate_rating("rating", self.rating)?;
        validate_date("reviewed_date", self.reviewed_date)?;
        Ok(Review {
            id: self.id,
            text: self.text,
            author: self.author,
            source: self.source,
            title: self.title,
            product_name: self.product_name,
            reviewed_date: self.reviewed_date,
            reviewed_time: self.reviewed_time,
            rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_build_minimal_review() {
        let review = Review::builder(7, date("2023-04-01"), 4).build().unwrap();
        assert_eq!(review.id(), 7);
        assert_eq!(review.rating(), 4);
        assert!(review.author().is_none());
        assert!(review.reviewed_time().is_none());
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        for bad in [0, 6, -1, 300] {
            let err = Review::builder(1, date("2023-04-01"), bad).build().unwrap_err();
            assert_eq!(
                err,
                ValidationError::RatingOutOfRange {
                    field: "rating",
                    value: bad
                }
            );
        }
    }

    #[test]
    fn test_year_outside_four_digits_rejected() {
        for year in [MIN_YEAR, MAX_YEAR] {
            let edge = NaiveDate::from_ymd_opt(year, 6, 1).unwrap();
            let review = Review::builder(1, edge, 3).build().unwrap();
            assert_eq!(review.stored_date().len(), 10);
        }

        for year in [-1, 10_000] {
            let bad = NaiveDate::from_ymd_opt(year, 6, 1).unwrap();
            let err = Review::builder(1, bad, 3).build().unwrap_err();
            assert_eq!(
                err,
                ValidationError::YearOutOfRange {
                    field: "reviewed_date",
                    year
                }
            );
        }
    }

    #[test]
    fn test_stored_date_without_time() {
        let review = Review::builder(1, date("2023-04-01"), 3).build().unwrap();
        assert_eq!(review.stored_date(), "2023-04-01");
    }

    #[test]
    fn test_stored_date_with_time_drops_fraction() {
        let time = NaiveTime::from_hms_milli_opt(9, 5, 30, 250).unwrap();
        let review = Review::builder(1, date("2023-04-01"), 3)
            .reviewed_time(Some(time))
            .build()
            .unwrap();
        assert_eq!(review.stored_date(), "2023-04-01T09:05:30");
        assert_eq!(
            review.reviewed_time(),
            NaiveTime::from_hms_opt(9, 5, 30)
        );
    }

    #[test]
    fn test_optional_fields() {
        let review = Review::builder(2, date("2023-04-01"), 5)
            .author(Some("Jane Smith"))
            .title(Some("Great"))
            .source(Some("Google Play"))
            .product_name(Some("Widget"))
            .text(Some("Works well"))
            .build()
            .unwrap();
        assert_eq!(review.author(), Some("Jane Smith"));
        assert_eq!(review.title(), Some("Great"));
        assert_eq!(review.source(), Some("Google Play"));
        assert_eq!(review.product_name(), Some("Widget"));
        assert_eq!(review.text(), Some("Works well"));
    }
}
