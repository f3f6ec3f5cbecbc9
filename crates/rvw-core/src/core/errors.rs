//! Typed error types for rvw-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A value object was constructed with invalid fields.
///
/// Raised synchronously by the `Review` and `Filters` builders; an evaluator
/// never sees an invalid value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A rating field is outside 1..=5.
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },

    /// A date outside years 0000..=9999 has no fixed-width stored form.
    #[error("{field} year must be between 0 and 9999, got {year}")]
    YearOutOfRange { field: &'static str, year: i32 },

    #[error("min rating {min} is greater than max rating {max}")]
    RatingRangeInverted { min: u8, max: u8 },

    #[error("start date {start} is after end date {end}")]
    DateRangeInverted { start: String, end: String },

    #[error("start time {start} is after end time {end}")]
    TimeRangeInverted { start: String, end: String },
}

/// Errors that can occur in rvw-core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid review or filter construction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any failure talking to the backing store.
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),

    /// The review dump could not be parsed.
    #[error("Failed to ingest {source_name}: {message}")]
    Ingest {
        source_name: String,
        message: String,
    },

    /// A review was not found.
    #[error("Review not found: {id}")]
    ReviewNotFound { id: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
