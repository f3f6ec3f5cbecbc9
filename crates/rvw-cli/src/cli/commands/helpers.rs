//! Shared helpers for CLI commands.

use anyhow::{Context, Result};
use rvw_core::core::{ReviewService, StoreConfig};
use rvw_core::model::Filters;

use crate::cli::FilterArgs;

/// Open the configured store.
pub fn open_service(config: &StoreConfig) -> Result<ReviewService> {
    ReviewService::open(config.clone()).with_context(|| {
        format!(
            "Failed to open review database at {}\n  To fix: pass --db <path> or set RVW_DB",
            config.db_path().display()
        )
    })
}

/// Build validated [`Filters`] from the shared filter flags.
pub fn build_filters(args: &FilterArgs) -> Result<Filters> {
    let mut builder = Filters::builder()
        .rating(args.rating)
        .min_rating(args.min_rating)
        .max_rating(args.max_rating)
        .review_date(args.date)
        .start_date(args.from)
        .end_date(args.to)
        .start_time(args.from_time)
        .end_time(args.to_time)
        .sort_by_date(args.sort_date)
        .sort_by_rating(args.sort_rating);
    if let Some(author) = &args.author {
        builder = builder.author_name(author.as_str());
    }
    if let Some(title) = &args.title {
        builder = builder.review_title(title.as_str());
    }
    if let Some(product) = &args.product {
        builder = builder.product_name(product.as_str());
    }
    if let Some(store) = &args.store {
        builder = builder.store_name(store.as_str());
    }
    builder.build().context("Invalid filter")
}

/// Create a "review not found" error.
pub fn review_not_found_error(id: i64) -> anyhow::Error {
    anyhow::anyhow!("Review not found: {id}\n  To fix: rvw list  (or rvw search <keyword>)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rvw_core::model::SortOrder;

    #[test]
    fn test_build_filters_maps_every_flag() {
        let args = FilterArgs {
            min_rating: Some(3),
            author: Some("jane".to_string()),
            store: Some("web".to_string()),
            from: NaiveDate::from_ymd_opt(2023, 1, 1),
            sort_rating: true,
            ..FilterArgs::default()
        };
        let filters = build_filters(&args).unwrap();
        assert_eq!(filters.min_rating(), Some(3));
        assert_eq!(filters.author_name(), Some("jane"));
        assert_eq!(filters.store_name(), Some("web"));
        assert_eq!(filters.start_date(), NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(filters.sort_order(), SortOrder::RatingDesc);
    }

    #[test]
    fn test_no_flags_is_unconstrained() {
        let filters = build_filters(&FilterArgs::default()).unwrap();
        assert!(filters.is_unconstrained());
    }

    #[test]
    fn test_invalid_filter_reports_reason() {
        let args = FilterArgs {
            min_rating: Some(5),
            max_rating: Some(2),
            ..FilterArgs::default()
        };
        let err = build_filters(&args).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid filter"));
    }

    #[test]
    fn test_not_found_error_has_hint() {
        let err = review_not_found_error(42);
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("To fix"));
    }
}
