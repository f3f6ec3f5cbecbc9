//! Implementation of `rvw import`.

use std::io::Write;

use anyhow::{Context, Result};
use rvw_core::core::ReviewService;

use crate::cli::ImportArgs;
use crate::output::{Formatter, OutputFormat};

/// Load a dump into the store, optionally only when the database is stale.
#[tracing::instrument(skip(service, out))]
pub fn run_import(
    service: &mut ReviewService,
    args: &ImportArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let report = if args.if_stale {
        service.import_if_stale(&args.file)
    } else {
        service.import_file(&args.file).map(Some)
    }
    .with_context(|| format!("Failed to import {}", args.file.display()))?;

    let output = match report {
        Some(report) => serde_json::json!({
            "file": args.file.display().to_string(),
            "imported": report.imported,
            "skipped": report.skipped,
        }),
        None => serde_json::json!({
            "file": args.file.display().to_string(),
            "status": "up-to-date",
        }),
    };
    writeln!(out, "{}", Formatter::new(format).format(&output)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_import_reports_counts() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("dump.ndjson");
        fs::write(
            &file,
            "{\"id\": 1, \"reviewedDate\": \"2023-01-01\", \"rating\": 4}\nnot json\n",
        )
        .unwrap();

        let mut service = ReviewService::in_memory();
        let args = ImportArgs {
            file,
            if_stale: false,
        };
        let mut buf = Vec::new();
        run_import(&mut service, &args, OutputFormat::Json, &mut buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["imported"], 1);
        assert_eq!(parsed["skipped"], 1);
        assert_eq!(service.total_count().unwrap(), 1);
    }

    #[test]
    fn test_import_missing_file_has_context() {
        let dir = tempdir().unwrap();
        let mut service = ReviewService::in_memory();
        let args = ImportArgs {
            file: dir.path().join("missing.json"),
            if_stale: true,
        };
        let mut buf = Vec::new();
        let err = run_import(&mut service, &args, OutputFormat::Text, &mut buf).unwrap_err();
        assert!(err.to_string().starts_with("Failed to import"));
    }
}
