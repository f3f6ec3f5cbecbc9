//! Store configuration resolution.
//!
//! Each setting resolves in order: explicit flag, environment variable,
//! built-in default.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use rvw_core::core::StoreConfig;
use rvw_core::store::{parse_backend, StoreBackend};

/// Environment variable holding the database path.
pub const DB_VAR: &str = "RVW_DB";
/// Environment variable holding the backend name.
pub const BACKEND_VAR: &str = "RVW_BACKEND";
/// Database used when nothing else is configured.
pub const DEFAULT_DB: &str = "reviews.db";

/// Resolve the store configuration from flags and the process environment.
pub fn resolve_store_config(
    backend: Option<StoreBackend>,
    db: Option<PathBuf>,
) -> Result<StoreConfig> {
    let backend = resolve_backend(backend, env::var(BACKEND_VAR).ok())?;
    let db_path = resolve_db_path(db, env::var(DB_VAR).ok());
    tracing::debug!(backend = backend.as_str(), db = %db_path.display(), "resolved store config");
    Ok(StoreConfig::new(backend, &db_path))
}

fn resolve_backend(explicit: Option<StoreBackend>, from_env: Option<String>) -> Result<StoreBackend> {
    if let Some(backend) = explicit {
        return Ok(backend);
    }
    match from_env.filter(|v| !v.trim().is_empty()) {
        None => Ok(StoreBackend::default()),
        Some(value) => match parse_backend(&value) {
            Some(backend) => Ok(backend),
            None => bail!(
                "Unknown backend in {BACKEND_VAR}: '{value}'\n  To fix: set {BACKEND_VAR}=sqlite or {BACKEND_VAR}=memory"
            ),
        },
    }
}

fn resolve_db_path(explicit: Option<PathBuf>, from_env: Option<String>) -> PathBuf {
    explicit
        .or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_backend_wins() {
        let backend = resolve_backend(Some(StoreBackend::Memory), Some("sqlite".into())).unwrap();
        assert_eq!(backend, StoreBackend::Memory);
    }

    #[test]
    fn test_backend_from_env() {
        let backend = resolve_backend(None, Some("MEMORY".into())).unwrap();
        assert_eq!(backend, StoreBackend::Memory);
        assert_eq!(resolve_backend(None, Some(String::new())).unwrap(), StoreBackend::Sqlite);
        assert_eq!(resolve_backend(None, None).unwrap(), StoreBackend::Sqlite);
    }

    #[test]
    fn test_unknown_backend_env_is_error() {
        let err = resolve_backend(None, Some("postgres".into())).unwrap_err();
        assert!(err.to_string().contains("To fix"));
    }

    #[test]
    fn test_db_path_priority() {
        assert_eq!(
            resolve_db_path(Some(PathBuf::from("a.db")), Some("b.db".into())),
            PathBuf::from("a.db")
        );
        assert_eq!(resolve_db_path(None, Some("b.db".into())), PathBuf::from("b.db"));
        assert_eq!(resolve_db_path(None, None), PathBuf::from(DEFAULT_DB));
    }
}
