//! Deciding whether a database needs to be reloaded from its dump.

use std::fs;
use std::io;
use std::path::Path;

/// True when `db_path` is missing or older than `source_path`.
///
/// # Errors
///
/// Fails when the source dump itself cannot be read.
pub fn needs_reload(source_path: &Path, db_path: &Path) -> io::Result<bool> {
    let source_modified = fs::metadata(source_path)?.modified()?;
    let db_modified = match fs::metadata(db_path) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    Ok(db_modified < source_modified)
}
