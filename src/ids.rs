//! Template identifier intake
//!
//! Identifiers arrive either as command-line arguments or as a file with one
//! identifier per line. Every identifier is parsed before the store is touched,
//! then each one is checked for existence.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{TemplateId, TemplateStore};

/// Read raw identifiers from a newline-delimited file
///
/// Lines are trimmed and blank lines are skipped.
pub fn read_id_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(split_id_lines(&content))
}

/// Split file content into trimmed, non-empty identifier strings
pub fn split_id_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse raw identifiers, failing on the first malformed one
pub fn parse_ids<S: AsRef<str>>(raw: &[S]) -> Result<Vec<TemplateId>> {
    raw.iter().map(|s| s.as_ref().parse()).collect()
}

/// Confirm every identifier exists in the store
pub fn verify_ids(store: &dyn TemplateStore, ids: &[TemplateId]) -> Result<()> {
    for id in ids {
        if !store.contains(id)? {
            return Err(Error::RecordNotFound(id.clone()));
        }
        debug!(%id, "template id verified");
    }
    Ok(())
}
