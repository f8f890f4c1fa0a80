//! JSON-file persistence collaborators.
//!
//! Each store holds its records in memory behind a `parking_lot::RwLock`
//! and persists the full list to disk with an atomic temp-file + rename
//! write. Good enough for a single-process deployment; the orchestrator
//! only ever talks to these through their CRUD surface.

pub mod documents;
pub mod flashcards;
pub mod sessions;
pub mod users;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a JSON list from `path`, or an empty list if the file is missing
/// or unreadable as the expected shape.
pub(crate) fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&data).unwrap_or_default())
}

/// Persist a JSON list atomically (temp file + rename).
pub(crate) fn persist_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string(items)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Short random identifier with a type prefix, e.g. `sess_a1b2c3d4e5f6`.
pub(crate) fn prefixed_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..12])
}
