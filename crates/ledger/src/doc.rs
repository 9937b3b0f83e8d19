use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use common::{Error, Result};

/// Read a whole JSON document. A missing file yields the default; a corrupt
/// file is logged and replaced by the default on the next write.
pub fn load_document<T: DeserializeOwned>(path: &Path, default: impl FnOnce() -> T) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Corrupt store document; starting fresh");
            default()
        }),
        Err(_) => default(),
    }
}

/// Write a whole JSON document. A failed write is a persistence error,
/// fatal to the run in progress, never swallowed.
pub fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Persistence(format!("{}: {e}", path.display())))?;
    std::fs::write(path, content)
        .map_err(|e| Error::Persistence(format!("{}: {e}", path.display())))
}
