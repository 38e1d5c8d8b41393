//! JSON dumps of crawl output.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use csindex_shared::{CsIndexError, IndexRecord, RawRow, Result};

/// Write raw rows as a pretty-printed array of arrays.
pub fn write_raw_rows(path: &Path, rows: &[RawRow]) -> Result<()> {
    write_pretty(path, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "raw rows saved");
    Ok(())
}

/// Write structured records as a pretty-printed array of keyed objects.
pub fn write_records(path: &Path, records: &[IndexRecord]) -> Result<()> {
    write_pretty(path, &records)?;
    info!(path = %path.display(), records = records.len(), "structured records saved");
    Ok(())
}

/// Load a structured dump written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<IndexRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| CsIndexError::io(path, e))?;
    let records: Vec<IndexRecord> = serde_json::from_str(&content).map_err(|e| {
        CsIndexError::parse(format!("failed to parse {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), records = records.len(), "structured records loaded");
    Ok(records)
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CsIndexError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CsIndexError::Export(format!("{}: {e}", path.display())))?;
    std::fs::write(path, json).map_err(|e| CsIndexError::io(path, e))
}
