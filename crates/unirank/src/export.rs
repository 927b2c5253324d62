//! CSV export of the current view.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::record::RankingEntry;

/// File name every export is written under.
pub const EXPORT_FILE_NAME: &str = "university_rankings.csv";

const HEADER: &str = "rank,university,country,score";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Serialize `view` as CSV, in view order.
///
/// Returns `None` for an empty view; there is nothing to export.
#[must_use]
pub fn export_csv(view: &[RankingEntry]) -> Option<Vec<u8>> {
    if view.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(HEADER.len() + view.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for entry in view {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            entry.rank,
            quote(&entry.university),
            quote(&entry.country),
            entry.score_text()
        );
    }
    Some(out.into_bytes())
}

/// Write the export for `view` into `directory`, creating it if needed.
///
/// Returns the written path, or `None` when the view is empty and nothing was
/// written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn write_export(directory: &Path, view: &[RankingEntry]) -> Result<Option<PathBuf>> {
    let Some(bytes) = export_csv(view) else {
        return Ok(None);
    };

    std::fs::create_dir_all(directory).map_err(|source| Error::DirectoryCreate {
        path: directory.to_path_buf(),
        source,
    })?;
    let path = directory.join(EXPORT_FILE_NAME);
    std::fs::write(&path, bytes)?;
    info!("Exported {} rows to {}", view.len(), path.display());
    Ok(Some(path))
}
