//! Post-analysis tag report.
//!
//! Lists title, artist and key per file and flags files whose name lacks a
//! strict key label (`8A - ...`). With renaming enabled such files get the
//! `All - ` marker, which the classifier reads as "no key".

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::classifier::{ALL_MARKER, is_key_labelled};
use crate::error::Result;
use crate::model::AudioFileRef;
use crate::organizer::Relocator;

use super::{TagSummary, read_tags};

/// Separator between the marker and the original name.
const MARKER_SEPARATOR: &str = " - ";

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    /// Name carries a strict key label
    pub labelled: bool,
    /// New location after an `All - ` rename
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<PathBuf>,
    #[serde(flatten)]
    pub tags: TagSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether the name already starts with the `All` marker.
fn is_marked(file_name: &str) -> bool {
    file_name.starts_with(&format!("{}{}", ALL_MARKER, MARKER_SEPARATOR))
}

/// Rename an unlabelled file to `All - <name>` in its own directory.
///
/// Returns `None` for labelled or already marked files. The new name never
/// overwrites an existing one.
pub fn mark_unlabeled(file: &AudioFileRef, relocator: &Relocator) -> Result<Option<AudioFileRef>> {
    let name = file.file_name();
    if is_key_labelled(&name) || is_marked(&name) {
        return Ok(None);
    }
    let Some(dir) = file.path().parent() else {
        return Ok(None);
    };

    let mut marked = OsString::from(format!("{}{}", ALL_MARKER, MARKER_SEPARATOR));
    marked.push(file.raw_file_name());
    let dest = relocator.rename_into(file.path(), dir, &marked)?;
    tracing::info!(target: "metadata", from = %file.path().display(), to = %dest.display(), "Marked as unlabeled");
    Ok(Some(file.with_path(dest)))
}

/// Build report rows for `files`, optionally marking unlabelled ones.
///
/// Read and rename failures are recorded on the row; they never stop the
/// report.
pub fn build(files: &[AudioFileRef], rename: bool) -> Vec<ReportEntry> {
    let relocator = Relocator::new();
    files
        .iter()
        .map(|file| {
            let labelled = is_key_labelled(&file.file_name());
            let mut entry = ReportEntry {
                path: file.path().to_path_buf(),
                labelled,
                renamed_to: None,
                tags: TagSummary::default(),
                error: None,
            };

            match read_tags(file.path()) {
                Ok(tags) => entry.tags = tags,
                Err(e) => entry.error = Some(e.to_string()),
            }

            if rename && !labelled {
                match mark_unlabeled(file, &relocator) {
                    Ok(moved) => entry.renamed_to = moved.map(|m| m.path().to_path_buf()),
                    Err(e) => {
                        tracing::warn!(target: "metadata", path = %file.path().display(), error = %e, "Rename failed");
                        entry.error = Some(e.to_string());
                    }
                }
            }
            entry
        })
        .collect()
}
