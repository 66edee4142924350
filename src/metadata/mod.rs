//! Audio file tag reading and stripping.
//!
//! Uses the lofty crate for format-independent metadata access. Two stages
//! surround key analysis in an external tool:
//!
//! - before analysis, [`prepare_tags`] strips every tag and writes the file
//!   stem as the only title, so the analyser starts from a clean slate
//! - after analysis, [`read_tags`] and the [`report`] submodule show which
//!   files got a key and mark the rest with the `All - ` prefix

pub mod report;

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::AudioFileRef;

/// Extensions lofty has no writable tag schema for; preparing them is a
/// no-op.
const UNTAGGABLE_EXTENSIONS: &[&str] = &[".wma", ".mid", ".midi", ".pcm", ".3gp", ".amr"];

/// The tag fields the report stage cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Musical key as written by the analyser (`InitialKey`, e.g. `8A`)
    pub key: Option<String>,
}

/// What [`prepare_tags`] does (or would do) to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PrepareAction {
    /// Strip all tags, then write `title` as the only field
    Retitle { title: String },
    /// Strip all tags (WAV: RIFF chunks carry nothing worth rewriting)
    StripOnly,
    /// Format has no writable tags
    Unsupported,
}

/// Read title, artist and key of `path`.
pub fn read_tags(path: &Path) -> Result<TagSummary> {
    let tagged_file = lofty::read_from_path(path).map_err(|e| Error::tag(path, e))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| t.title().map(|s| s.to_string()));
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));

    // The key may live in any of the file's tags
    let key = tagged_file.tags().iter().find_map(key_of);

    Ok(TagSummary { title, artist, key })
}

fn key_of(tag: &Tag) -> Option<String> {
    tag.get_string(&ItemKey::InitialKey)
        .or_else(|| tag.get_string(&ItemKey::Unknown("KEY".to_string())))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Decide the prepare action from the file name alone.
pub fn plan_prepare(file: &AudioFileRef) -> PrepareAction {
    let ext = file.extension();
    if UNTAGGABLE_EXTENSIONS.contains(&ext.as_str()) {
        PrepareAction::Unsupported
    } else if ext == ".wav" {
        PrepareAction::StripOnly
    } else {
        PrepareAction::Retitle { title: file.stem() }
    }
}

/// Strip every tag from `file` and, where the format allows, write the
/// file stem as title.
pub fn prepare_tags(file: &AudioFileRef) -> Result<PrepareAction> {
    let action = plan_prepare(file);
    if action == PrepareAction::Unsupported {
        tracing::debug!(target: "metadata", path = %file.path().display(), "No writable tags, skipped");
        return Ok(action);
    }

    let path = file.path();
    let tagged_file = lofty::read_from_path(path).map_err(|e| Error::tag(path, e))?;
    let primary_type = tagged_file.primary_tag_type();

    for tag in tagged_file.tags() {
        tag.tag_type()
            .remove_from_path(path)
            .map_err(|e| Error::tag(path, format!("removing {:?}: {}", tag.tag_type(), e)))?;
    }

    if let PrepareAction::Retitle { title } = &action {
        let mut tag = Tag::new(primary_type);
        tag.set_title(title.clone());
        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| Error::tag(path, format!("writing title: {}", e)))?;
    }

    tracing::info!(target: "metadata", path = %path.display(), action = ?action, "Prepared tags");
    Ok(action)
}
