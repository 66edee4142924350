//! Source-tree discovery.
//!
//! Walks a traversal root and collects audio files, parents before children
//! and siblings sorted by name. Output directories are pruned as whole
//! subtrees, so files moved or written there are never picked up again by a
//! later pass over the same root.

use std::path::Path;

use walkdir::WalkDir;

use crate::model::{AudioFileRef, OutputDirs};

/// Recognized audio extensions (lower-case, with dot).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    ".wav",  // Waveform Audio File
    ".mp3",  // MPEG Layer-3
    ".aiff", // Audio Interchange File Format
    ".aif",  // Short for AIFF
    ".m4a",  // MPEG-4 Audio
    ".flac", // Free Lossless Audio Codec
    ".ogg",  // Ogg Vorbis
    ".wma",  // Windows Media Audio
    ".aac",  // Advanced Audio Coding
    ".alac", // Apple Lossless Audio Codec
    ".opus", // Opus Audio Format
    ".wv",   // WavPack
    ".ape",  // Monkey's Audio
    ".mid",  // MIDI files
    ".midi", // MIDI files
    ".pcm",  // Raw PCM audio
    ".3gp",  // 3GPP audio container
    ".amr",  // Adaptive Multi-Rate audio
];

/// Check if a path has an audio file extension (case-insensitive)
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

/// Collect every audio file under `root`, skipping the output directories.
///
/// Unreadable entries are logged and skipped.
pub fn discover(root: &Path, excluded: &OutputDirs) -> Vec<AudioFileRef> {
    walk(root, |path| excluded.contains(path))
}

/// Collect every audio file under `root`, output directories included.
///
/// Used by the tag stages, which treat the whole library alike.
pub fn discover_all(root: &Path) -> Vec<AudioFileRef> {
    walk(root, |_| false)
}

fn walk<F>(root: &Path, prune: F) -> Vec<AudioFileRef>
where
    F: Fn(&Path) -> bool,
{
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !prune(entry.path()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(target: "scanner", error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(AudioFileRef::new(entry.path()));
        }
    }

    tracing::info!(target: "scanner", root = %root.display(), count = files.len(), "Discovered audio files");
    files
}
