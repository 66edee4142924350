//! Core data types for the sorting engine.
//!
//! - [`AudioFileRef`]: a discovered file, captured once per traversal
//! - [`ProbedDuration`]: a probe result with an explicit `Unknown` state
//! - [`CamelotKey`]: the key label carried by a filename prefix
//! - [`Category`]: where a processed file ended up
//! - [`OutputDirs`]: the three output directories under a traversal root

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::config::OutputConfig;
use crate::error::{Result, ResultExt};

/// A file discovered during one traversal pass.
///
/// The value never changes; moving the file produces a new one via
/// [`AudioFileRef::with_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioFileRef {
    path: PathBuf,
}

impl AudioFileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base file name, e.g. `7A - Intro.wav`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Base file name exactly as stored on disk. New names are derived from
    /// this so bytes that are not valid UTF-8 survive a move.
    pub fn raw_file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    pub fn raw_stem(&self) -> &OsStr {
        self.path.file_stem().unwrap_or_default()
    }

    /// Extension including the dot with its original case and bytes, empty
    /// if none.
    pub fn raw_suffix(&self) -> OsString {
        let mut suffix = OsString::new();
        if let Some(ext) = self.path.extension() {
            suffix.push(".");
            suffix.push(ext);
        }
        suffix
    }

    /// Lower-cased extension including the dot (`.wav`), empty if none.
    pub fn extension(&self) -> String {
        self.raw_suffix().to_string_lossy().to_lowercase()
    }

    /// The same file at a new location.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for AudioFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Play duration of a file, or `Unknown` when probing failed.
///
/// `Unknown` is never a one-shot and never over-length: such files are left
/// where they are for manual handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbedDuration {
    Known(Duration),
    Unknown,
}

impl ProbedDuration {
    /// Collapse a probe result, logging the failure.
    pub fn from_probe(path: &Path, result: Result<Duration>) -> Self {
        match result {
            Ok(d) => ProbedDuration::Known(d),
            Err(e) => {
                tracing::warn!(target: "codec::probe", path = %path.display(), error = %e, "Duration unknown");
                ProbedDuration::Unknown
            }
        }
    }

    pub fn known(self) -> Option<Duration> {
        match self {
            ProbedDuration::Known(d) => Some(d),
            ProbedDuration::Unknown => None,
        }
    }

    /// Whole milliseconds, rounded to nearest.
    pub fn as_millis(self) -> Option<u64> {
        self.known().map(duration_to_millis)
    }
}

impl fmt::Display for ProbedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbedDuration::Known(d) => write!(f, "{:.2}s", d.as_secs_f64()),
            ProbedDuration::Unknown => write!(f, "unknown"),
        }
    }
}

/// Convert to whole milliseconds, rounding to nearest.
pub fn duration_to_millis(d: Duration) -> u64 {
    (d.as_secs_f64() * 1000.0).round() as u64
}

/// One part of a split recording, in milliseconds `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 0-based position
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// The final segment holds the remainder and runs to the end of the file
    pub is_last: bool,
}

impl Segment {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, is_last: bool) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            is_last,
        }
    }

    /// 1-based part number used in file names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn len_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Camelot wheel letter: `A` for minor keys, `B` for major keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyLetter {
    A,
    B,
}

impl KeyLetter {
    pub fn as_char(self) -> char {
        match self {
            KeyLetter::A => 'A',
            KeyLetter::B => 'B',
        }
    }
}

/// A Camelot key label such as `8A` or `12B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotKey {
    number: u8,
    letter: KeyLetter,
}

impl CamelotKey {
    /// Build a key, `None` unless `number` is on the wheel (1..=12).
    pub fn new(number: u8, letter: KeyLetter) -> Option<Self> {
        (1..=12)
            .contains(&number)
            .then_some(Self { number, letter })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn letter(&self) -> KeyLetter {
        self.letter
    }

    /// All 24 keys, two-digit numbers first so prefix matching never stops
    /// at `1A` when the text says `12A`.
    pub fn all_longest_first() -> impl Iterator<Item = CamelotKey> {
        (1..=12u8)
            .rev()
            .flat_map(|n| [KeyLetter::A, KeyLetter::B].map(move |l| CamelotKey { number: n, letter: l }))
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter.as_char())
    }
}

/// Final placement of a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Short sample, moved to the OneShots directory
    OneShot,
    /// Split into parts written to the Parts directory
    Part,
    /// No key prefix, moved to the Unlabeled directory
    Unlabeled,
    /// Key-labelled and long enough: already sorted
    KeepInPlace,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OneShot => "one-shot",
            Category::Part => "part",
            Category::Unlabeled => "unlabeled",
            Category::KeepInPlace => "keep",
        }
    }
}

/// The three output directories of a traversal root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub one_shots: PathBuf,
    pub parts: PathBuf,
    pub unlabeled: PathBuf,
}

impl OutputDirs {
    pub fn new(root: &Path, names: &OutputConfig) -> Self {
        Self {
            one_shots: root.join(&names.one_shots),
            parts: root.join(&names.parts),
            unlabeled: root.join(&names.unlabeled),
        }
    }

    /// Directory receiving files of `category`, `None` for files that stay.
    pub fn for_category(&self, category: Category) -> Option<&Path> {
        match category {
            Category::OneShot => Some(&self.one_shots),
            Category::Part => Some(&self.parts),
            Category::Unlabeled => Some(&self.unlabeled),
            Category::KeepInPlace => None,
        }
    }

    /// Whether `path` is one of the output directories or lies inside one.
    ///
    /// Pure path containment: nothing is read from disk.
    pub fn contains(&self, path: &Path) -> bool {
        [&self.one_shots, &self.parts, &self.unlabeled]
            .iter()
            .any(|dir| path.starts_with(dir))
    }

    /// Create the directory for `category` if needed and return it.
    pub fn ensure(&self, category: Category) -> Result<PathBuf> {
        let dir = self
            .for_category(category)
            .ok_or_else(|| crate::error::Error::config("files kept in place have no output directory"))?;
        std::fs::create_dir_all(dir)
            .with_context(format!("Failed to create directory {}", dir.display()))?;
        Ok(dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ref_parts() {
        let file = AudioFileRef::new("/crate/3B_Track.FLAC");
        assert_eq!(file.file_name(), "3B_Track.FLAC");
        assert_eq!(file.stem(), "3B_Track");
        assert_eq!(file.extension(), ".flac");
        assert_eq!(file.raw_stem(), "3B_Track");
        assert_eq!(file.raw_suffix(), ".FLAC");
    }

    #[test]
    fn test_file_ref_without_extension() {
        let file = AudioFileRef::new("/crate/README");
        assert_eq!(file.extension(), "");
        assert_eq!(file.stem(), "README");
        assert_eq!(file.raw_suffix(), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_name_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let file = AudioFileRef::new(Path::new("/crate").join(OsStr::from_bytes(b"Pad \xff.WAV")));
        assert_eq!(file.raw_file_name().as_bytes(), b"Pad \xff.WAV");
        assert_eq!(file.raw_stem().as_bytes(), b"Pad \xff");
        assert_eq!(file.raw_suffix(), ".WAV");
        assert_eq!(file.extension(), ".wav");
        // The display form is lossy, the raw name is not
        assert_eq!(file.file_name(), "Pad \u{FFFD}.WAV");
    }

    #[test]
    fn test_with_path_reissues_value() {
        let file = AudioFileRef::new("/a/drop.wav");
        let moved = file.with_path("/b/drop_1.wav");
        assert_eq!(file.path(), Path::new("/a/drop.wav"));
        assert_eq!(moved.file_name(), "drop_1.wav");
    }

    #[test]
    fn test_duration_millis_rounds() {
        assert_eq!(duration_to_millis(Duration::from_micros(1_999_600)), 2000);
        assert_eq!(duration_to_millis(Duration::from_secs(1380)), 1_380_000);
        assert_eq!(ProbedDuration::Unknown.as_millis(), None);
    }

    #[test]
    fn test_camelot_key_bounds() {
        assert!(CamelotKey::new(0, KeyLetter::A).is_none());
        assert!(CamelotKey::new(13, KeyLetter::B).is_none());
        assert_eq!(CamelotKey::new(12, KeyLetter::B).unwrap().to_string(), "12B");
        assert_eq!(CamelotKey::all_longest_first().count(), 24);
        assert_eq!(CamelotKey::all_longest_first().next().unwrap().number(), 12);
    }

    #[test]
    fn test_output_dirs_containment() {
        let dirs = OutputDirs::new(Path::new("/crate"), &OutputConfig::default());
        assert!(dirs.contains(&dirs.parts));
        assert!(dirs.contains(&dirs.one_shots.join("nested/x.wav")));
        assert!(!dirs.contains(Path::new("/crate/Sets/x.wav")));
        // Containment is per path component, not substring
        assert!(!dirs.contains(Path::new("/crate/12. Parts old/x.wav")));
        assert_eq!(dirs.for_category(Category::KeepInPlace), None);
    }
}
