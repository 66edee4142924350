//! Filename and duration predicates.
//!
//! A file is "key-labelled" when its name starts with a Camelot key, as
//! written by key-detection tools: `8A - Artist - Title.mp3`,
//! `12B_Track.wav`. Files whose leading token starts with `All` carry the
//! marker for tracks that were checked but have no usable key, and are
//! treated as unlabeled.

use std::time::Duration;

use crate::model::{CamelotKey, ProbedDuration};

/// Marker written in front of tracks without a key label.
pub const ALL_MARKER: &str = "All";

/// Leading token of a filename: the text before the first `" - "`, then
/// before the first `_`, trimmed.
pub fn leading_token(filename: &str) -> &str {
    let head = filename.split(" - ").next().unwrap_or(filename);
    head.split('_').next().unwrap_or(head).trim()
}

impl CamelotKey {
    /// Key label at the start of `filename`, if any.
    ///
    /// Prefix matching: `10Awesome_Track.mp3` yields `10A`. Known source of
    /// false positives, kept so existing libraries sort the same way.
    pub fn from_filename(filename: &str) -> Option<CamelotKey> {
        let token = leading_token(filename);
        if token.starts_with(ALL_MARKER) {
            return None;
        }
        CamelotKey::all_longest_first().find(|key| token.starts_with(&key.to_string()))
    }
}

/// Whether `filename` carries a valid Camelot key prefix.
pub fn has_camelot_prefix(filename: &str) -> bool {
    CamelotKey::from_filename(filename).is_some()
}

/// Whether a file of this duration is a one-shot sample: strictly shorter
/// than `limit`. Unknown durations never are.
pub fn is_one_shot(duration: ProbedDuration, limit: Duration) -> bool {
    match duration {
        ProbedDuration::Known(d) => d < limit,
        ProbedDuration::Unknown => false,
    }
}

/// Strict key label used by the tag report: `^(1[0-2]|[1-9])[AB]\s*-\s*`.
///
/// Unlike [`has_camelot_prefix`] this requires the key to be the whole first
/// token followed by a dash, so `10Awesome.mp3` and `3B_Track.flac` do not
/// count.
pub fn is_key_labelled(filename: &str) -> bool {
    let digits: String = filename.chars().take_while(char::is_ascii_digit).collect();
    let valid_number = match digits.as_str() {
        "10" | "11" | "12" => true,
        d if d.len() == 1 => d != "0",
        _ => false,
    };
    if !valid_number {
        return false;
    }

    let rest = &filename[digits.len()..];
    let Some(rest) = rest.strip_prefix(['A', 'B']) else {
        return false;
    };
    rest.trim_start().starts_with('-')
}
