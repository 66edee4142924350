//! Stream-copy segment export using ffmpeg.
//!
//! This module shells out to `ffmpeg` with `-c copy`, so compressed
//! containers (MP3, FLAC, M4A, Ogg, ...) are cut without being re-encoded.
//! Cuts land on packet boundaries, which for compressed formats is the
//! closest lossless option.
//!
//! Install ffmpeg:
//! - Windows: `winget install Gyan.FFmpeg`
//! - macOS: `brew install ffmpeg`
//! - Linux: `apt install ffmpeg` or equivalent

use std::path::Path;
use std::process::{Command, Stdio};

use super::FormatHint;
use crate::error::{Error, Result};
use crate::model::Segment;

/// Common installation paths for ffmpeg on Windows
#[cfg(windows)]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    r"C:\ffmpeg\bin\ffmpeg.exe",
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
];

#[cfg(not(windows))]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
];

/// Find the ffmpeg executable, checking common installation paths
pub fn find_ffmpeg() -> Option<&'static str> {
    FFMPEG_PATHS
        .iter()
        .find(|&path| {
            Command::new(path)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
        .copied()
}

/// Format seconds for ffmpeg's `-ss`/`-t` arguments.
fn seconds_arg(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Arguments for cutting `segment` out of `source` into `dest`.
pub fn build_args(source: &Path, dest: &Path, hint: &FormatHint, segment: &Segment) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(source.to_string_lossy().into_owned());
    args.extend(["-ss".to_string(), seconds_arg(segment.start_ms)]);
    if !segment.is_last {
        args.extend(["-t".to_string(), seconds_arg(segment.len_ms())]);
    }
    args.extend(
        ["-map", "0:a", "-map_metadata", "0", "-c", "copy"]
            .iter()
            .map(|s| s.to_string()),
    );
    // Muxer name differs from the extension (m4a -> mp4, aif -> aiff)
    if hint.is_remapped() {
        args.extend(["-f".to_string(), hint.as_str().to_string()]);
    }
    args.push(dest.to_string_lossy().into_owned());
    args
}

/// Run ffmpeg to export one segment.
pub fn export_segment(
    ffmpeg: &Path,
    source: &Path,
    dest: &Path,
    hint: &FormatHint,
    segment: &Segment,
) -> Result<()> {
    let output = Command::new(ffmpeg)
        .args(build_args(source, dest, hint, segment))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::decode(source, format!("Failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::decode(
            source,
            format!("ffmpeg failed: {}", stderr.trim()),
        ));
    }

    if !dest.exists() {
        return Err(Error::decode(source, "ffmpeg produced no output file"));
    }

    Ok(())
}
