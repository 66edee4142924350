//! Duration probing and lossless segment export.
//!
//! The sorting engine only needs two things from audio files: how long they
//! play, and a way to write a time range of one file into a new file of the
//! same container. Both sit behind [`AudioBackend`] so the engine can be
//! tested with scripted backends.
//!
//! [`DefaultBackend`] probes with symphonia (lofty as fallback), writes WAV
//! segments natively with hound and stream-copies everything else with
//! ffmpeg. Nothing is ever re-encoded.

pub mod ffmpeg;
pub mod probe;
pub mod wav;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::model::Segment;

pub use probe::probe_duration;

/// Extensions whose decoder format name differs from the extension.
/// Everything else uses the extension without its dot.
const FORMAT_ALIASES: &[(&str, &str)] = &[("m4a", "mp4"), ("aif", "aiff"), ("aiff", "aiff")];

/// Container format name derived from a file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatHint {
    name: String,
    remapped: bool,
}

impl FormatHint {
    /// Accepts `.M4A`, `m4a`, ... (case and leading dot are ignored).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match FORMAT_ALIASES.iter().find(|(from, _)| *from == ext) {
            Some((_, name)) => Self {
                remapped: *name != ext,
                name: (*name).to_string(),
            },
            None => Self {
                name: ext,
                remapped: false,
            },
        }
    }

    pub fn for_path(path: &Path) -> Self {
        Self::from_extension(
            &path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// True when the format name is not simply the extension.
    pub fn is_remapped(&self) -> bool {
        self.remapped
    }

    pub fn is_wav(&self) -> bool {
        self.name == "wav"
    }
}

/// Decode capability consumed by the sorting engine.
pub trait AudioBackend: Send + Sync {
    /// Play duration of `path`.
    fn probe(&self, path: &Path, hint: &FormatHint) -> Result<Duration>;

    /// Write the time range of `segment` from `source` into a new file at
    /// `dest`, in the same container format.
    fn export_segment(
        &self,
        source: &Path,
        dest: &Path,
        hint: &FormatHint,
        segment: &Segment,
    ) -> Result<()>;
}

/// Production backend: symphonia/lofty probing, hound WAV segments,
/// ffmpeg stream copy for other containers.
#[derive(Debug, Clone, Default)]
pub struct DefaultBackend {
    ffmpeg: Option<PathBuf>,
}

impl DefaultBackend {
    /// Resolve ffmpeg from config, falling back to a PATH search.
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let ffmpeg = tools
            .ffmpeg_path
            .clone()
            .or_else(|| ffmpeg::find_ffmpeg().map(PathBuf::from));
        match &ffmpeg {
            Some(path) => tracing::debug!(target: "codec", ffmpeg = %path.display(), "Using ffmpeg for non-WAV parts"),
            None => tracing::warn!(target: "codec", "ffmpeg not found; only WAV files can be split"),
        }
        Self { ffmpeg }
    }

    /// Backend that never shells out (WAV-only splitting).
    pub fn without_ffmpeg() -> Self {
        Self { ffmpeg: None }
    }

    pub fn ffmpeg(&self) -> Option<&Path> {
        self.ffmpeg.as_deref()
    }

    fn export_with_ffmpeg(
        &self,
        source: &Path,
        dest: &Path,
        hint: &FormatHint,
        segment: &Segment,
    ) -> Result<()> {
        let ffmpeg = self.ffmpeg.as_deref().ok_or_else(|| {
            Error::decode(
                source,
                format!("no encoder for .{} without ffmpeg", hint.as_str()),
            )
        })?;
        ffmpeg::export_segment(ffmpeg, source, dest, hint, segment)
    }
}

impl AudioBackend for DefaultBackend {
    fn probe(&self, path: &Path, hint: &FormatHint) -> Result<Duration> {
        probe_duration(path, hint)
    }

    fn export_segment(
        &self,
        source: &Path,
        dest: &Path,
        hint: &FormatHint,
        segment: &Segment,
    ) -> Result<()> {
        if !hint.is_wav() {
            return self.export_with_ffmpeg(source, dest, hint, segment);
        }

        match wav::export_segment(source, dest, segment) {
            Ok(()) => Ok(()),
            // Compressed WAV payloads hound can't read
            Err(e) if self.ffmpeg.is_some() => {
                tracing::debug!(target: "codec", path = %source.display(), error = %e, "Native WAV copy failed, trying ffmpeg");
                let _ = std::fs::remove_file(dest);
                self.export_with_ffmpeg(source, dest, hint, segment)
            }
            Err(e) => Err(e),
        }
    }
}
