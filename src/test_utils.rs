//! Test utilities and fixtures for camelot-sort tests.
//!
//! - [`write_wav`] / [`read_wav_samples`]: deterministic WAV fixtures
//! - [`ScriptedBackend`]: an [`AudioBackend`] with canned durations and
//!   optional export failures, so engine tests never decode real audio
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::ScriptedBackend;
//!
//! let backend = ScriptedBackend::new()
//!     .with_duration("7A - Intro.wav", 1_200)
//!     .failing_on_part(2);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::codec::{AudioBackend, FormatHint};
use crate::error::{Error, Result};
use crate::model::Segment;

/// Write a mono 16-bit WAV of `duration_ms` at `sample_rate`.
///
/// Samples follow a sawtooth so every frame is distinguishable.
pub fn write_wav(path: &Path, duration_ms: u64, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("Failed to create WAV");
    let frames = u64::from(sample_rate) * duration_ms / 1000;
    for i in 0..frames {
        let sample = ((i % 2000) as i32 - 1000) as i16;
        writer.write_sample(sample).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// All samples of a WAV file, widened to i32.
pub fn read_wav_samples(path: &Path) -> Vec<i32> {
    let mut reader = hound::WavReader::open(path).expect("Failed to open WAV");
    reader
        .samples::<i32>()
        .map(|s| s.expect("Failed to read sample"))
        .collect()
}

/// Write a small placeholder file (content irrelevant to a scripted backend).
pub fn touch(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Audio backend driven by file name.
///
/// Files without a scripted duration fail to probe, like unreadable audio.
/// Exported segments are written as small text files describing the range.
#[derive(Default)]
pub struct ScriptedBackend {
    durations: HashMap<String, u64>,
    fail_on_part: Option<usize>,
    exported: Mutex<Vec<Segment>>,
    probes: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the duration (in ms) reported for files named `file_name`.
    pub fn with_duration(mut self, file_name: &str, millis: u64) -> Self {
        self.durations.insert(file_name.to_string(), millis);
        self
    }

    /// Fail the export of the given 1-based part number.
    pub fn failing_on_part(mut self, part: usize) -> Self {
        self.fail_on_part = Some(part);
        self
    }

    /// Segments exported so far, in call order.
    pub fn exported(&self) -> Vec<Segment> {
        self.exported.lock().clone()
    }

    /// Number of probe calls so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl AudioBackend for ScriptedBackend {
    fn probe(&self, path: &Path, _hint: &FormatHint) -> Result<Duration> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.durations
            .get(&name)
            .map(|ms| Duration::from_millis(*ms))
            .ok_or_else(|| Error::decode(path, "unreadable test file"))
    }

    fn export_segment(
        &self,
        source: &Path,
        dest: &Path,
        _hint: &FormatHint,
        segment: &Segment,
    ) -> Result<()> {
        if self.fail_on_part == Some(segment.number()) {
            return Err(Error::decode(source, "scripted export failure"));
        }
        std::fs::write(
            dest,
            format!("{}..{}", segment.start_ms, segment.end_ms),
        )?;
        self.exported.lock().push(*segment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wav_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        write_wav(&path, 250, 8000);
        assert_eq!(read_wav_samples(&path).len(), 2000);
    }

    #[test]
    fn test_scripted_backend_probe() {
        let backend = ScriptedBackend::new().with_duration("a.wav", 1500);
        let hint = FormatHint::from_extension("wav");
        assert_eq!(
            backend.probe(Path::new("/x/a.wav"), &hint).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(backend.probe(Path::new("/x/b.wav"), &hint).is_err());
        assert_eq!(backend.probe_count(), 2);
    }
}
