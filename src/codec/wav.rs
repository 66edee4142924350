//! Sample-exact WAV segment export.
//!
//! Samples are copied with the source [`hound::WavSpec`] unchanged, so the
//! parts concatenate back to the original sample stream.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::error::{Error, Result};
use crate::model::Segment;

/// Frame range of `segment` in a stream of `total_frames` at `sample_rate`.
///
/// The last segment always runs to the final frame so millisecond rounding
/// never drops samples.
pub fn frame_range(segment: &Segment, sample_rate: u32, total_frames: u64) -> (u64, u64) {
    let rate = u64::from(sample_rate);
    let start = (segment.start_ms * rate / 1000).min(total_frames);
    let end = if segment.is_last {
        total_frames
    } else {
        (segment.end_ms * rate / 1000).min(total_frames)
    };
    (start, end.max(start))
}

/// Copy the frames of `segment` from `source` into a new WAV at `dest`.
pub fn export_segment(source: &Path, dest: &Path, segment: &Segment) -> Result<()> {
    let mut reader = WavReader::open(source).map_err(|e| Error::decode(source, e))?;
    let spec = reader.spec();
    let total_frames = u64::from(reader.duration());
    let (start, end) = frame_range(segment, spec.sample_rate, total_frames);

    let start_u32 = u32::try_from(start).map_err(|e| Error::decode(source, e))?;
    reader.seek(start_u32)?;

    let sample_count = ((end - start) * u64::from(spec.channels)) as usize;
    let mut writer = WavWriter::create(dest, spec).map_err(|e| Error::decode(dest, e))?;

    match spec.sample_format {
        SampleFormat::Float => {
            for sample in reader.samples::<f32>().take(sample_count) {
                let sample = sample.map_err(|e| Error::decode(source, e))?;
                writer.write_sample(sample).map_err(|e| Error::decode(dest, e))?;
            }
        }
        SampleFormat::Int => {
            for sample in reader.samples::<i32>().take(sample_count) {
                let sample = sample.map_err(|e| Error::decode(source, e))?;
                writer.write_sample(sample).map_err(|e| Error::decode(dest, e))?;
            }
        }
    }

    writer.finalize().map_err(|e| Error::decode(dest, e))?;
    Ok(())
}
