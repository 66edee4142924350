//! Duration probing.
//!
//! Symphonia reads the container header; when the header carries no frame
//! count (VBR MP3 without a Xing frame, some Ogg streams) the packet
//! durations are summed without decoding any audio. Containers symphonia
//! does not know (WMA, APE, WavPack, ...) get a second opinion from lofty's
//! audio properties.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use lofty::file::AudioFile;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use super::FormatHint;
use crate::error::{Error, Result};

/// Play duration of `path`, or [`Error::Decode`] if neither symphonia nor
/// lofty can read it.
pub fn probe_duration(path: &Path, hint: &FormatHint) -> Result<Duration> {
    match probe_with_symphonia(path, hint) {
        Ok(duration) => Ok(duration),
        Err(first) => match probe_with_lofty(path) {
            Ok(duration) => {
                tracing::debug!(target: "codec::probe", path = %path.display(), "Duration from tag properties");
                Ok(duration)
            }
            Err(_) => Err(first),
        },
    }
}

fn probe_with_symphonia(path: &Path, hint: &FormatHint) -> Result<Duration> {
    let file = File::open(path).map_err(|e| Error::decode(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut probe_hint = Hint::new();
    probe_hint.with_extension(hint.as_str());

    let probed = symphonia::default::get_probe()
        .format(
            &probe_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::decode(path, e))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::decode(path, "no audio track found"))?;

    let track_id = track.id;
    let params = track.codec_params.clone();

    if let Some(n_frames) = params.n_frames {
        if let Some(tb) = params.time_base {
            let time = tb.calc_time(n_frames);
            return Ok(Duration::from_secs_f64(time.seconds as f64 + time.frac));
        }
        if let Some(rate) = params.sample_rate.filter(|r| *r > 0) {
            return Ok(Duration::from_secs_f64(n_frames as f64 / rate as f64));
        }
    }

    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.filter(|r| *r > 0).map(|r| TimeBase::new(1, r)))
        .ok_or_else(|| Error::decode(path, "no time base or sample rate"))?;

    let mut total_ts: u64 = 0;
    loop {
        match reader.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    total_ts += packet.dur();
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => continue,
            Err(e) => return Err(Error::decode(path, e)),
        }
    }

    let time = time_base.calc_time(total_ts);
    Ok(Duration::from_secs_f64(time.seconds as f64 + time.frac))
}

fn probe_with_lofty(path: &Path) -> Result<Duration> {
    let tagged_file = lofty::read_from_path(path).map_err(|e| Error::decode(path, e))?;
    let duration = tagged_file.properties().duration();
    if duration.is_zero() {
        return Err(Error::decode(path, "no duration in audio properties"));
    }
    Ok(duration)
}
