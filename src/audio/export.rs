use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use std::path::Path;
use tracing::info;

use super::buffer::AudioBuffer;
use crate::error::{Error, Result};

const FRAMES_PER_CHUNK: usize = 8192;
/// Worst-case size of the final frames LAME emits on flush.
const FLUSH_RESERVE: usize = 7200;
/// Layout used when the buffer never received a clip.
const SILENT_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Mp3,
    Wav,
}

impl ExportFormat {
    /// `.wav` selects WAV; everything else is MP3.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => ExportFormat::Wav,
            _ => ExportFormat::Mp3,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Mp3 => "audio/mp3",
            ExportFormat::Wav => "audio/wav",
        }
    }
}

/// Writes `buffer` to `path`, replacing any existing file.
///
/// A buffer with no layout yet (nothing appended) exports as a valid,
/// zero-length mono file.
pub fn export(buffer: &AudioBuffer, path: &Path) -> Result<ExportFormat> {
    let format = ExportFormat::for_path(path);
    let silent;
    let buffer = if buffer.sample_rate == 0 || buffer.channels == 0 {
        silent = AudioBuffer::new(SILENT_RATE, 1, Vec::new());
        &silent
    } else {
        buffer
    };
    match format {
        ExportFormat::Mp3 => std::fs::write(path, encode_mp3(buffer)?)?,
        ExportFormat::Wav => write_wav(buffer, path)?,
    }
    info!(path = %path.display(), ?format, "exported audiobook");
    Ok(format)
}

pub fn encode_mp3(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    if buffer.sample_rate == 0 {
        return Err(Error::Encode("buffer has no sample rate".to_string()));
    }
    let channels = buffer.channels;
    if !(1..=2).contains(&channels) {
        return Err(Error::UnsupportedLayout { from: channels, to: 2 });
    }

    let mut builder = Builder::new().ok_or_else(|| Error::Encode("cannot allocate LAME encoder".to_string()))?;
    builder.set_num_channels(channels as u8).map_err(lame_error)?;
    builder.set_sample_rate(buffer.sample_rate).map_err(lame_error)?;
    builder.set_brate(Bitrate::Kbps128).map_err(lame_error)?;
    builder.set_quality(Quality::Best).map_err(lame_error)?;
    let mut encoder = builder.build().map_err(lame_error)?;

    let pcm = to_i16(&buffer.samples);
    let mut out = Vec::new();
    for chunk in pcm.chunks(FRAMES_PER_CHUNK * channels as usize) {
        out.reserve(mp3lame_encoder::max_required_buffer_size(chunk.len()));
        if channels == 1 {
            encoder.encode_to_vec(MonoPcm(chunk), &mut out).map_err(lame_error)?;
        } else {
            encoder.encode_to_vec(InterleavedPcm(chunk), &mut out).map_err(lame_error)?;
        }
    }
    out.reserve(FLUSH_RESERVE);
    encoder.flush_to_vec::<FlushNoGap>(&mut out).map_err(lame_error)?;
    Ok(out)
}

fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    if buffer.channels == 0 || buffer.sample_rate == 0 {
        return Err(Error::Encode("buffer has no channel layout".to_string()));
    }
    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in to_i16(&buffer.samples) {
        writer.write_sample(sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

fn lame_error<E: std::fmt::Debug>(e: E) -> Error {
    Error::Encode(format!("lame: {e:?}"))
}

fn wav_error(e: hound::Error) -> Error {
    Error::Encode(format!("wav: {e}"))
}
