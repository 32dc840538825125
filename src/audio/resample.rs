use rubato::{FftFixedIn, Resampler};

use crate::error::{Error, Result};

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Widens mono to `to` channels by duplication. Any other change of layout
/// is refused.
pub fn remix(samples: &[f32], from: u16, to: u16) -> Result<Vec<f32>> {
    if from == to {
        return Ok(samples.to_vec());
    }
    if from != 1 || to == 0 {
        return Err(Error::UnsupportedLayout { from, to });
    }
    let mut out = Vec::with_capacity(samples.len() * to as usize);
    for &s in samples {
        out.extend(std::iter::repeat(s).take(to as usize));
    }
    Ok(out)
}

/// Resamples interleaved PCM with rubato's FFT resampler.
///
/// The output is trimmed of the resampler delay and cut to
/// `frames * to / from` frames so clip durations survive conversion.
pub fn resample(samples: &[f32], channels: u16, from: u32, to: u32) -> Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let ch = channels.max(1) as usize;
    let frames = samples.len() / ch;

    let planar: Vec<Vec<f32>> = (0..ch)
        .map(|c| samples.iter().skip(c).step_by(ch).copied().collect())
        .collect();

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, CHUNK, SUB_CHUNKS, ch)
        .map_err(|e| Error::Resample(e.to_string()))?;

    let expected = (frames as f64 * to as f64 / from as f64).round() as usize;
    let delay = resampler.output_delay();
    let wanted = expected + delay;
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted + CHUNK); ch];
    let mut input = vec![vec![0.0f32; CHUNK]; ch];

    // Zero padding past the end flushes the delay line.
    let max_pos = frames + delay + 64 * CHUNK;
    let mut pos = 0;
    while out[0].len() < wanted && pos <= max_pos {
        for (c, block) in input.iter_mut().enumerate() {
            block.fill(0.0);
            if pos < frames {
                let end = (pos + CHUNK).min(frames);
                block[..end - pos].copy_from_slice(&planar[c][pos..end]);
            }
        }
        pos += CHUNK;

        let produced = resampler
            .process(&input, None)
            .map_err(|e| Error::Resample(e.to_string()))?;
        for (c, channel) in produced.iter().enumerate() {
            out[c].extend_from_slice(channel);
        }
    }

    let mut interleaved = Vec::with_capacity(expected * ch);
    for i in delay..wanted.min(out[0].len()) {
        for channel in &out {
            interleaved.push(channel[i]);
        }
    }
    Ok(interleaved)
}
