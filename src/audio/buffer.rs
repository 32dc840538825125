use std::time::Duration;

use super::resample::{remix, resample};
use crate::error::Result;

/// Interleaved f32 PCM.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// The starting point of a concatenation: no format, no samples.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self { sample_rate, channels, samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Appends `clip` after the current samples.
    ///
    /// An empty buffer adopts the clip's format. Otherwise both sides are
    /// brought to the higher sample rate and channel count first.
    pub fn append(&mut self, clip: AudioBuffer) -> Result<()> {
        if self.sample_rate == 0 {
            *self = clip;
            return Ok(());
        }
        if clip.is_empty() {
            return Ok(());
        }

        let rate = self.sample_rate.max(clip.sample_rate);
        let channels = self.channels.max(clip.channels);
        self.convert(rate, channels)?;
        let clip = clip.converted(rate, channels)?;
        self.samples.extend_from_slice(&clip.samples);
        Ok(())
    }

    fn convert(&mut self, rate: u32, channels: u16) -> Result<()> {
        if self.channels != channels {
            self.samples = remix(&self.samples, self.channels, channels)?;
            self.channels = channels;
        }
        if self.sample_rate != rate {
            self.samples = resample(&self.samples, self.channels, self.sample_rate, rate)?;
            self.sample_rate = rate;
        }
        Ok(())
    }

    fn converted(mut self, rate: u32, channels: u16) -> Result<Self> {
        self.convert(rate, channels)?;
        Ok(self)
    }
}
