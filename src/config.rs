//! Engine configuration.
//!
//! Everything here is fixed at construction: the voice count never changes
//! afterwards, and neither does the delivery mode of either channel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, MAX_BLOCK_SIZE, MAX_DELAY_SAMPLES, MAX_VOICES};

/// Default analysis rate, in telemetry batches per second.
pub const DEFAULT_TELEMETRY_RATE_HZ: u32 = 60;

/// Default length of the foreign backend's output buffer.
pub const DEFAULT_BLOCK_LEN: usize = 128;

/// How a voice estimates its own amplitude for telemetry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AmplitudeMode {
    /// Envelope follower that decays to 1% of its reference in 10 ms.
    #[default]
    Envelope,
    /// Mean of `|out|` over a fixed window, published each time the window fills.
    Window {
        /// Window length in samples.
        len: usize,
    },
}

/// Construction parameters for an [`Engine`](crate::Engine).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// One fundamental per voice, in Hz.
    pub frequencies: Vec<f32>,
    /// Whether analysis snapshots are produced at all.
    pub telemetry: bool,
    /// Telemetry batches per second.
    pub telemetry_rate_hz: u32,
    /// Amplitude estimator used by every voice.
    pub amplitude_mode: AmplitudeMode,
    /// Seed for the shared excitation noise.
    pub seed: u32,
    /// Output buffer length handed to a foreign backend.
    pub block_len: usize,
}

impl EngineConfig {
    pub fn new(sample_rate: u32, frequencies: impl Into<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            frequencies: frequencies.into(),
            telemetry: false,
            telemetry_rate_hz: DEFAULT_TELEMETRY_RATE_HZ,
            amplitude_mode: AmplitudeMode::default(),
            seed: 0,
            block_len: DEFAULT_BLOCK_LEN,
        }
    }

    pub fn telemetry(mut self, enabled: bool) -> Self {
        self.telemetry = enabled;
        self
    }

    pub fn telemetry_rate(mut self, hz: u32) -> Self {
        self.telemetry_rate_hz = hz;
        self
    }

    pub fn amplitude_mode(mut self, mode: AmplitudeMode) -> Self {
        self.amplitude_mode = mode;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn block_len(mut self, len: usize) -> Self {
        self.block_len = len;
        self
    }

    /// Samples between two telemetry batches: `floor(sample_rate / rate)`, at least 1.
    pub fn telemetry_interval(&self) -> usize {
        (self.sample_rate / self.telemetry_rate_hz.max(1)).max(1) as usize
    }

    pub fn voice_count(&self) -> usize {
        self.frequencies.len()
    }

    /// Check every constraint the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }

        let count = self.frequencies.len();
        if !(1..=MAX_VOICES).contains(&count) {
            return Err(ConfigError::VoiceCount {
                count,
                max: MAX_VOICES,
            });
        }

        for (index, &f0) in self.frequencies.iter().enumerate() {
            validate_frequency(index, self.sample_rate, f0)?;
        }

        if let AmplitudeMode::Window { len: 0 } = self.amplitude_mode {
            return Err(ConfigError::AmplitudeWindow);
        }

        if !(1..=MAX_BLOCK_SIZE).contains(&self.block_len) {
            return Err(ConfigError::BlockLength {
                len: self.block_len,
                max: MAX_BLOCK_SIZE,
            });
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(48_000, vec![440.0])
    }
}

/// A fundamental is usable when it is positive, finite, and gives a delay line
/// between 1 and [`MAX_DELAY_SAMPLES`] samples long.
pub(crate) fn validate_frequency(index: usize, sample_rate: u32, f0: f32) -> Result<(), ConfigError> {
    let usable = f0.is_finite()
        && f0 > 0.0
        && f0 <= sample_rate as f32
        && sample_rate as f64 / f0 as f64 <= MAX_DELAY_SAMPLES as f64;
    if usable {
        Ok(())
    } else {
        Err(ConfigError::Frequency {
            index,
            f0,
            sample_rate,
        })
    }
}
