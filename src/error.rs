//! Error types for engine construction, rendering and the foreign backend.

use thiserror::Error;

/// Invalid engine configuration. Always raised before any rendering is possible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Voice count outside `1..=MAX_VOICES`.
    #[error("voice count {count} outside 1..={max}")]
    VoiceCount {
        /// Number of frequencies supplied.
        count: usize,
        /// Largest accepted voice count.
        max: usize,
    },

    /// A fundamental is not a positive finite number, or is too high to give a
    /// delay line of at least one sample.
    #[error("voice {index}: frequency {f0} Hz is not usable at {sample_rate} Hz")]
    Frequency {
        /// Index of the offending voice.
        index: usize,
        /// Requested fundamental in Hz.
        f0: f32,
        /// Engine sample rate in Hz.
        sample_rate: u32,
    },

    /// Sample rate of zero.
    #[error("sample rate must be positive")]
    SampleRate,

    /// Rolling amplitude window of zero samples.
    #[error("amplitude window must hold at least one sample")]
    AmplitudeWindow,

    /// Foreign backend block length outside `1..=MAX_BLOCK_SIZE`.
    #[error("block length {len} outside 1..={max}")]
    BlockLength {
        /// Requested block length.
        len: usize,
        /// Largest accepted block length.
        max: usize,
    },
}

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Construction failed; no engine was produced.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The host asked for more than one output channel. The call produced silence.
    #[error("unsupported output topology: {channels} channels requested, only mono is rendered")]
    UnsupportedTopology {
        /// Number of channels the host supplied.
        channels: usize,
    },
}

/// Errors raised while bringing up or talking to a foreign compute module.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// A string was registered after the output buffer was handed out. The
    /// registration could have moved linear memory under the buffer, so this
    /// is a programming error and is never retried.
    #[error("string registered after the output buffer was allocated")]
    IllegalTransition,

    /// Sealing was attempted with nothing registered.
    #[error("no strings registered")]
    NoVoices,

    /// Linear memory cannot grow any further.
    #[error("linear memory exhausted: {requested} bytes requested")]
    OutOfMemory {
        /// Bytes the failed allocation asked for.
        requested: usize,
    },

    /// The module rejected a string definition.
    #[error("module rejected string: {0}")]
    Rejected(#[from] ConfigError),

    /// A renderer is already waiting to be picked up by the engine.
    #[error("a backend is already pending installation")]
    SlotOccupied,
}

/// A bounded queue was full and the newest entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel full, event dropped")]
pub struct ChannelOverflow;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn voice_count_display() {
        let err = ConfigError::VoiceCount { count: 101, max: 100 };
        assert_eq!(err.to_string(), "voice count 101 outside 1..=100");
    }

    #[test]
    fn engine_error_wraps_config_source() {
        let err = EngineError::from(ConfigError::SampleRate);
        assert!(err.to_string().starts_with("invalid configuration"));
        assert!(err.source().is_some());
    }

    #[test]
    fn topology_error_has_no_source() {
        let err = EngineError::UnsupportedTopology { channels: 2 };
        assert!(err.source().is_none());
        assert!(err.to_string().contains("2 channels"));
    }
}
