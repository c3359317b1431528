//! Realtime-safe multi-voice plucked-string synthesis.
//!
//! A fixed bank of Karplus–Strong strings is rendered into a mono block on a
//! periodic audio callback. Plucks come in and per-string telemetry goes out
//! through lock-free queues, so nothing on the render path blocks, locks or
//! allocates.

pub mod backend; // In-process and foreign-memory compute paths
pub mod channel; // Control and telemetry transports
pub mod config;
pub mod dsp;
pub mod error;
pub mod synth; // Voices and the engine that mixes them
pub mod tuning;

pub use backend::{BackendState, RenderBackend};
pub use config::{AmplitudeMode, EngineConfig};
pub use error::{BackendError, ConfigError, EngineError};
pub use synth::engine::Engine;

/// Largest block a host is expected to request in one callback.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Hard limit on strings per engine instance.
pub const MAX_VOICES: usize = 100;

/// Longest delay line a string may ask for (about 21 s at 48 kHz).
pub const MAX_DELAY_SAMPLES: usize = 1 << 20;
