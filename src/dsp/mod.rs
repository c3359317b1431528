//! Low-level DSP primitives used by the string voices.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! making them safe to embed directly inside voice structs.

/// Fixed-length circular delay line.
pub mod delay;
/// Amplitude estimators (envelope follower and rolling window).
pub mod follower;
/// Pseudo-random noise and the shared excitation burst.
pub mod noise;

pub use follower::AmplitudeFollower;
pub use noise::Excitation;
