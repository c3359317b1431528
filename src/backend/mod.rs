//! Compute strategies for the string recurrence.
//!
//! [`VoiceBank`](crate::synth::VoiceBank) runs the strings in-process. A
//! [`ForeignBackend`] delegates them to a separately built module that keeps
//! its state in its own growable linear memory; bringing such a module up goes
//! through [`ModuleBuilder`] → [`ModuleRenderer`] so that nothing can be
//! registered once the output buffer exists.

/// Reference module with a page-grown linear memory.
pub mod arena;
/// Engine-side slot a sealed module is installed into.
pub mod foreign;
/// Foreign module ABI and its registration/sealing lifecycle.
pub mod module;

pub use arena::ArenaModule;
pub use foreign::{ForeignBackend, ModuleInstaller};
pub use module::{ForeignModule, MemPtr, ModuleBuilder, ModuleRenderer};

/// Lifecycle state as seen from the render side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    /// No module yet. Renders silence; plucks are accepted and have no effect.
    Pending,
    /// Output buffer allocated, nothing rendered yet.
    Sealed,
    /// At least one block rendered.
    Rendering,
}

impl BackendState {
    pub fn is_ready(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Core trait for anything that can render the string bank.
///
/// Every method is called from the render context and must be
/// allocation-free and bounded in time.
pub trait RenderBackend: Send {
    fn voice_count(&self) -> usize;

    /// Restart one string's excitation. Out-of-range indices do nothing.
    fn pluck(&mut self, index: usize);

    /// Overwrite `out` with the sum of every string's next `out.len()` samples.
    fn render(&mut self, out: &mut [f32]);

    /// Amplitude estimate of one string, or 0 when unknown.
    fn amplitude(&self, index: usize) -> f32;

    /// Display vibration of one string in [0, 1), or 0 when unknown.
    fn vibration(&self, index: usize) -> f32;

    fn state(&self) -> BackendState;

    /// Called once at the top of every non-empty block, before control events
    /// are applied.
    ///
    /// Default implementation does nothing.
    fn prepare(&mut self) {
        // Default: do nothing
    }
}
