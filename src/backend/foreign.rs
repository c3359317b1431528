use rtrb::{Consumer, Producer, RingBuffer};
use tracing::info;

use crate::{
    backend::{
        module::{ForeignModule, ModuleBuilder, ModuleRenderer},
        BackendState, RenderBackend,
    },
    config::EngineConfig,
    error::BackendError,
};

/// Render-side holder for a foreign module that arrives some time after the
/// engine was built.
///
/// Until a sealed renderer has been installed every block is silent and
/// plucks are dropped on the floor.
pub struct ForeignBackend {
    renderer: Option<Box<ModuleRenderer>>,
    incoming: Consumer<Box<ModuleRenderer>>,
    voice_count: usize,
}

/// Control-side handle that brings a module up and hands it to the engine.
///
/// Registration and sealing (the steps that allocate and grow memory) run
/// here, off the render thread. The engine only ever receives a renderer that
/// is already sealed.
pub struct ModuleInstaller {
    sample_rate: u32,
    frequencies: Vec<f32>,
    block_len: usize,
    outgoing: Producer<Box<ModuleRenderer>>,
}

/// Create the two ends for an already validated config.
pub(crate) fn foreign_pair(config: &EngineConfig) -> (ForeignBackend, ModuleInstaller) {
    let (outgoing, incoming) = RingBuffer::new(1);
    (
        ForeignBackend {
            renderer: None,
            incoming,
            voice_count: config.voice_count(),
        },
        ModuleInstaller {
            sample_rate: config.sample_rate,
            frequencies: config.frequencies.clone(),
            block_len: config.block_len,
            outgoing,
        },
    )
}

impl ModuleInstaller {
    /// Register every configured string with `module`, seal it, and queue it
    /// for the engine. Consumes the installer: a bank is installed once.
    pub fn install(mut self, module: Box<dyn ForeignModule>) -> Result<(), BackendError> {
        let mut builder = ModuleBuilder::new(module);
        for &f0 in &self.frequencies {
            builder.register(self.sample_rate, f0)?;
        }
        let renderer = builder.seal(self.block_len)?;

        self.outgoing
            .push(Box::new(renderer))
            .map_err(|_| BackendError::SlotOccupied)?;
        info!(voices = self.frequencies.len(), "foreign backend queued for install");
        Ok(())
    }
}

impl RenderBackend for ForeignBackend {
    fn voice_count(&self) -> usize {
        self.voice_count
    }

    fn prepare(&mut self) {
        if self.renderer.is_none() {
            if let Ok(renderer) = self.incoming.pop() {
                self.renderer = Some(renderer);
            }
        }
    }

    fn pluck(&mut self, index: usize) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.pluck(index);
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.render(out),
            None => out.fill(0.0),
        }
    }

    fn amplitude(&self, index: usize) -> f32 {
        self.renderer.as_ref().map_or(0.0, |r| r.amplitude(index))
    }

    fn vibration(&self, index: usize) -> f32 {
        self.renderer.as_ref().map_or(0.0, |r| r.vibration(index))
    }

    fn state(&self) -> BackendState {
        self.renderer
            .as_ref()
            .map_or(BackendState::Pending, |r| r.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ArenaModule;

    fn pair() -> (ForeignBackend, ModuleInstaller) {
        foreign_pair(&EngineConfig::new(44_100, vec![220.0, 330.0]).block_len(32))
    }

    #[test]
    fn silent_until_installed() {
        let (mut backend, _installer) = pair();
        backend.prepare();
        backend.pluck(0);

        let mut out = vec![1.0; 64];
        backend.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(backend.state(), BackendState::Pending);
        assert_eq!(backend.amplitude(0), 0.0);
    }

    #[test]
    fn picks_up_installed_renderer() {
        let (mut backend, installer) = pair();
        installer.install(Box::new(ArenaModule::new())).unwrap();

        backend.prepare();
        assert_eq!(backend.state(), BackendState::Sealed);
        assert_eq!(backend.amplitude(0), 0.0, "no block rendered yet");

        backend.pluck(1);
        let mut out = vec![0.0; 100];
        backend.render(&mut out);
        assert_eq!(backend.state(), BackendState::Rendering);
        assert!(out.iter().any(|&s| s != 0.0));
        assert!(backend.amplitude(1) > 0.0);
        assert_eq!(backend.amplitude(0), 0.0);
    }
}
