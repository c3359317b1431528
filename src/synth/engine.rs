use tracing::{info, warn};

use crate::{
    backend::{
        foreign::{foreign_pair, ForeignBackend, ModuleInstaller},
        BackendState, RenderBackend,
    },
    channel::{ControlChannel, Handshake, TelemetryChannel, TelemetryEvent, TelemetrySink},
    config::EngineConfig,
    error::EngineError,
    synth::{bank::VoiceBank, message::ControlEvent},
};

/// Multi-string engine driven by a periodic audio callback.
///
/// Per block: pick up a pending backend, apply queued plucks, render every
/// string into the output, then emit telemetry if an analysis tick is due.
/// All of it is allocation-free and proportional to `voices × frames`.
pub struct Engine<B: RenderBackend = VoiceBank> {
    backend: B,
    control: ControlChannel,
    telemetry: TelemetryChannel,
    sample_rate: u32,
    telemetry_interval: usize,
    /// Samples rendered since the last analysis tick, kept modulo the interval.
    telemetry_counter: usize,
}

/// Chooses the channel strategies before the engine exists.
pub struct EngineBuilder {
    config: EngineConfig,
    control: ControlChannel,
    telemetry: TelemetryChannel,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            control: ControlChannel::Direct,
            telemetry: TelemetryChannel::Disabled,
        }
    }

    /// Apply a shared-queue handshake for one direction.
    pub fn handshake(mut self, handshake: Handshake) -> Self {
        match handshake {
            Handshake::ControlIn(consumer) => {
                self.control = ControlChannel::Queued(Box::new(consumer));
            }
            Handshake::TelemetryOut(writer) => {
                self.telemetry = TelemetryChannel::Queued(writer);
            }
        }
        self
    }

    /// Deliver telemetry as one event per voice per tick. Ignored if a
    /// telemetry queue was handed over by [`handshake`](Self::handshake).
    pub fn telemetry_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        if !matches!(self.telemetry, TelemetryChannel::Queued(_)) {
            self.telemetry = TelemetryChannel::Message(Box::new(sink));
        }
        self
    }

    /// Build with in-process voices.
    pub fn build(self) -> Result<Engine<VoiceBank>, EngineError> {
        self.config.validate()?;
        let backend = VoiceBank::from_config(&self.config);
        Ok(self.finish(backend))
    }

    /// Build with a foreign backend. The engine renders silence until the
    /// returned installer has delivered a sealed module.
    pub fn build_foreign(self) -> Result<(Engine<ForeignBackend>, ModuleInstaller), EngineError> {
        self.config.validate()?;
        let (backend, installer) = foreign_pair(&self.config);
        Ok((self.finish(backend), installer))
    }

    fn finish<B: RenderBackend>(self, backend: B) -> Engine<B> {
        let config = self.config;
        let telemetry = if config.telemetry {
            if !self.telemetry.is_enabled() {
                warn!("telemetry enabled but no sink or queue configured; nothing will be emitted");
            }
            self.telemetry
        } else {
            TelemetryChannel::Disabled
        };

        info!(
            voices = config.voice_count(),
            sample_rate = config.sample_rate,
            telemetry = telemetry.is_enabled(),
            queued_control = matches!(self.control, ControlChannel::Queued(_)),
            "engine ready"
        );

        Engine {
            backend,
            control: self.control,
            telemetry,
            sample_rate: config.sample_rate,
            telemetry_interval: config.telemetry_interval(),
            telemetry_counter: 0,
        }
    }
}

impl Engine<VoiceBank> {
    /// In-process engine with direct control and no telemetry.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn bank(&self) -> &VoiceBank {
        &self.backend
    }
}

impl<B: RenderBackend> Engine<B> {
    /// Render one mono block into `out`, overwriting it.
    ///
    /// An empty block changes nothing: no plucks are applied, no string
    /// advances, and the telemetry phase stays put.
    pub fn render_block(&mut self, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }

        self.backend.prepare();

        let backend = &mut self.backend;
        self.control.drain(|event| match event {
            ControlEvent::Pluck { voice } => backend.pluck(voice),
        });

        self.backend.render(out);
        self.advance_telemetry(out.len());
    }

    /// Host-style entry point taking one slice per output channel.
    ///
    /// Only mono is rendered. Any other channel count silences every supplied
    /// channel and reports [`EngineError::UnsupportedTopology`]; the engine
    /// state is left untouched.
    pub fn process(&mut self, outputs: &mut [&mut [f32]]) -> Result<(), EngineError> {
        if outputs.len() == 1 {
            self.render_block(&mut *outputs[0]);
            return Ok(());
        }

        for channel in outputs.iter_mut() {
            channel.fill(0.0);
        }
        Err(EngineError::UnsupportedTopology {
            channels: outputs.len(),
        })
    }

    /// Restart one string. Out-of-range indices are ignored.
    ///
    /// Safe to call from inside the render callback.
    pub fn pluck(&mut self, index: usize) {
        self.backend.pluck(index);
    }

    fn advance_telemetry(&mut self, frames: usize) {
        if !self.telemetry.is_enabled() {
            return;
        }

        self.telemetry_counter += frames;
        if self.telemetry_counter < self.telemetry_interval {
            return;
        }
        // Keep the remainder so the schedule does not drift
        self.telemetry_counter %= self.telemetry_interval;

        for voice in 0..self.backend.voice_count() {
            self.telemetry.publish(TelemetryEvent {
                voice,
                amplitude: self.backend.amplitude(voice),
                vibration: self.backend.vibration(voice),
            });
        }
    }

    pub fn voice_count(&self) -> usize {
        self.backend.voice_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples between analysis ticks.
    pub fn telemetry_interval(&self) -> usize {
        self.telemetry_interval
    }

    /// Samples rendered since the last analysis tick.
    pub fn telemetry_phase(&self) -> usize {
        self.telemetry_counter
    }

    pub fn backend_state(&self) -> BackendState {
        self.backend.state()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn amplitude(&self, index: usize) -> f32 {
        self.backend.amplitude(index)
    }

    pub fn vibration(&self, index: usize) -> f32 {
        self.backend.vibration(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::control_queue;
    use rtrb::RingBuffer;

    #[test]
    fn queued_plucks_land_before_the_block() {
        let (mut tx, rx) = control_queue(16);
        let mut engine = Engine::builder(EngineConfig::new(44_100, vec![440.0]))
            .handshake(Handshake::ControlIn(rx))
            .build()
            .unwrap();

        tx.pluck(0).unwrap();
        let mut out = [0.0f32; 1];
        engine.render_block(&mut out);

        assert_eq!(out[0], engine.bank().excitation().as_slice()[0]);
        assert_eq!(engine.bank().voice(0).unwrap().excitation_cursor(), 1);
    }

    #[test]
    fn disabled_telemetry_ignores_sink() {
        let (producer, mut consumer) = RingBuffer::<TelemetryEvent>::new(64);
        let mut engine = Engine::builder(EngineConfig::new(48_000, vec![440.0]))
            .telemetry_sink(producer)
            .build()
            .unwrap();

        let mut out = vec![0.0; 1_000];
        engine.render_block(&mut out);
        assert!(consumer.pop().is_err());
        assert_eq!(engine.telemetry_phase(), 0);
    }

    #[test]
    fn handshake_queue_wins_over_message_sink() {
        let (writer, mut reader) = crate::channel::telemetry_queue(16);
        let (producer, mut consumer) = RingBuffer::<TelemetryEvent>::new(16);
        let mut engine = Engine::builder(EngineConfig::new(600, vec![100.0]).telemetry(true))
            .handshake(Handshake::TelemetryOut(writer))
            .telemetry_sink(producer)
            .build()
            .unwrap();

        let mut out = vec![0.0; 10];
        engine.render_block(&mut out);
        assert!(reader.read().is_some());
        assert!(consumer.pop().is_err());
    }
}
