//! App - output stream setup and the hand-off to the UI

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::{error, info};

use karplus_dsp::{
    backend::ArenaModule,
    channel::{control_queue, telemetry_queue, Handshake},
    Engine, EngineConfig, RenderBackend, MAX_BLOCK_SIZE,
};

use super::ui::{SessionInfo, UiApp, VIS_BUFFER_SIZE};
use super::BackendChoice;

/// Pending plucks the UI may queue before the audio thread catches up.
const PLUCK_QUEUE_LEN: usize = 256;
/// Analysis ticks the telemetry queue can hold before records are dropped.
const TELEMETRY_TICKS_BUFFERED: usize = 8;
/// Capacity in visualization blocks for the audio→UI sample ring.
const AUDIO_RING_BLOCKS: usize = 16;

/// Main application: owns the config until the stream starts.
pub struct App {
    config: EngineConfig,
    backend: BackendChoice,
}

impl App {
    pub fn new(config: EngineConfig, backend: BackendChoice) -> Self {
        Self { config, backend }
    }

    /// Open the default output device, start the engine in its callback, and
    /// run the UI until the user quits.
    pub fn run(mut self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        self.config.sample_rate = supported.sample_rate().0;
        let stream_config: cpal::StreamConfig = supported.into();
        let voices = self.config.voice_count();
        info!(
            sample_rate = self.config.sample_rate,
            channels = stream_config.channels,
            voices,
            backend = ?self.backend,
            "output device opened"
        );

        // --- Cross-thread rings ---
        let (plucks, pluck_rx) = control_queue(PLUCK_QUEUE_LEN);
        let (telemetry_tx, telemetry_rx) = telemetry_queue(voices * 2 * TELEMETRY_TICKS_BUFFERED);
        let (audio_tx, audio_rx) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * AUDIO_RING_BLOCKS);

        let builder = Engine::builder(self.config.clone())
            .handshake(Handshake::ControlIn(pluck_rx))
            .handshake(Handshake::TelemetryOut(telemetry_tx));
        let gain = 0.5 / (voices as f32).sqrt();

        let stream = match self.backend {
            BackendChoice::InProcess => {
                let engine = builder.build()?;
                build_stream(&device, &stream_config, engine, gain, audio_tx)?
            }
            BackendChoice::Module => {
                let (engine, installer) = builder.build_foreign()?;
                let stream = build_stream(&device, &stream_config, engine, gain, audio_tx)?;
                // The stream is already running silent; the module joins when ready
                let module = ArenaModule::new()
                    .with_seed(self.config.seed)
                    .with_amplitude_mode(self.config.amplitude_mode);
                installer.install(Box::new(module))?;
                stream
            }
        };
        stream.play().wrap_err("failed to start output stream")?;

        let session = SessionInfo {
            sample_rate: self.config.sample_rate,
            frequencies: self.config.frequencies.clone(),
            backend: self.backend,
            telemetry: self.config.telemetry,
        };

        let mut terminal = ratatui::init();
        let result = UiApp::new(session, plucks, telemetry_rx, audio_rx).run(&mut terminal);
        ratatui::restore();
        result
    }
}

fn build_stream<B: RenderBackend + 'static>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine<B>,
    gain: f32,
    mut audio_tx: Producer<f32>,
) -> EyreResult<cpal::Stream> {
    let channels = config.channels.max(1) as usize;
    // Buffer reused by audio callback
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    engine.render_block(block);

                    // Duplicate mono to all channels and write to device
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let start = out_off + i * channels;
                        data[start..start + channels].fill(s * gain);
                    }

                    // Push to UI ring, non-blocking (drop on overflow)
                    for &s in block.iter() {
                        if audio_tx.push(s).is_err() {
                            break;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!(%err, "audio stream error"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    Ok(stream)
}
