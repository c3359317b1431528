//! TUI module for karplus
//!
//! Per-string telemetry bars, a spectrum of the mixed output, and the keys
//! that pluck strings.

mod spectrum;
mod strings;
mod transport;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use karplus_dsp::{
    channel::{ParamReader, PluckSender, TelemetryShadow},
    dsp::noise::Xorshift128,
};

use crate::BackendChoice;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use strings::render_strings;
use transport::{render_transport, AudioStats};

/// Audio visualization buffer size (also the FFT length).
pub const VIS_BUFFER_SIZE: usize = 2048;

/// Space plucks a random string among this many.
const RANDOM_PLUCK_SPAN: usize = 10;

/// Session facts fixed once the stream is up.
pub struct SessionInfo {
    pub sample_rate: u32,
    pub frequencies: Vec<f32>,
    pub backend: BackendChoice,
    pub telemetry: bool,
}

/// UI application state
pub struct UiApp {
    session: SessionInfo,
    plucks: PluckSender,
    telemetry: ParamReader,
    /// Latest value per telemetry slot
    shadow: TelemetryShadow,
    audio_rx: Consumer<f32>,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    rng: Xorshift128,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        session: SessionInfo,
        plucks: PluckSender,
        telemetry: ParamReader,
        audio_rx: Consumer<f32>,
    ) -> Self {
        let voices = session.frequencies.len();
        let spectrum = SpectrumAnalyzer::new(VIS_BUFFER_SIZE, session.sample_rate as f32);
        Self {
            session,
            plucks,
            telemetry,
            shadow: TelemetryShadow::new(voices),
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum,
            rng: Xorshift128::new(0x5eed),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.telemetry.drain_into(&mut self.shadow);
            self.spectrum.update(&self.audio_buffer);

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE samples pushed by the audio callback.
    fn poll_audio(&mut self) {
        let available = self.audio_rx.slots();
        if available == 0 {
            return;
        }
        if let Ok(chunk) = self.audio_rx.read_chunk(available) {
            let (first, second) = chunk.as_slices();
            self.audio_buffer.extend_from_slice(first);
            self.audio_buffer.extend_from_slice(second);
            chunk.commit_all();
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let voices = self.session.frequencies.len();
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                let span = voices.min(RANDOM_PLUCK_SPAN);
                if span > 0 {
                    let voice = self.rng.next_below(span);
                    let _ = self.plucks.pluck(voice);
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                for voice in 0..voices {
                    if self.plucks.pluck(voice).is_err() {
                        break;
                    }
                }
            }
            KeyCode::Char(c) => {
                if let Some(digit) = c.to_digit(10) {
                    let _ = self.plucks.pluck(digit as usize);
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: transport, strings, spectrum, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Transport bar
                Constraint::Min(6),     // Strings
                Constraint::Length(10), // Spectrum
                Constraint::Length(1),  // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(frame, chunks[0], &self.session, self.plucks.dropped(), &stats);
        render_strings(frame, chunks[1], &self.session, &self.shadow);
        render_spectrum(frame, chunks[2], &self.spectrum);

        let help = Paragraph::new(" [Q] Quit  [Space] Pluck random  [A] Pluck all  [0-9] Pluck string")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
