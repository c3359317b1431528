//! Spectrum widget
//!
//! FFT of the mixed output folded into linear bands up to a few kHz, where
//! the string fundamentals and their first partials sit.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Upper edge of the displayed range (Hz).
const DISPLAY_MAX_HZ: f32 = 4_000.0;
/// Bands below this level are drawn empty.
const FLOOR_DB: f32 = -80.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    /// Hann window
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// Power in dB for bins `0..len/2`
    power_db: Vec<f32>,
    hz_per_bin: f32,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft_len = fft_len.max(2);
        let fft = FftPlanner::new().plan_fft_forward(fft_len);
        let denom = (fft_len - 1) as f32;
        let window = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            power_db: vec![FLOOR_DB; fft_len / 2],
            hz_per_bin: sample_rate.max(1.0) / fft_len as f32,
        }
    }

    /// Recompute from the latest samples. Buffers of the wrong length are ignored.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (db, bin) in self.power_db.iter_mut().zip(&self.scratch) {
            *db = 10.0 * bin.norm_sqr().max(1e-12).log10();
        }
    }

    /// Loudest bin in each of `count` equal-width bands from 0 to `max_hz`.
    pub fn bands(&self, count: usize, max_hz: f32) -> Vec<f32> {
        let usable = ((max_hz / self.hz_per_bin) as usize).clamp(1, self.power_db.len().max(1));
        (0..count)
            .map(|band| {
                let start = band * usable / count.max(1);
                let end = ((band + 1) * usable / count.max(1)).max(start + 1);
                self.power_db
                    .get(start..end.min(self.power_db.len()))
                    .and_then(|bins| bins.iter().copied().reduce(f32::max))
                    .unwrap_or(FLOOR_DB)
            })
            .collect()
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, analyzer: &SpectrumAnalyzer) {
    let block = Block::default()
        .title(format!(" Spectrum 0-{:.0}kHz ", DISPLAY_MAX_HZ / 1000.0))
        .borders(Borders::ALL);
    let width = block.inner(area).width as usize;

    let bars: Vec<Bar> = analyzer
        .bands(width.max(1), DISPLAY_MAX_HZ)
        .into_iter()
        .map(|db| {
            let height = (db - FLOOR_DB).max(0.0) as u64;
            Bar::default().value(height).text_value(String::new())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max((-FLOOR_DB + 40.0) as u64)
        .bar_style(Style::default().fg(Color::Green));

    frame.render_widget(chart, area);
}
