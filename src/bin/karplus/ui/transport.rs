//! Transport bar widget - shows device rate, string count, backend and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::SessionInfo;
use crate::BackendChoice;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    session: &SessionInfo,
    dropped_plucks: u64,
    stats: &AudioStats,
) {
    let block = Block::default().title(" karplus ").borders(Borders::ALL);

    let backend = match session.backend {
        BackendChoice::InProcess => "in-process",
        BackendChoice::Module => "module",
    };
    let telemetry = if session.telemetry { "on" } else { "off" };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} strings  ", session.frequencies.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{backend}  "), Style::default().fg(Color::Green)),
        Span::styled(
            format!("telemetry {telemetry}  "),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1}kHz  ", session.sample_rate as f32 / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("dropped {dropped_plucks}  "),
            Style::default().fg(if dropped_plucks > 0 {
                Color::Yellow
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
