//! String panel - one row per string: amplitude bar and a vibration marker

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use karplus_dsp::channel::TelemetryShadow;

use super::SessionInfo;

const BAR_WIDTH: usize = 24;
const TRACK_WIDTH: usize = 32;
/// Below this amplitude the marker is drawn as resting.
const AT_REST: f32 = 1e-3;

pub fn render_strings(frame: &mut Frame, area: Rect, session: &SessionInfo, shadow: &TelemetryShadow) {
    let block = Block::default().title(" Strings ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !session.telemetry {
        let note = Paragraph::new(" telemetry disabled").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(note, inner);
        return;
    }

    let rows = inner.height as usize;
    let lines: Vec<Line> = session
        .frequencies
        .iter()
        .enumerate()
        .take(rows)
        .map(|(voice, &f0)| string_line(voice, f0, shadow.amplitude(voice), shadow.vibration(voice)))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn string_line(voice: usize, f0: f32, amplitude: f32, vibration: f32) -> Line<'static> {
    let filled = ((amplitude.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

    let track: String = if amplitude > AT_REST {
        let at = ((vibration.clamp(0.0, 1.0) * TRACK_WIDTH as f32) as usize).min(TRACK_WIDTH - 1);
        (0..TRACK_WIDTH).map(|i| if i == at { '●' } else { '─' }).collect()
    } else {
        "─".repeat(TRACK_WIDTH)
    };

    let colour = if amplitude > 0.5 {
        Color::Red
    } else if amplitude > 0.1 {
        Color::Yellow
    } else {
        Color::Green
    };

    Line::from(vec![
        Span::styled(format!(" {voice:>3} "), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{f0:>7.1}Hz "), Style::default().fg(Color::Cyan)),
        Span::styled(bar, Style::default().fg(colour)),
        Span::styled(format!(" {amplitude:.3} "), Style::default().fg(Color::White)),
        Span::styled(track, Style::default().fg(Color::Magenta)),
    ])
}
