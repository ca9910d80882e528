//! Episode detail and player
//!
//! Shows the episode text, the session's transport state, elapsed time and
//! the button row. The progress gauge only appears when the episode length
//! is known.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Wrap},
    Frame,
};

use super::{panel, Theme};
use crate::app::{DetailButton, DetailView};
use crate::models::{format_clock, progress_ratio};

pub fn render(frame: &mut Frame, area: Rect, view: &DetailView) {
    let session = &view.session;
    let episode = session.episode();

    let block = panel(format!(" {} ", episode.title), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Description
            Constraint::Length(2), // Transport state
            Constraint::Length(1), // Progress
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Buttons
        ])
        .split(inner);

    let description = if episode.description.is_empty() {
        "No description available"
    } else {
        episode.description.as_str()
    };
    frame.render_widget(
        Paragraph::new(description)
            .style(Theme::text())
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let state = session.state();
    let mut status = vec![Line::from(vec![
        Span::styled(format!("● {}", state), Theme::transport(state)),
        Span::styled(format!("   {}", view.show_title), Theme::dimmed()),
    ])];
    if let Some(err) = session.last_error() {
        status.push(Line::from(Span::styled(err, Theme::error())));
    } else if !episode.is_playable() {
        status.push(Line::from(Span::styled("This episode has no audio", Theme::dimmed())));
    }
    frame.render_widget(Paragraph::new(status), chunks[1]);

    render_progress(frame, chunks[2], view);
    render_buttons(frame, chunks[4], view);
}

fn render_progress(frame: &mut Frame, area: Rect, view: &DetailView) {
    let duration = view.session.episode().duration;
    let elapsed = view.session.elapsed().unwrap_or_default();
    let label = format!("{} / {}", format_clock(elapsed.as_secs()), duration);

    match progress_ratio(elapsed, duration) {
        Some(ratio) => {
            let gauge = Gauge::default()
                .gauge_style(Theme::gauge())
                .ratio(ratio)
                .label(label);
            frame.render_widget(gauge, area);
        }
        None => frame.render_widget(
            Paragraph::new(label)
                .style(Theme::duration())
                .alignment(Alignment::Center),
            area,
        ),
    }
}

fn render_buttons(frame: &mut Frame, area: Rect, view: &DetailView) {
    let state = view.session.state();
    let mut spans = Vec::with_capacity(DetailButton::ALL.len() * 2);
    for button in DetailButton::ALL {
        spans.push(Span::styled(
            format!(" {} ", button.label(state)),
            Theme::button(button == view.focus),
        ));
        spans.push(Span::raw("  "));
    }
    spans.pop();

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}
