//! Terminal UI components
//!
//! Built with ratatui. Only the top of the view stack is drawn; the header,
//! status bar and error popup are shared by every view.

pub mod episodes;
pub mod player;
pub mod shows;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, InputMode, View, ViewKind};

/// Main render function - dispatches to the active view
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BACKGROUND)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    match app.views().top() {
        None => shows::render(frame, chunks[1], &app.views().root().search),
        Some(View::Episodes(view)) => episodes::render(frame, chunks[1], view),
        Some(View::Detail(view)) => player::render(frame, chunks[1], view),
    }
    render_status_bar(frame, chunks[2], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Logo plus search box (or breadcrumb outside the show list)
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(12), Constraint::Min(1)])
        .split(area);

    let logo = Paragraph::new(Line::from(vec![
        Span::styled("POD", Theme::title()),
        Span::styled("TUI", Theme::secondary()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(logo, header_chunks[0]);

    let editing = app.input_mode == InputMode::Editing;
    let (title, text) = match app.views().top() {
        None => {
            let search = &app.views().root().search;
            let text = if editing {
                let (before, after) = search.split_at_cursor();
                format!("⌕ {}│{}", before, after)
            } else if search.query.is_empty() {
                "⌕ Press / to search podcasts...".to_string()
            } else {
                format!("⌕ {}", search.query)
            };
            (" SEARCH ", text)
        }
        Some(View::Episodes(view)) => (" SHOW ", view.show.title.clone()),
        Some(View::Detail(view)) => (
            " NOW VIEWING ",
            format!("{} › {}", view.show_title, view.session.episode().title),
        ),
    };

    let search_box = Paragraph::new(text)
        .style(if editing {
            Theme::text().fg(Theme::PRIMARY)
        } else {
            Theme::text()
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if editing {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(title, Theme::title())),
        );
    frame.render_widget(search_box, header_chunks[1]);
}

/// Key help for the active view
pub fn help_text(kind: ViewKind, mode: &InputMode) -> &'static str {
    match (mode, kind) {
        (InputMode::Editing, _) => " Enter:search  Esc:cancel ",
        (_, ViewKind::Shows) => " q:quit  /:search  ↑↓:move  Enter:open ",
        (_, ViewKind::Episodes) => " q:quit  ↑↓:move  Enter:open  r:refresh  Esc:back ",
        (_, ViewKind::Detail) => " q:quit  p:play  space:pause  s:stop  ←→:focus  Esc:back ",
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode_indicator = match app.input_mode {
        InputMode::Normal => Span::styled(
            " NORMAL ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::PRIMARY),
        ),
        InputMode::Editing => Span::styled(
            " INSERT ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::SECONDARY),
        ),
    };

    let kind = app.views().active();
    let view_indicator = Span::styled(format!(" {} ", kind.label()), Theme::dimmed());

    let status_line = Line::from(vec![
        mode_indicator,
        view_indicator,
        Span::raw("│"),
        Span::styled(help_text(kind, &app.input_mode), Theme::dimmed()),
    ]);

    frame.render_widget(Paragraph::new(status_line).style(Theme::status_bar()), area);
}

fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(popup, popup_area);
}

/// Centered one-line placeholder inside a panel
pub(crate) fn placeholder(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(style)
            .alignment(Alignment::Center),
        area,
    );
}

/// Rounded panel with a styled title
pub(crate) fn panel(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(title, Theme::title()))
}
