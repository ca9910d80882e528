//! Episode list for one show

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{List, ListItem, ListState as WidgetListState, Paragraph, Wrap},
    Frame,
};

use super::{panel, placeholder, Theme};
use crate::app::EpisodesView;

pub fn render(frame: &mut Frame, area: Rect, view: &EpisodesView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let about = Paragraph::new(view.show.description.as_str())
        .style(Theme::dimmed())
        .wrap(Wrap { trim: true })
        .block(panel(format!(" {} ", view.show), false));
    frame.render_widget(about, chunks[0]);

    let block = panel(format!(" EPISODES ({}) ", view.show.episodes.len()), true);
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    if view.show.episodes.is_empty() {
        let (text, style) = match view.loading.message() {
            Some(msg) if view.loading.is_loading() => (format!("⟳ {}", msg), Theme::loading()),
            Some(msg) => (msg.to_string(), Theme::error()),
            None => ("This feed has no episodes".to_string(), Theme::dimmed()),
        };
        placeholder(frame, inner, &text, style);
        return;
    }

    let items: Vec<ListItem> = view
        .show
        .episodes
        .iter()
        .enumerate()
        .map(|(i, episode)| {
            let selected = i == view.list.selected;
            let mut spans = vec![
                Span::styled(if selected { "▸ " } else { "  " }, Theme::marker(selected)),
                Span::styled(format!("{:>8} ", episode.duration), Theme::duration()),
                Span::styled(episode.title.as_str(), Theme::row(selected)),
            ];
            if !episode.is_playable() {
                spans.push(Span::styled("  (no audio)", Theme::dimmed()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = WidgetListState::default().with_selected(Some(view.list.selected));
    frame.render_stateful_widget(List::new(items).style(Theme::text()), inner, &mut state);
}
