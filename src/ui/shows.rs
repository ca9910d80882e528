//! Show list (root view)

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem, ListState as WidgetListState},
    Frame,
};

use super::{panel, placeholder, Theme};
use crate::app::SearchState;

pub fn render(frame: &mut Frame, area: Rect, search: &SearchState) {
    let block = panel(format!(" SHOWS ({}) ", search.results.len()), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(msg) = search.loading.message().filter(|_| search.loading.is_loading()) {
        placeholder(frame, inner, &format!("⟳ {}", msg), Theme::loading());
        return;
    }

    if search.results.is_empty() {
        let text = match search.loading.message() {
            Some(err) => err,
            None if search.query.trim().is_empty() => "Press / and type to search for podcasts...",
            None => "No shows found",
        };
        placeholder(frame, inner, text, Theme::dimmed());
        return;
    }

    let items: Vec<ListItem> = search
        .results
        .iter()
        .enumerate()
        .map(|(i, show)| {
            let selected = i == search.list.selected;
            let mut spans = vec![
                Span::styled(if selected { "▸ " } else { "  " }, Theme::marker(selected)),
                Span::styled(show.title.as_str(), Theme::row(selected)),
            ];
            if let Some(author) = &show.author {
                spans.push(Span::styled(format!("  {}", author), Theme::secondary()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    // Widget state keeps the selection scrolled into view
    let mut state = WidgetListState::default().with_selected(Some(search.list.selected));
    frame.render_stateful_widget(List::new(items).style(Theme::text()), inner, &mut state);
}
