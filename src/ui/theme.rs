//! Color palette and style helpers for PodTUI
//!
//! Warm amber on charcoal, with teal for interactive focus.

use ratatui::style::{Color, Modifier, Style};

use crate::models::TransportState;

/// Application palette
pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // CORE PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #121212
    pub const BACKGROUND: Color = Color::Rgb(0x12, 0x12, 0x12);

    /// Primary: #ffb000 (amber)
    pub const PRIMARY: Color = Color::Rgb(0xff, 0xb0, 0x00);

    /// Secondary: #2ec4b6 (teal)
    pub const SECONDARY: Color = Color::Rgb(0x2e, 0xc4, 0xb6);

    /// Text: #e8e3d9
    pub const TEXT: Color = Color::Rgb(0xe8, 0xe3, 0xd9);

    /// Dim: #5c5a55
    pub const DIM: Color = Color::Rgb(0x5c, 0x5a, 0x55);

    pub const SUCCESS: Color = Color::Rgb(0x7c, 0xd9, 0x5c);
    pub const WARNING: Color = Color::Rgb(0xff, 0x8c, 0x42);
    pub const ERROR: Color = Color::Rgb(0xef, 0x47, 0x6f);

    /// Border color (dim amber)
    pub const BORDER: Color = Color::Rgb(0x80, 0x5c, 0x10);

    // ═══════════════════════════════════════════════════════════════════════
    // STYLE HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND)
    }

    /// Selected row (inverted amber)
    pub fn highlighted() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR).add_modifier(Modifier::BOLD)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn secondary() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default()
            .fg(Self::SECONDARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn marker(selected: bool) -> Style {
        if selected {
            Style::default().fg(Self::SECONDARY).add_modifier(Modifier::BOLD)
        } else {
            Self::dimmed()
        }
    }

    pub fn row(selected: bool) -> Style {
        if selected {
            Self::highlighted()
        } else {
            Self::text()
        }
    }

    pub fn keybind() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::DIM)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Color::Rgb(0x1e, 0x1e, 0x1e))
    }

    pub fn loading() -> Style {
        Style::default()
            .fg(Self::WARNING)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn duration() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    pub fn button(focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(Self::BACKGROUND)
                .bg(Self::SECONDARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Self::TEXT)
        }
    }

    pub fn gauge() -> Style {
        Style::default().fg(Self::PRIMARY).bg(Self::BACKGROUND)
    }

    /// Color-coded transport state badge
    pub fn transport(state: TransportState) -> Style {
        let color = match state {
            TransportState::Playing => Self::SUCCESS,
            TransportState::Paused | TransportState::Ready => Self::PRIMARY,
            TransportState::Downloading => Self::WARNING,
            TransportState::Failed => Self::ERROR,
            TransportState::Idle | TransportState::Stopped => Self::DIM,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
