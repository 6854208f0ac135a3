use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use serde::Deserialize;
use serde::Serialize;

/// Built-in palettes selectable from the config file or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// Styles shared by the history cells and the split-pane chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Style,
    pub muted: Style,
    pub dim: Style,
    pub error: Style,
    pub success: Style,
    pub thinking: Style,
    pub user_message: Style,
}

impl Theme {
    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            accent: Style::default().fg(Color::Cyan),
            muted: Style::default().fg(Color::DarkGray),
            dim: Style::default().add_modifier(Modifier::DIM),
            error: Style::default().fg(Color::Red),
            success: Style::default().fg(Color::Green),
            thinking: Style::default()
                .add_modifier(Modifier::DIM)
                .add_modifier(Modifier::ITALIC),
            user_message: Style::default().bg(Color::Rgb(0x34, 0x34, 0x3a)),
        }
    }

    pub fn light() -> Self {
        Self {
            accent: Style::default().fg(Color::Blue),
            muted: Style::default().fg(Color::Gray),
            dim: Style::default().add_modifier(Modifier::DIM),
            error: Style::default().fg(Color::Red),
            success: Style::default().fg(Color::Green),
            thinking: Style::default()
                .add_modifier(Modifier::DIM)
                .add_modifier(Modifier::ITALIC),
            user_message: Style::default().bg(Color::Rgb(0xee, 0xee, 0xf0)),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Border emphasis for a pane: accent while it holds focus, muted otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderTone {
    Accent,
    Muted,
}

impl BorderTone {
    pub fn for_focus(focused: bool) -> Self {
        if focused {
            BorderTone::Accent
        } else {
            BorderTone::Muted
        }
    }

    pub fn resolve(self, theme: &Theme) -> Style {
        match self {
            BorderTone::Accent => theme.accent,
            BorderTone::Muted => theme.muted,
        }
    }
}
