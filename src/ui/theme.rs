use ratatui::style::{Color, Modifier, Style};

use crate::app::state::Severity;
use crate::config::ThemeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight: Color,
    pub tag: Color,
    pub selection: Color,
    pub success: Color,
    pub info: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self {
                background: Color::Rgb(250, 250, 250),
                foreground: Color::Rgb(33, 33, 33),
                muted: Color::Rgb(117, 117, 117),
                accent: Color::Rgb(25, 118, 210),
                highlight: Color::Rgb(255, 213, 79),
                tag: Color::Rgb(46, 125, 50),
                selection: Color::Rgb(187, 222, 251),
                success: Color::Rgb(46, 125, 50),
                info: Color::Rgb(2, 136, 209),
                warning: Color::Rgb(237, 108, 2),
                error: Color::Rgb(211, 47, 47),
            },
            ThemeMode::Dark => Self {
                background: Color::Rgb(18, 18, 18),
                foreground: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(158, 158, 158),
                accent: Color::Rgb(144, 202, 249),
                highlight: Color::Rgb(255, 202, 40),
                tag: Color::Rgb(129, 199, 132),
                selection: Color::Rgb(55, 71, 79),
                success: Color::Rgb(102, 187, 106),
                info: Color::Rgb(41, 182, 246),
                warning: Color::Rgb(255, 167, 38),
                error: Color::Rgb(244, 67, 54),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            self.muted()
        }
    }

    pub fn match_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Success => self.success,
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }
}
