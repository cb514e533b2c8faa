//! Loading screen shown while a background job runs

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

const MIN_WIDTH: u16 = 35;
const MIN_HEIGHT: u16 = 5;

const APP_NAME: &str = "milktrack";
const TAGLINE: &str = "Milk collection dashboard";

/// What the background job is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStage {
    Fetching,
    Refreshing,
    Deleting,
}

impl LoadingStage {
    pub fn message(self) -> &'static str {
        match self {
            Self::Fetching => "Fetching entries...",
            Self::Refreshing => "Refreshing...",
            Self::Deleting => "Deleting...",
        }
    }
}

/// Full-screen loading indicator
pub struct Spinner {
    frame: usize,
    stage: LoadingStage,
    theme: Theme,
}

impl Spinner {
    pub fn new(frame: usize, stage: LoadingStage, theme: Theme) -> Self {
        Self {
            frame,
            stage,
            theme,
        }
    }

    fn glyph(&self) -> char {
        FRAMES[self.frame % FRAMES.len()]
    }

    pub fn next_frame(frame: usize) -> usize {
        (frame + 1) % FRAMES.len()
    }
}

impl Widget for Spinner {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < MIN_HEIGHT || area.width < MIN_WIDTH {
            return;
        }

        let lines = vec![
            Line::from(Span::styled(
                APP_NAME,
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(TAGLINE, Style::default().fg(self.theme.muted()))),
            Line::default(),
            Line::from(Span::styled(
                format!("{} {}", self.glyph(), self.stage.message()),
                Style::default().fg(self.theme.accent()),
            )),
        ];

        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(lines.len() as u16),
            Constraint::Fill(1),
        ])
        .areas(area);
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(middle, buf);
    }
}
