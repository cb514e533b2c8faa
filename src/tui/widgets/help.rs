//! Key binding reference popup

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget},
};

use super::popup_area;
use crate::tui::theme::Theme;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const WIDTH: u16 = 44;
const KEY_WIDTH: usize = 18;

const NAVIGATION: &[(&str, &str)] = &[
    ("Tab / Shift+Tab", "Switch view"),
    ("1-4", "Jump to view"),
    ("Up/Down or j/k", "Move selection"),
    ("t", "Cycle time range"),
];

const DELETE: (&str, &str) = ("x", "Delete selected row");

const GENERAL: &[(&str, &str)] = &[
    ("r", "Reload from server"),
    ("q / Esc", "Quit"),
    ("?", "Toggle help"),
];

pub struct HelpPopup {
    /// List the delete key (only when the session may delete something)
    can_delete: bool,
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self {
            can_delete: false,
            theme,
        }
    }

    pub fn with_delete(mut self, can_delete: bool) -> Self {
        self.can_delete = can_delete;
        self
    }

    /// Where the popup goes on a `screen`-sized frame
    pub fn area(&self, screen: Rect) -> Rect {
        // border + padding row above and below the text
        popup_area(screen, WIDTH, self.lines().len() as u16 + 4)
    }

    fn general(&self) -> Vec<(&'static str, &'static str)> {
        let mut bindings = Vec::with_capacity(GENERAL.len() + 1);
        if self.can_delete {
            bindings.push(DELETE);
        }
        bindings.extend_from_slice(GENERAL);
        bindings
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let sections = [("Navigation", NAVIGATION.to_vec()), ("General", self.general())];
        for (title, bindings) in sections {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::from(Span::styled(
                title,
                Style::default()
                    .fg(self.theme.date())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "─".repeat(WIDTH as usize - 4),
                Style::default().fg(self.theme.muted()),
            )));
            for (key, desc) in bindings {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:<w$}", key, w = KEY_WIDTH),
                        Style::default().fg(self.theme.accent()),
                    ),
                    Span::styled(desc, Style::default().fg(self.theme.text())),
                ]));
            }
        }
        lines.push(Line::default());
        lines.push(
            Line::from(Span::styled(
                "Press ? to close",
                Style::default().fg(self.theme.muted()),
            ))
            .alignment(Alignment::Center),
        );
        lines
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .title(format!(" milktrack v{} ", VERSION))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()))
            .padding(Padding::new(1, 1, 1, 1));
        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(popup: HelpPopup) -> String {
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        let popup_area = popup.area(area);
        popup.render(popup_area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_help_lists_bindings() {
        let text = screen(HelpPopup::new(Theme::Dark));
        assert!(text.contains("milktrack v"));
        assert!(text.contains("Cycle time range"));
        assert!(text.contains("Reload from server"));
        assert!(text.contains("Press ? to close"));
        assert!(!text.contains("Delete selected row"));
    }

    #[test]
    fn test_help_lists_delete_when_allowed() {
        let text = screen(HelpPopup::new(Theme::Light).with_delete(true));
        assert!(text.contains("Delete selected row"));
    }

    #[test]
    fn test_help_area_grows_with_delete() {
        let screen = Rect::new(0, 0, 100, 50);
        let plain = HelpPopup::new(Theme::Dark).area(screen);
        let with_delete = HelpPopup::new(Theme::Dark).with_delete(true).area(screen);
        assert_eq!(plain.width, WIDTH);
        assert_eq!(with_delete.height, plain.height + 1);
    }
}
