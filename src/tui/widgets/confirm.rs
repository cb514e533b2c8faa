//! Delete confirmation popup widget

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::popup_area;
use crate::tui::theme::Theme;

const POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 7;

/// What a confirmed delete removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Entry(i64),
    User(i64),
}

/// State for the delete confirmation dialog
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmState {
    pub target: DeleteTarget,
    /// Shown in the question, e.g. "entry #4 (Cow, 2024-01-15)"
    pub label: String,
    /// 0 = Yes, 1 = No (default)
    pub selection: u8,
}

impl ConfirmState {
    pub fn new(target: DeleteTarget, label: impl Into<String>) -> Self {
        Self {
            target,
            label: label.into(),
            selection: 1,
        }
    }

    pub fn toggle(&mut self) {
        self.selection = 1 - self.selection.min(1);
    }

    pub fn is_yes(&self) -> bool {
        self.selection == 0
    }
}

/// Delete confirmation popup overlay
pub struct ConfirmPopup<'a> {
    state: &'a ConfirmState,
    theme: Theme,
}

impl<'a> ConfirmPopup<'a> {
    pub fn new(state: &'a ConfirmState, theme: Theme) -> Self {
        Self { state, theme }
    }

    pub fn centered_area(area: Rect) -> Rect {
        popup_area(area, POPUP_WIDTH, POPUP_HEIGHT)
    }

    fn button(&self, label: &'static str, selected: bool) -> [Span<'static>; 2] {
        let (marker, style) = if selected {
            (
                "▸ ",
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(self.theme.muted()))
        };
        [Span::styled(marker, style), Span::styled(label, style)]
    }
}

impl Widget for ConfirmPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(" Delete? ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.error()));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1), // [0] Padding
            Constraint::Length(1), // [1] Question
            Constraint::Length(1), // [2] Padding
            Constraint::Length(1), // [3] Buttons
            Constraint::Length(1), // [4] Key hints
        ])
        .split(inner);

        let question = Line::from(Span::styled(
            format!("Delete {}?", self.state.label),
            Style::default().fg(self.theme.text()),
        ));
        Paragraph::new(question)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let mut buttons: Vec<Span> = self.button("Yes", self.state.is_yes()).into();
        buttons.push(Span::raw("       "));
        buttons.extend(self.button("No", !self.state.is_yes()));
        Paragraph::new(Line::from(buttons))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let hint_style = Style::default().fg(self.theme.muted());
        let hint_line = Line::from(vec![
            Span::styled("←→", hint_style.add_modifier(Modifier::BOLD)),
            Span::styled(" Select  ", hint_style),
            Span::styled("Enter", hint_style.add_modifier(Modifier::BOLD)),
            Span::styled(" Confirm", hint_style),
        ]);
        Paragraph::new(hint_line)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_defaults_to_no() {
        let state = ConfirmState::new(DeleteTarget::Entry(1), "entry #1");
        assert_eq!(state.selection, 1);
        assert!(!state.is_yes());
    }

    #[test]
    fn test_confirm_toggle() {
        let mut state = ConfirmState::new(DeleteTarget::User(2), "user bob");
        state.toggle();
        assert!(state.is_yes());
        state.toggle();
        assert!(!state.is_yes());
    }

    #[test]
    fn test_confirm_renders_label() {
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        let state = ConfirmState::new(DeleteTarget::Entry(4), "entry #4");
        ConfirmPopup::new(&state, Theme::Dark).render(ConfirmPopup::centered_area(area), &mut buf);

        let content: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Delete?"));
        assert!(content.contains("entry #4"));
        assert!(content.contains("Yes"));
        assert!(content.contains("No"));
    }
}
