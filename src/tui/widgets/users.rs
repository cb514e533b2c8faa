//! Users view widget - account list for administrators

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::{centered, table_width_for, truncate, visible_columns, VISIBLE_ROWS};
use crate::tui::theme::Theme;
use crate::types::User;

const COL_ID: usize = 0;
const COL_USERNAME: usize = 1;
const COL_EMAIL: usize = 2;
const COL_PHONE: usize = 3;
const COL_ROLES: usize = 4;

const COLUMNS: [(&str, u16); 5] = [
    ("#", 8),
    ("Username", 24),
    ("Email", 32),
    ("Phone", 16),
    ("Roles", 20),
];

const HIDE_ORDER: [usize; 3] = [COL_PHONE, COL_ROLES, COL_ID];

/// Users view widget
pub struct UsersView<'a> {
    users: &'a [User],
    scroll_offset: usize,
    selected_index: Option<usize>,
    /// Signed-in user, marked "(you)"
    own_id: i64,
    theme: Theme,
}

impl<'a> UsersView<'a> {
    pub fn new(users: &'a [User], scroll_offset: usize, own_id: i64, theme: Theme) -> Self {
        Self {
            users,
            scroll_offset,
            selected_index: None,
            own_id,
            theme,
        }
    }

    pub fn with_selected_index(mut self, selected_index: Option<usize>) -> Self {
        self.selected_index = selected_index;
        self
    }
}

impl Widget for UsersView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered(area);
        let visible = visible_columns(&COLUMNS, &HIDE_ORDER, area.width);
        let tw = table_width_for(&COLUMNS, &visible);
        let visible_rows = self.users.len().min(VISIBLE_ROWS) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(1),            // Summary
            Constraint::Length(1),            // Header
            Constraint::Length(visible_rows), // Rows
            Constraint::Min(0),
        ])
        .split(area);

        let summary = if self.users.is_empty() {
            "No users found".to_string()
        } else {
            format!("{} users", self.users.len())
        };
        Paragraph::new(Line::from(Span::styled(
            summary,
            Style::default()
                .fg(self.theme.text())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        if self.users.is_empty() {
            return;
        }

        let table = |area: Rect| Rect {
            x: area.x + area.width.saturating_sub(tw) / 2,
            width: tw.min(area.width),
            ..area
        };

        let header_style = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);
        let header: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let (label, width) = COLUMNS[col];
                Span::styled(format!("  {:<w$}", label, w = width as usize - 2), header_style)
            })
            .collect();
        Paragraph::new(Line::from(header)).render(table(chunks[1]), buf);

        let rows = table(chunks[2]);
        let start = self.scroll_offset.min(self.users.len());
        let end = (start + rows.height as usize).min(self.users.len());
        for (i, user) in self.users[start..end].iter().enumerate() {
            let row = Rect {
                y: rows.y + i as u16,
                height: 1,
                ..rows
            };
            self.render_row(row, buf, user, &visible, self.selected_index == Some(start + i));
        }
    }
}

impl UsersView<'_> {
    fn render_row(
        &self,
        area: Rect,
        buf: &mut Buffer,
        user: &User,
        visible: &[usize],
        is_selected: bool,
    ) {
        let mut style = Style::default();
        if is_selected {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }

        let spans: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let w = COLUMNS[col].1 as usize - 2;
                let (text, color) = match col {
                    COL_ID => (user.id.to_string(), self.theme.muted()),
                    COL_USERNAME => {
                        let name = if user.id == self.own_id {
                            format!("{} (you)", user.username)
                        } else {
                            user.username.clone()
                        };
                        (name, self.theme.text())
                    }
                    COL_EMAIL => (user.email.clone(), self.theme.date()),
                    COL_PHONE => (
                        user.phone_number.clone().unwrap_or_else(|| "-".into()),
                        self.theme.muted(),
                    ),
                    _ => (user.role_labels(), self.theme.accent()),
                };
                let marker = if col == visible[0] && is_selected { "▸ " } else { "  " };
                Span::styled(format!("{}{:<w$}", marker, truncate(&text, w)), style.fg(color))
            })
            .collect();
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ROLE_ADMIN, ROLE_USER};

    fn user(id: i64, username: &str, role: &str) -> User {
        User {
            id,
            username: username.into(),
            email: format!("{}@example.com", username),
            phone_number: None,
            roles: vec![Role::named(role)],
        }
    }

    fn render(users: &[User], selected: Option<usize>) -> String {
        let area = Rect::new(0, 0, 120, 20);
        let mut buf = Buffer::empty(area);
        UsersView::new(users, 0, 1, Theme::Dark)
            .with_selected_index(selected)
            .render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_users_view_marks_self() {
        let users = vec![user(1, "admin", ROLE_ADMIN), user(2, "ravi", ROLE_USER)];
        let text = render(&users, Some(1));
        assert!(text.contains("2 users"));
        assert!(text.contains("admin (you)"));
        assert!(text.contains("ravi@example.com"));
        assert!(text.contains("▸ 2"));
        assert!(!text.contains("ravi (you)"));
    }

    #[test]
    fn test_users_view_empty() {
        let text = render(&[], None);
        assert!(text.contains("No users found"));
    }
}
