//! Tab bar widget for view navigation

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::services::Capabilities;
use crate::tui::theme::Theme;

/// Available tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Daily,
    Entries,
    Users,
}

const MEMBER_TABS: &[Tab] = &[Tab::Dashboard, Tab::Daily, Tab::Entries];
const ADMIN_TABS: &[Tab] = &[Tab::Dashboard, Tab::Daily, Tab::Entries, Tab::Users];

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Daily => "Daily",
            Self::Entries => "Entries",
            Self::Users => "Users",
        }
    }

    /// Tabs the given capabilities may open, in display order
    pub fn visible(caps: Capabilities) -> &'static [Tab] {
        if caps.can_manage_users {
            ADMIN_TABS
        } else {
            MEMBER_TABS
        }
    }

    /// Next tab in `tabs` (wrapping)
    pub fn next(self, tabs: &[Tab]) -> Self {
        match tabs.iter().position(|t| *t == self) {
            Some(i) => tabs[(i + 1) % tabs.len()],
            None => tabs.first().copied().unwrap_or_default(),
        }
    }

    /// Previous tab in `tabs` (wrapping)
    pub fn prev(self, tabs: &[Tab]) -> Self {
        match tabs.iter().position(|t| *t == self) {
            Some(i) => tabs[(i + tabs.len() - 1) % tabs.len()],
            None => tabs.first().copied().unwrap_or_default(),
        }
    }

    /// Tab for number key `n` (1-based), if visible
    pub fn from_number(n: u8, tabs: &[Tab]) -> Option<Self> {
        (n as usize)
            .checked_sub(1)
            .and_then(|i| tabs.get(i))
            .copied()
    }
}

/// Tab bar widget showing available views
pub struct TabBar {
    tabs: &'static [Tab],
    selected: Tab,
    theme: Theme,
}

impl TabBar {
    pub fn new(tabs: &'static [Tab], selected: Tab, theme: Theme) -> Self {
        Self {
            tabs,
            selected,
            theme,
        }
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let total_width: u16 = self
            .tabs
            .iter()
            .map(|tab| {
                let label = tab.label();
                let display_len = if *tab == self.selected {
                    label.len() + 2 // "[label]"
                } else {
                    label.len()
                };
                display_len as u16 + 2
            })
            .sum::<u16>()
            .saturating_sub(2);

        let mut x = area.x + (area.width.saturating_sub(total_width)) / 2;

        for tab in self.tabs {
            let is_selected = *tab == self.selected;
            let display = if is_selected {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            };

            let display_len = display.len() as u16;
            if x + display_len > area.x + area.width {
                break;
            }

            let style = if is_selected {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted())
            };

            buf.set_string(x, area.y, &display, style);
            x += display_len + 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Capabilities {
        Capabilities {
            can_view_all_entries: true,
            can_manage_users: true,
            can_assign_entries: true,
            can_modify_entries: true,
        }
    }

    #[test]
    fn test_tab_labels() {
        assert_eq!(Tab::Dashboard.label(), "Dashboard");
        assert_eq!(Tab::Users.label(), "Users");
    }

    #[test]
    fn test_users_tab_is_admin_only() {
        assert!(!Tab::visible(Capabilities::default()).contains(&Tab::Users));
        assert!(Tab::visible(admin()).contains(&Tab::Users));
    }

    #[test]
    fn test_tab_next_prev_wrap() {
        let tabs = Tab::visible(Capabilities::default());
        assert_eq!(Tab::Dashboard.next(tabs), Tab::Daily);
        assert_eq!(Tab::Entries.next(tabs), Tab::Dashboard);
        assert_eq!(Tab::Dashboard.prev(tabs), Tab::Entries);

        let tabs = Tab::visible(admin());
        assert_eq!(Tab::Entries.next(tabs), Tab::Users);
        assert_eq!(Tab::Dashboard.prev(tabs), Tab::Users);
    }

    #[test]
    fn test_hidden_tab_falls_back_to_first() {
        let tabs = Tab::visible(Capabilities::default());
        assert_eq!(Tab::Users.next(tabs), Tab::Dashboard);
    }

    #[test]
    fn test_tab_from_number() {
        let tabs = Tab::visible(Capabilities::default());
        assert_eq!(Tab::from_number(1, tabs), Some(Tab::Dashboard));
        assert_eq!(Tab::from_number(3, tabs), Some(Tab::Entries));
        assert_eq!(Tab::from_number(4, tabs), None);
        assert_eq!(Tab::from_number(0, tabs), None);
        assert_eq!(Tab::from_number(4, Tab::visible(admin())), Some(Tab::Users));
    }

    #[test]
    fn test_tab_bar_renders_visible_tabs_only() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        TabBar::new(Tab::visible(Capabilities::default()), Tab::Daily, Theme::Dark)
            .render(area, &mut buf);

        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(line.contains("[Daily]"));
        assert!(line.contains("Entries"));
        assert!(!line.contains("Users"));
    }
}
