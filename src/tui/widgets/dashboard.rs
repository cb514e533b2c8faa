//! Dashboard view widget - totals card grid, type breakdown and recent entries

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::{centered, truncate};
use crate::format::{format_change, format_day, format_decimal, format_number};
use crate::tui::theme::Theme;
use crate::types::{DashboardStats, TimeRange};

/// Card dimensions
const CARD_WIDTH: u16 = 28;
const CARD_HEIGHT: u16 = 5;

/// Fixed number of columns for balanced 2x3 grid
const FIXED_COLS: usize = 3;
const CARD_COUNT: usize = 6;

/// Calculate number of cards per row based on available width (max 3 for balanced grid)
fn cards_per_row(width: u16) -> usize {
    let usable_width = width.saturating_sub(4);
    let cards = (usable_width / (CARD_WIDTH + 2)) as usize;
    cards.clamp(1, FIXED_COLS)
}

struct StatCard {
    title: &'static str,
    value: String,
    color: Color,
}

/// Dashboard view widget
pub struct DashboardView<'a> {
    stats: &'a DashboardStats,
    range: TimeRange,
    /// Registered users, shown to administrators
    user_count: Option<u64>,
    theme: Theme,
}

impl<'a> DashboardView<'a> {
    pub fn new(stats: &'a DashboardStats, range: TimeRange, theme: Theme) -> Self {
        Self {
            stats,
            range,
            user_count: None,
            theme,
        }
    }

    pub fn with_user_count(mut self, user_count: Option<u64>) -> Self {
        self.user_count = user_count;
        self
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered(area);
        let cols = cards_per_row(area.width);
        let rows = CARD_COUNT.div_ceil(cols);
        let grid_height = (rows as u16) * (CARD_HEIGHT + 1);

        let chunks = Layout::vertical([
            Constraint::Length(1),           // Title
            Constraint::Length(1),           // Blank
            Constraint::Length(grid_height), // Card grid
            Constraint::Min(0),              // Breakdown + recent
        ])
        .split(area);

        self.render_title(chunks[0], buf);
        self.render_card_grid(chunks[2], buf, cols);

        let lists = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[3]);
        self.render_breakdown(lists[0], buf);
        self.render_recent(lists[1], buf);
    }
}

impl DashboardView<'_> {
    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                "Milk Collection",
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ·  {}", self.range.label()),
                Style::default().fg(self.theme.muted()),
            ),
        ];
        if let Some(count) = self.user_count {
            spans.push(Span::styled(
                format!("  ·  {} users", format_number(count)),
                Style::default().fg(self.theme.muted()),
            ));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn build_cards(&self) -> Vec<StatCard> {
        let weekly = &self.stats.weekly_comparison;
        let change = weekly.quantity_change_pct();
        vec![
            StatCard {
                title: "Total Entries",
                value: format_number(self.stats.total_entries),
                color: self.theme.accent(),
            },
            StatCard {
                title: "Total Quantity",
                value: format_decimal(self.stats.total_quantity),
                color: self.theme.quantity(),
            },
            StatCard {
                title: "Total Amount",
                value: format_decimal(self.stats.total_amount),
                color: self.theme.revenue(),
            },
            StatCard {
                title: "Average Rate",
                value: format_decimal(self.stats.average_rate),
                color: self.theme.amount(),
            },
            StatCard {
                title: "This Week",
                value: format_decimal(weekly.this_week.quantity),
                color: self.theme.volume(),
            },
            StatCard {
                title: "vs Last Week",
                value: format_change(change),
                color: self.theme.change_color(change),
            },
        ]
    }

    fn render_card_grid(&self, area: Rect, buf: &mut Buffer, cols: usize) {
        let total_cards_width = (cols as u16) * CARD_WIDTH + ((cols - 1) as u16) * 2;
        let start_x = area.x + (area.width.saturating_sub(total_cards_width)) / 2;

        for (i, card) in self.build_cards().iter().enumerate() {
            let card_x = start_x + ((i % cols) as u16) * (CARD_WIDTH + 2);
            let card_y = area.y + ((i / cols) as u16) * (CARD_HEIGHT + 1);

            if card_y + CARD_HEIGHT > area.y + area.height {
                continue;
            }

            let card_area = Rect {
                x: card_x,
                y: card_y,
                width: CARD_WIDTH.min(area.width),
                height: CARD_HEIGHT,
            };
            self.render_card(card_area, buf, card);
        }
    }

    fn render_card(&self, area: Rect, buf: &mut Buffer, card: &StatCard) {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(card.color))
            .render(area, buf);

        let title_x = area.x + (area.width.saturating_sub(card.title.len() as u16)) / 2;
        buf.set_string(title_x, area.y + 1, card.title, Style::default().fg(card.color));

        let value_x = area.x + (area.width.saturating_sub(card.value.chars().count() as u16)) / 2;
        buf.set_string(
            value_x,
            area.y + 3,
            &card.value,
            Style::default()
                .fg(card.color)
                .add_modifier(Modifier::BOLD),
        );
    }

    fn section_header(&self, title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(self.theme.date())
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn render_breakdown(&self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![self.section_header("By Milk Type")];
        if self.stats.milk_type_breakdown.is_empty() {
            lines.push(Line::from(Span::styled(
                "No entries yet",
                Style::default().fg(self.theme.muted()),
            )));
        }
        for (label, totals) in self.stats.milk_type_breakdown.iter() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<14}", truncate(label, 14)),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    format!("{:>12}", format_decimal(totals.quantity)),
                    Style::default().fg(self.theme.quantity()),
                ),
                Span::styled(
                    format!("{:>14}", format_decimal(totals.amount)),
                    Style::default().fg(self.theme.amount()),
                ),
            ]));
        }
        Paragraph::new(lines).render(area, buf);
    }

    fn render_recent(&self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![self.section_header("Recent Entries")];
        if self.stats.recent_entries.is_empty() {
            lines.push(Line::from(Span::styled(
                "No entries yet",
                Style::default().fg(self.theme.muted()),
            )));
        }
        for entry in &self.stats.recent_entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<12}", format_day(entry.entry_date)),
                    Style::default().fg(self.theme.date()),
                ),
                Span::styled(
                    format!("{:<12}", truncate(&entry.milk_type, 12)),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    format!("{:>10}", format_decimal(entry.quantity)),
                    Style::default().fg(self.theme.quantity()),
                ),
                Span::styled(
                    format!("{:>12}", format_decimal(entry.amount)),
                    Style::default().fg(self.theme.amount()),
                ),
                Span::styled(
                    format!("  {}", truncate(&entry.username, 16)),
                    Style::default().fg(self.theme.muted()),
                ),
            ]));
        }
        Paragraph::new(lines).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StatsAggregator;
    use crate::types::{MilkEntry, WindowDays};
    use chrono::NaiveDate;

    fn stats() -> DashboardStats {
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let entries = vec![
            MilkEntry {
                id: Some(1),
                milk_type: "Cow".into(),
                quantity: 10.0,
                rate: 5.0,
                amount: 50.0,
                entry_date: Some(now),
                username: "asha".into(),
                ..Default::default()
            },
            MilkEntry {
                id: Some(2),
                milk_type: "Buffalo".into(),
                quantity: 4.0,
                rate: 8.0,
                amount: 32.0,
                entry_date: Some(now),
                ..Default::default()
            },
        ];
        StatsAggregator::compute(&entries, WindowDays::Seven, now)
    }

    fn content(view: DashboardView, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cards_per_row() {
        assert_eq!(cards_per_row(200), 3);
        assert_eq!(cards_per_row(70), 2);
        assert_eq!(cards_per_row(20), 1);
    }

    #[test]
    fn test_dashboard_renders_totals() {
        let stats = stats();
        let text = content(DashboardView::new(&stats, TimeRange::Last7Days, Theme::Dark), 120, 30);
        assert!(text.contains("Total Entries"));
        assert!(text.contains("82.00"));
        assert!(text.contains("Last 7 days"));
        assert!(text.contains("By Milk Type"));
        assert!(text.contains("Buffalo"));
        assert!(text.contains("asha"));
        // no baseline last week
        assert!(text.contains("n/a"));
    }

    #[test]
    fn test_dashboard_shows_user_count_for_admins() {
        let stats = stats();
        let view =
            DashboardView::new(&stats, TimeRange::AllTime, Theme::Light).with_user_count(Some(12));
        let text = content(view, 120, 30);
        assert!(text.contains("12 users"));
    }

    #[test]
    fn test_dashboard_renders_in_tiny_area() {
        let stats = stats();
        let text = content(DashboardView::new(&stats, TimeRange::Last7Days, Theme::Dark), 10, 4);
        assert!(!text.is_empty());
    }
}
