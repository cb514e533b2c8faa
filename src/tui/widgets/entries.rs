//! Entries view widget - scrollable table of milk entries

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::{centered, table_width_for, truncate, visible_columns, VISIBLE_ROWS};
use crate::format::{format_day, format_decimal};
use crate::services::StatsAggregator;
use crate::tui::theme::Theme;
use crate::types::MilkEntry;

const COL_ID: usize = 0;
const COL_DATE: usize = 1;
const COL_TYPE: usize = 2;
const COL_QUANTITY: usize = 3;
const COL_RATE: usize = 4;
const COL_AMOUNT: usize = 5;
const COL_USER: usize = 6;

/// Id width includes 2 chars for selection marker (▸ )
const COLUMNS: [(&str, u16); 7] = [
    ("#", 9),
    ("Date", 12),
    ("Type", 16),
    ("Quantity", 12),
    ("Rate", 10),
    ("Amount", 14),
    ("User", 18),
];

const HIDE_ORDER: [usize; 3] = [COL_USER, COL_RATE, COL_ID];

/// Entries view widget. Rows render in the order given.
pub struct EntriesView<'a> {
    entries: &'a [MilkEntry],
    scroll_offset: usize,
    selected_index: Option<usize>,
    show_owner: bool,
    theme: Theme,
}

impl<'a> EntriesView<'a> {
    pub fn new(entries: &'a [MilkEntry], scroll_offset: usize, theme: Theme) -> Self {
        Self {
            entries,
            scroll_offset,
            selected_index: None,
            show_owner: false,
            theme,
        }
    }

    pub fn with_selected_index(mut self, selected_index: Option<usize>) -> Self {
        self.selected_index = selected_index;
        self
    }

    /// Show the owning user's column (entries of several users)
    pub fn with_owner(mut self, show_owner: bool) -> Self {
        self.show_owner = show_owner;
        self
    }

    fn columns(&self, width: u16) -> Vec<usize> {
        let mut visible = visible_columns(&COLUMNS, &HIDE_ORDER, width);
        if !self.show_owner {
            visible.retain(|&i| i != COL_USER);
        }
        visible
    }
}

impl Widget for EntriesView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered(area);
        let visible = self.columns(area.width);
        let visible_rows = self.entries.len().min(VISIBLE_ROWS) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(1),            // Summary
            Constraint::Length(1),            // Header
            Constraint::Length(visible_rows), // Rows
            Constraint::Min(0),
        ])
        .split(area);

        self.render_summary(chunks[0], buf);
        if self.entries.is_empty() {
            return;
        }

        let tw = table_width_for(&COLUMNS, &visible);
        let table = |area: Rect| Rect {
            x: area.x + area.width.saturating_sub(tw) / 2,
            width: tw.min(area.width),
            ..area
        };
        self.render_header(table(chunks[1]), buf, &visible);

        let rows = table(chunks[2]);
        let start = self.scroll_offset.min(self.entries.len());
        let end = (start + rows.height as usize).min(self.entries.len());
        for (i, entry) in self.entries[start..end].iter().enumerate() {
            let row = Rect {
                y: rows.y + i as u16,
                height: 1,
                ..rows
            };
            let is_selected = self.selected_index == Some(start + i);
            self.render_row(row, buf, entry, &visible, is_selected);
        }
    }
}

impl EntriesView<'_> {
    fn render_summary(&self, area: Rect, buf: &mut Buffer) {
        let line = if self.entries.is_empty() {
            Line::from(Span::styled(
                "No milk entries found",
                Style::default().fg(self.theme.muted()),
            ))
        } else {
            let totals = StatsAggregator::totals(self.entries);
            Line::from(vec![
                Span::styled(
                    format!("{} entries", self.entries.len()),
                    Style::default()
                        .fg(self.theme.text())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("  ·  quantity ", Style::default().fg(self.theme.muted())),
                Span::styled(
                    format_decimal(totals.quantity),
                    Style::default().fg(self.theme.quantity()),
                ),
                Span::styled("  ·  amount ", Style::default().fg(self.theme.muted())),
                Span::styled(
                    format_decimal(totals.amount),
                    Style::default().fg(self.theme.amount()),
                ),
            ])
        };
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer, visible: &[usize]) {
        let header_style = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);
        let spans: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let (label, width) = COLUMNS[col];
                let width = width as usize;
                let formatted = match col {
                    COL_ID => format!("  {:<w$}", label, w = width - 2),
                    COL_USER => format!("  {:<w$}", label, w = width - 2),
                    COL_DATE | COL_TYPE => format!("{:<width$}", label),
                    _ => format!("{:>width$}", label),
                };
                Span::styled(formatted, header_style)
            })
            .collect();
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_row(
        &self,
        area: Rect,
        buf: &mut Buffer,
        entry: &MilkEntry,
        visible: &[usize],
        is_selected: bool,
    ) {
        let cell = |color: Color| {
            let style = Style::default().fg(color);
            if is_selected {
                style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                style
            }
        };

        let spans: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let width = COLUMNS[col].1 as usize;
                match col {
                    COL_ID => {
                        let marker = if is_selected { "▸ " } else { "  " };
                        let id = entry.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
                        Span::styled(
                            format!("{}{:<w$}", marker, id, w = width - 2),
                            cell(self.theme.muted()),
                        )
                    }
                    COL_DATE => Span::styled(
                        format!("{:<width$}", format_day(entry.entry_date)),
                        cell(self.theme.date()),
                    ),
                    COL_TYPE => Span::styled(
                        format!("{:<width$}", truncate(&entry.milk_type, width - 2)),
                        cell(self.theme.text()),
                    ),
                    COL_QUANTITY => Span::styled(
                        format!("{:>width$}", format_decimal(entry.quantity)),
                        cell(self.theme.quantity()),
                    ),
                    COL_RATE => Span::styled(
                        format!("{:>width$}", format_decimal(entry.rate)),
                        cell(self.theme.text()),
                    ),
                    COL_AMOUNT => Span::styled(
                        format!("{:>width$}", format_decimal(entry.amount)),
                        cell(self.theme.amount()),
                    ),
                    _ => Span::styled(
                        format!(
                            "  {:<w$}",
                            truncate(&entry.owner_label(), width - 2),
                            w = width - 2
                        ),
                        cell(self.theme.muted()),
                    ),
                }
            })
            .collect();
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(id: i64, milk_type: &str, username: &str) -> MilkEntry {
        MilkEntry {
            id: Some(id),
            milk_type: milk_type.into(),
            quantity: 2.5,
            rate: 4.0,
            amount: 10.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 5, id as u32)
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
            username: username.into(),
            ..Default::default()
        }
    }

    fn render(view: EntriesView, width: u16) -> String {
        let area = Rect::new(0, 0, width, 20);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_entries_view_renders_summary_and_rows() {
        let entries = vec![entry(2, "Cow", "asha"), entry(1, "Goat", "ravi")];
        let text = render(
            EntriesView::new(&entries, 0, Theme::Dark)
                .with_selected_index(Some(1))
                .with_owner(true),
            120,
        );
        assert!(text.contains("2 entries"));
        assert!(text.contains("2024-05-02"));
        assert!(text.contains("▸ 1"));
        assert!(text.contains("ravi"));
        assert!(text.contains("20.00"));
    }

    #[test]
    fn test_owner_column_hidden_for_own_entries() {
        let entries = vec![entry(1, "Cow", "asha")];
        let text = render(EntriesView::new(&entries, 0, Theme::Dark), 120);
        assert!(!text.contains("asha"));
        assert!(!text.contains("User"));
    }

    #[test]
    fn test_entries_view_empty() {
        let text = render(EntriesView::new(&[], 0, Theme::Dark), 80);
        assert!(text.contains("No milk entries found"));
    }
}
