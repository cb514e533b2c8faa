//! Daily view widget - per-day quantity and amount with sparklines

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::{centered, table_width_for, visible_columns, VISIBLE_ROWS};
use crate::format::format_decimal;
use crate::tui::theme::{spike_level, Theme};
use crate::types::{DailyBucket, TimeRange};

/// Format a sparkline bar based on quantity ratio
/// Example: value=5, max=10, width=8 → "▓▓▓▓░░░░"
pub fn format_sparkline(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || width == 0 {
        return "░".repeat(width);
    }
    let ratio = (value / max).max(0.0);
    let filled = (ratio * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}

const COL_DATE: usize = 0;
const COL_ENTRIES: usize = 1;
const COL_QUANTITY: usize = 2;
const COL_AMOUNT: usize = 3;
const COL_RATE: usize = 4;
const COL_USAGE: usize = 5;

/// Date width includes 2 chars for selection marker (▸ )
const COLUMNS: [(&str, u16); 6] = [
    ("Date", 14),
    ("Entries", 10),
    ("Quantity", 14),
    ("Amount", 16),
    ("Avg Rate", 12),
    ("Volume", 20),
];

/// Entries then average rate go first; date, quantity and amount stay
const HIDE_ORDER: [usize; 3] = [COL_ENTRIES, COL_RATE, COL_USAGE];

const SPARKLINE_WIDTH: usize = 16;

/// Buckets for the Daily tab, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub rows: Vec<DailyBucket>,
    pub max_quantity: f64,
    /// Mean amount over days that have entries
    pub avg_amount: f64,
}

impl DailySeries {
    /// Expects buckets in ascending order (from `StatsAggregator::daily`)
    pub fn from_buckets(buckets: &[DailyBucket]) -> Self {
        let rows: Vec<DailyBucket> = buckets.iter().rev().cloned().collect();
        let max_quantity = rows.iter().map(|b| b.quantity).fold(0.0, f64::max);
        let active: Vec<&DailyBucket> = rows.iter().filter(|b| b.entry_count > 0).collect();
        let avg_amount = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|b| b.amount).sum::<f64>() / active.len() as f64
        };
        Self {
            rows,
            max_quantity,
            avg_amount,
        }
    }
}

/// Daily view widget
pub struct DailyView<'a> {
    series: &'a DailySeries,
    range: TimeRange,
    scroll_offset: usize,
    selected_index: Option<usize>,
    theme: Theme,
}

impl<'a> DailyView<'a> {
    pub fn new(
        series: &'a DailySeries,
        range: TimeRange,
        scroll_offset: usize,
        theme: Theme,
    ) -> Self {
        Self {
            series,
            range,
            scroll_offset,
            selected_index: None,
            theme,
        }
    }

    pub fn with_selected_index(mut self, selected_index: Option<usize>) -> Self {
        self.selected_index = selected_index;
        self
    }
}

impl Widget for DailyView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered(area);
        let visible = visible_columns(&COLUMNS, &HIDE_ORDER, area.width);
        let visible_rows = self.series.rows.len().min(VISIBLE_ROWS) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(1),            // Range indicator
            Constraint::Length(1),            // Header
            Constraint::Length(visible_rows), // Rows
            Constraint::Min(0),
        ])
        .split(area);

        self.render_range_indicator(chunks[0], buf);
        if self.series.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No entries in this range",
                Style::default().fg(self.theme.muted()),
            )))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
            return;
        }
        self.render_header(chunks[1], buf, &visible);
        self.render_rows(chunks[2], buf, &visible);
    }
}

impl DailyView<'_> {
    fn render_range_indicator(&self, area: Rect, buf: &mut Buffer) {
        let ranges = [TimeRange::Last7Days, TimeRange::Last30Days, TimeRange::AllTime];
        let mut spans = vec![Span::styled("t: ", Style::default().fg(self.theme.muted()))];
        for (i, range) in ranges.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            let style = if *range == self.range {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted())
            };
            spans.push(Span::styled(range.label(), style));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn table_area(area: Rect, visible: &[usize]) -> Rect {
        let tw = table_width_for(&COLUMNS, visible);
        Rect {
            x: area.x + area.width.saturating_sub(tw) / 2,
            y: area.y,
            width: tw.min(area.width),
            height: area.height,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer, visible: &[usize]) {
        let header_style = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);

        let spans: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let (label, width) = COLUMNS[col];
                let formatted = match col {
                    COL_DATE => format!("  {:<width$}", label, width = (width as usize) - 2),
                    COL_USAGE => format!("  {:<width$}", label, width = (width as usize) - 2),
                    _ => format!("{:>width$}", label, width = width as usize),
                };
                Span::styled(formatted, header_style)
            })
            .collect();

        Paragraph::new(Line::from(spans)).render(Self::table_area(area, visible), buf);
    }

    fn render_rows(&self, area: Rect, buf: &mut Buffer, visible: &[usize]) {
        let table = Self::table_area(area, visible);
        let start = self.scroll_offset.min(self.series.rows.len());
        let end = (start + area.height as usize).min(self.series.rows.len());

        for (i, bucket) in self.series.rows[start..end].iter().enumerate() {
            let row = Rect {
                y: table.y + i as u16,
                height: 1,
                ..table
            };
            let is_selected = self.selected_index == Some(start + i);
            self.render_row(row, buf, bucket, visible, is_selected);
        }
    }

    fn render_row(
        &self,
        area: Rect,
        buf: &mut Buffer,
        bucket: &DailyBucket,
        visible: &[usize],
        is_selected: bool,
    ) {
        let muted = bucket.entry_count == 0;
        let base = |color: Color| {
            let style = Style::default().fg(if muted { self.theme.muted() } else { color });
            if is_selected {
                style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                style
            }
        };
        let amount_color = self
            .theme
            .spike_color(spike_level(bucket.amount, self.series.avg_amount));

        let spans: Vec<Span> = visible
            .iter()
            .map(|&col| {
                let width = COLUMNS[col].1 as usize;
                match col {
                    COL_DATE => {
                        let marker = if is_selected { "▸ " } else { "  " };
                        Span::styled(
                            format!(
                                "{}{:<w$}",
                                marker,
                                bucket.date.format("%Y-%m-%d"),
                                w = width - 2
                            ),
                            base(self.theme.date()),
                        )
                    }
                    COL_ENTRIES => Span::styled(
                        format!("{:>width$}", bucket.entry_count),
                        base(self.theme.text()),
                    ),
                    COL_QUANTITY => Span::styled(
                        format!("{:>width$}", format_decimal(bucket.quantity)),
                        base(self.theme.text()),
                    ),
                    COL_AMOUNT => Span::styled(
                        format!("{:>width$}", format_decimal(bucket.amount)),
                        base(amount_color),
                    ),
                    COL_RATE => Span::styled(
                        format!("{:>width$}", format_decimal(bucket.average_rate)),
                        base(self.theme.text()),
                    ),
                    _ => Span::styled(
                        format!(
                            "  {}",
                            format_sparkline(
                                bucket.quantity,
                                self.series.max_quantity,
                                SPARKLINE_WIDTH,
                            )
                        ),
                        base(self.theme.volume()),
                    ),
                }
            })
            .collect();

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
