//! TUI widgets

pub mod confirm;
pub mod daily;
pub mod dashboard;
pub mod entries;
pub mod help;
pub mod spinner;
pub mod tabs;
pub mod users;

use ratatui::{buffer::Buffer, layout::Rect, style::Style};

use crate::tui::theme::Theme;

/// Maximum content width shared by every view
pub const MAX_CONTENT_WIDTH: u16 = 170;

/// Visible rows for scrolling tables (excluding header)
pub const VISIBLE_ROWS: usize = 15;

/// Center `area` horizontally, capped at [`MAX_CONTENT_WIDTH`]
pub fn centered(area: Rect) -> Rect {
    let content_width = area.width.min(MAX_CONTENT_WIDTH);
    let x_offset = (area.width.saturating_sub(content_width)) / 2;
    Rect {
        x: area.x + x_offset,
        y: area.y,
        width: content_width,
        height: area.height,
    }
}

/// A `width` x `height` box centered in `area`, shrunk to fit
pub fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn render_separator(area: Rect, buf: &mut Buffer, theme: Theme) {
    let line = "─".repeat(area.width as usize);
    buf.set_string(area.x, area.y, &line, Style::default().fg(theme.muted()));
}

/// Columns that fit in `width`, dropping `hide_order` entries first
pub fn visible_columns(columns: &[(&str, u16)], hide_order: &[usize], width: u16) -> Vec<usize> {
    let mut visible: Vec<usize> = (0..columns.len()).collect();

    for &col_idx in hide_order {
        let total: u16 = visible.iter().map(|&i| columns[i].1).sum();
        if total <= width {
            return visible;
        }
        visible.retain(|&i| i != col_idx);
    }

    visible
}

pub fn table_width_for(columns: &[(&str, u16)], visible: &[usize]) -> u16 {
    visible.iter().map(|&i| columns[i].1).sum()
}

/// Truncate to `max` characters, marking the cut with an ellipsis (UTF-8 safe)
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    } else {
        text.to_string()
    }
}

/// Scroll offset that keeps `selected` inside a window of `rows`
pub fn scroll_to(selected: usize, offset: usize, rows: usize) -> usize {
    if selected < offset {
        selected
    } else if rows > 0 && selected >= offset + rows {
        selected + 1 - rows
    } else {
        offset
    }
}
