//! Colors for dark and light terminals

use ratatui::style::Color;

/// How far a day's amount sits above the window's daily average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeLevel {
    Normal,
    Elevated,
    High,
}

/// 1.5x the average is elevated, 2x is high. Without an average every day is normal.
pub fn spike_level(amount: f64, avg_amount: f64) -> SpikeLevel {
    if avg_amount > 0.0 && amount >= avg_amount * 2.0 {
        SpikeLevel::High
    } else if avg_amount > 0.0 && amount >= avg_amount * 1.5 {
        SpikeLevel::Elevated
    } else {
        SpikeLevel::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Pick Light when the terminal background is bright, Dark otherwise
    /// (including when the terminal does not answer). Query it before
    /// `ratatui::init`, raw mode swallows the reply.
    pub fn detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => Self::Light,
            _ => Self::Dark,
        }
    }

    pub fn text(self) -> Color {
        match self {
            Self::Dark => Color::White,
            Self::Light => Color::Black,
        }
    }

    /// Selected tab, key hints, popup borders
    pub fn accent(self) -> Color {
        match self {
            Self::Dark => Color::Cyan,
            Self::Light => Color::Indexed(25),
        }
    }

    pub fn muted(self) -> Color {
        match self {
            Self::Dark => Color::DarkGray,
            Self::Light => Color::Gray,
        }
    }

    /// Dates, section headings, footer notices
    pub fn date(self) -> Color {
        match self {
            Self::Dark => Color::Yellow,
            Self::Light => Color::Indexed(130),
        }
    }

    /// Money amounts
    pub fn amount(self) -> Color {
        match self {
            Self::Dark => Color::Magenta,
            Self::Light => Color::Indexed(90),
        }
    }

    /// Litres
    pub fn quantity(self) -> Color {
        match self {
            Self::Dark => Color::Blue,
            Self::Light => Color::Indexed(25),
        }
    }

    /// Collection total card
    pub fn revenue(self) -> Color {
        match self {
            Self::Dark => Color::LightRed,
            Self::Light => Color::Red,
        }
    }

    /// Volume bars and week-over-week growth
    pub fn volume(self) -> Color {
        match self {
            Self::Dark => Color::Green,
            Self::Light => Color::Indexed(22),
        }
    }

    pub fn error(self) -> Color {
        match self {
            Self::Dark => Color::Red,
            Self::Light => Color::Indexed(124),
        }
    }

    /// Amount color for a day at `level`
    pub fn spike_color(self, level: SpikeLevel) -> Color {
        match (level, self) {
            (SpikeLevel::Normal, _) => self.amount(),
            (SpikeLevel::Elevated, Self::Dark) => Color::Indexed(208),
            (SpikeLevel::Elevated, Self::Light) => Color::Indexed(166),
            (SpikeLevel::High, Self::Dark) => Color::Indexed(196),
            (SpikeLevel::High, Self::Light) => Color::Indexed(160),
        }
    }

    /// Week-over-week change: growth green, decline red, no baseline muted
    pub fn change_color(self, pct: Option<f64>) -> Color {
        match pct {
            Some(p) if p > 0.0 => self.volume(),
            Some(p) if p < 0.0 => self.error(),
            _ => self.muted(),
        }
    }
}
