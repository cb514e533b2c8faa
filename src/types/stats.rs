//! Dashboard statistics types

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::MilkEntry;

/// Span of the fixed daily series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WindowDays {
    #[default]
    Seven,
    Thirty,
}

impl WindowDays {
    pub fn days(self) -> u32 {
        match self {
            Self::Seven => 7,
            Self::Thirty => 30,
        }
    }
}

/// Time range selected in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Last7Days,
    Last30Days,
    AllTime,
}

impl TimeRange {
    pub fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::AllTime => "All time",
        }
    }

    /// Window used for the fixed daily series.
    /// "All time" has no window of its own and keeps the 7-day series.
    pub fn window(self) -> WindowDays {
        match self {
            Self::Last30Days => WindowDays::Thirty,
            Self::Last7Days | Self::AllTime => WindowDays::Seven,
        }
    }

    /// Cycle 7 days → 30 days → all time → 7 days
    pub fn next(self) -> Self {
        match self {
            Self::Last7Days => Self::Last30Days,
            Self::Last30Days => Self::AllTime,
            Self::AllTime => Self::Last7Days,
        }
    }

    /// Parse the CLI spelling (`7d`, `30d`, `all`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7" | "7d" | "7days" | "week" => Some(Self::Last7Days),
            "30" | "30d" | "30days" | "month" => Some(Self::Last30Days),
            "all" | "all-time" | "alltime" => Some(Self::AllTime),
            _ => None,
        }
    }
}

/// One calendar day's aggregated totals
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub quantity: f64,
    pub amount: f64,
    pub entry_count: u64,
    pub average_rate: f64,
}

impl DailyBucket {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            quantity: 0.0,
            amount: 0.0,
            entry_count: 0,
            average_rate: 0.0,
        }
    }

    pub fn add(&mut self, entry: &MilkEntry) {
        self.quantity += entry.quantity;
        self.amount += entry.amount;
        self.entry_count = self.entry_count.saturating_add(1);
        self.average_rate = rate_of(self.amount, self.quantity);
    }
}

/// Summed quantity and amount
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct Totals {
    pub quantity: f64,
    pub amount: f64,
}

impl Totals {
    pub fn add(&mut self, entry: &MilkEntry) {
        self.quantity += entry.quantity;
        self.amount += entry.amount;
    }

    /// amount / quantity, 0 when there is no quantity
    pub fn average_rate(&self) -> f64 {
        rate_of(self.amount, self.quantity)
    }
}

/// This-week vs last-week totals
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyComparison {
    pub this_week: Totals,
    pub last_week: Totals,
}

impl WeeklyComparison {
    /// Percentage change in quantity from last week, `None` without a baseline
    pub fn quantity_change_pct(&self) -> Option<f64> {
        if self.last_week.quantity > 0.0 {
            Some(
                (self.this_week.quantity - self.last_week.quantity) / self.last_week.quantity
                    * 100.0,
            )
        } else {
            None
        }
    }
}

/// Per-type totals, kept in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MilkTypeBreakdown {
    groups: Vec<(String, Totals)>,
}

impl MilkTypeBreakdown {
    pub fn add(&mut self, entry: &MilkEntry) {
        match self
            .groups
            .iter_mut()
            .find(|(label, _)| *label == entry.milk_type)
        {
            Some((_, totals)) => totals.add(entry),
            None => {
                let mut totals = Totals::default();
                totals.add(entry);
                self.groups.push((entry.milk_type.clone(), totals));
            }
        }
    }

    pub fn get(&self, milk_type: &str) -> Option<&Totals> {
        self.groups
            .iter()
            .find(|(label, _)| label == milk_type)
            .map(|(_, totals)| totals)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Totals)> {
        self.groups.iter().map(|(label, totals)| (label.as_str(), totals))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for MilkTypeBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (label, totals) in &self.groups {
            map.serialize_entry(label, totals)?;
        }
        map.end()
    }
}

/// Everything the dashboard shows, recomputed wholesale on each call
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_entries: u64,
    pub total_quantity: f64,
    pub total_amount: f64,
    pub average_rate: f64,
    pub milk_type_breakdown: MilkTypeBreakdown,
    pub recent_entries: Vec<MilkEntry>,
    pub daily_stats: Vec<DailyBucket>,
    pub weekly_comparison: WeeklyComparison,
}

/// amount / quantity guarded against zero quantity
pub fn rate_of(amount: f64, quantity: f64) -> f64 {
    if quantity > 0.0 {
        let rate = amount / quantity;
        if rate.is_finite() {
            rate
        } else {
            0.0
        }
    } else {
        0.0
    }
}
