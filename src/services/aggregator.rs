//! Aggregator service for computing dashboard statistics

use chrono::{Days, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::types::{
    DailyBucket, DashboardStats, MilkEntry, MilkTypeBreakdown, Totals, WeeklyComparison,
    WindowDays,
};

/// Number of entries shown in the recent-entries list
pub const RECENT_ENTRIES: usize = 5;

/// Aggregator for computing dashboard statistics.
///
/// Every function is pure: the same `(entries, window, now)` always yields
/// the same output, and the input slice is never reordered.
pub struct StatsAggregator;

impl StatsAggregator {
    /// Compute the full dashboard for `entries` as seen at `now`
    pub fn compute(
        entries: &[MilkEntry],
        window: WindowDays,
        now: NaiveDateTime,
    ) -> DashboardStats {
        let today = now.date();
        let totals = Self::totals(entries);

        DashboardStats {
            total_entries: entries.len() as u64,
            total_quantity: totals.quantity,
            total_amount: totals.amount,
            average_rate: totals.average_rate(),
            milk_type_breakdown: Self::by_type(entries),
            recent_entries: Self::recent(entries, RECENT_ENTRIES),
            daily_stats: Self::daily(entries, window, today),
            weekly_comparison: Self::weekly(entries, today),
        }
    }

    /// Sum quantity and amount across all entries
    pub fn totals(entries: &[MilkEntry]) -> Totals {
        let mut totals = Totals::default();
        for entry in entries {
            totals.add(entry);
        }
        totals
    }

    /// Group by exact milk type label
    pub fn by_type(entries: &[MilkEntry]) -> MilkTypeBreakdown {
        let mut breakdown = MilkTypeBreakdown::default();
        for entry in entries {
            breakdown.add(entry);
        }
        breakdown
    }

    /// One zero-filled bucket per day in `[today - (window-1), today]`, ascending
    pub fn daily(entries: &[MilkEntry], window: WindowDays, today: NaiveDate) -> Vec<DailyBucket> {
        let span = window.days();
        let Some(start) = today.checked_sub_days(Days::new(u64::from(span) - 1)) else {
            return Vec::new();
        };

        let mut buckets: Vec<DailyBucket> = start
            .iter_days()
            .take(span as usize)
            .map(DailyBucket::empty)
            .collect();

        for entry in entries {
            let Some(day) = entry.entry_day() else {
                continue;
            };
            if day < start || day > today {
                continue;
            }
            let index = (day - start).num_days() as usize;
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.add(entry);
            }
        }

        buckets
    }

    /// One bucket per distinct entry day with no window (sorted ascending).
    /// Days without entries are not filled in.
    pub fn daily_all(entries: &[MilkEntry]) -> Vec<DailyBucket> {
        let mut by_day: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();

        for entry in entries {
            if let Some(day) = entry.entry_day() {
                by_day
                    .entry(day)
                    .or_insert_with(|| DailyBucket::empty(day))
                    .add(entry);
            }
        }

        by_day.into_values().collect()
    }

    /// This week `[today-7, today]` vs last week `[today-14, today-7)`
    pub fn weekly(entries: &[MilkEntry], today: NaiveDate) -> WeeklyComparison {
        let mut comparison = WeeklyComparison::default();
        let (Some(this_start), Some(last_start)) = (
            today.checked_sub_days(Days::new(7)),
            today.checked_sub_days(Days::new(14)),
        ) else {
            return comparison;
        };

        for entry in entries {
            let Some(day) = entry.entry_day() else {
                continue;
            };
            if day >= this_start && day <= today {
                comparison.this_week.add(entry);
            } else if day >= last_start && day < this_start {
                comparison.last_week.add(entry);
            }
        }

        comparison
    }

    /// Latest `limit` entries by entry date, descending.
    /// Ties keep input order; undated entries sort last.
    pub fn recent(entries: &[MilkEntry], limit: usize) -> Vec<MilkEntry> {
        let mut sorted: Vec<&MilkEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        sorted.into_iter().take(limit).cloned().collect()
    }
}
