//! `dashboard` report and the tables shared by listing commands

use std::fmt::Write as _;

use chrono::Local;
use clap::Args;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{print_json, Context};
use crate::format::{format_change, format_day, format_decimal, format_number};
use crate::services::{EntryScope, MilkApi, StatsAggregator};
use crate::types::{DailyBucket, DashboardStats, MilkEntry, Result, TimeRange, User};

/// Show dashboard statistics
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Time range: 7d, 30d or all
    #[arg(long, default_value = "7d", value_parser = parse_range)]
    pub range: TimeRange,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_range(s: &str) -> std::result::Result<TimeRange, String> {
    TimeRange::parse(s).ok_or_else(|| format!("unknown range {:?} (use 7d, 30d or all)", s))
}

/// JSON shape of the report
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardReport<'a> {
    range: &'static str,
    #[serde(flatten)]
    stats: &'a DashboardStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_all: Option<&'a [DailyBucket]>,
}

impl DashboardArgs {
    pub fn run(self, ctx: &mut Context) -> Result<()> {
        ctx.session()?;
        let scope = EntryScope::for_capabilities(ctx.capabilities());
        let result = ctx.api()?.list_milk(scope);
        let entries = ctx.checked(result)?;

        let now = Local::now().naive_local();
        let stats = StatsAggregator::compute(&entries, self.range.window(), now);
        let daily_all =
            (self.range == TimeRange::AllTime).then(|| StatsAggregator::daily_all(&entries));

        if self.json {
            print_json(&DashboardReport {
                range: self.range.label(),
                stats: &stats,
                daily_all: daily_all.as_deref(),
            })
        } else {
            print!("{}", render_dashboard(&stats, self.range, daily_all.as_deref()));
            Ok(())
        }
    }
}

/// Plain-text dashboard
pub fn render_dashboard(
    stats: &DashboardStats,
    range: TimeRange,
    daily_all: Option<&[DailyBucket]>,
) -> String {
    let mut out = String::new();
    let weekly = &stats.weekly_comparison;

    let _ = writeln!(out, "Milk dashboard ({})", range.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "Entries:        {}", format_number(stats.total_entries));
    let _ = writeln!(out, "Total quantity: {}", format_decimal(stats.total_quantity));
    let _ = writeln!(out, "Total amount:   {}", format_decimal(stats.total_amount));
    let _ = writeln!(out, "Average rate:   {}", format_decimal(stats.average_rate));
    let _ = writeln!(
        out,
        "This week:      {} ({} vs last week)",
        format_decimal(weekly.this_week.quantity),
        format_change(weekly.quantity_change_pct())
    );
    let _ = writeln!(out, "Last week:      {}", format_decimal(weekly.last_week.quantity));

    if !stats.milk_type_breakdown.is_empty() {
        let rows: Vec<TypeRow> = stats
            .milk_type_breakdown
            .iter()
            .map(|(label, totals)| TypeRow {
                milk_type: label.to_string(),
                quantity: format_decimal(totals.quantity),
                amount: format_decimal(totals.amount),
                rate: format_decimal(totals.average_rate()),
            })
            .collect();
        let _ = writeln!(out, "\nBy milk type");
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::modern()));
    }

    let series = daily_all.unwrap_or(&stats.daily_stats);
    if !series.is_empty() {
        let _ = writeln!(out, "\nDaily");
        let _ = writeln!(out, "{}", daily_table(series));
    }

    if !stats.recent_entries.is_empty() {
        let _ = writeln!(out, "\nRecent entries");
        let _ = writeln!(out, "{}", entries_table(&stats.recent_entries));
    }

    out
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    milk_type: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Avg rate")]
    rate: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Entries")]
    entries: u64,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Avg rate")]
    rate: String,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    milk_type: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "User")]
    user: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Roles")]
    roles: String,
}

pub fn daily_table(buckets: &[DailyBucket]) -> String {
    let rows: Vec<DailyRow> = buckets
        .iter()
        .map(|b| DailyRow {
            date: b.date.format("%Y-%m-%d").to_string(),
            entries: b.entry_count,
            quantity: format_decimal(b.quantity),
            amount: format_decimal(b.amount),
            rate: format_decimal(b.average_rate),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn entries_table(entries: &[MilkEntry]) -> String {
    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
            date: format_day(e.entry_date),
            milk_type: e.milk_type.clone(),
            quantity: format_decimal(e.quantity),
            rate: format_decimal(e.rate),
            amount: format_decimal(e.amount),
            user: e.owner_label(),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn users_table(users: &[User]) -> String {
    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            phone: u.phone_number.clone().unwrap_or_else(|| "-".into()),
            roles: u.role_labels(),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::types::{Role, WindowDays, ROLE_ADMIN};

    fn entry(id: i64, day: u32, milk_type: &str, quantity: f64, rate: f64) -> MilkEntry {
        MilkEntry {
            id: Some(id),
            milk_type: milk_type.into(),
            quantity,
            rate,
            amount: quantity * rate,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(0, 0, 0),
            user_id: Some(2),
            username: "ravi".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_entries_table_contents() {
        let table = entries_table(&[entry(7, 9, "Cow", 1234.5, 2.0)]);
        assert!(table.contains("Quantity"));
        assert!(table.contains("2024-03-09"));
        assert!(table.contains("1,234.50"));
        assert!(table.contains("2,469.00"));
        assert!(table.contains("ravi"));
    }

    #[test]
    fn test_entry_owner_fallbacks() {
        let mut e = entry(1, 1, "Cow", 1.0, 1.0);
        assert_eq!(e.owner_label(), "ravi");
        e.username.clear();
        assert_eq!(e.owner_label(), "#2");
        e.user_id = None;
        assert_eq!(e.owner_label(), "-");
    }

    #[test]
    fn test_users_table_contents() {
        let users = vec![User {
            id: 1,
            username: "admin".into(),
            email: "admin@example.com".into(),
            phone_number: None,
            roles: vec![Role::named(ROLE_ADMIN)],
        }];
        let table = users_table(&users);
        assert!(table.contains("admin@example.com"));
        assert!(table.contains("ADMIN"));
    }

    #[test]
    fn test_render_dashboard_sections() {
        let entries = vec![entry(1, 9, "Cow", 10.0, 5.0), entry(2, 10, "Goat", 2.0, 30.0)];
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let stats = StatsAggregator::compute(&entries, WindowDays::Seven, now);

        let text = render_dashboard(&stats, TimeRange::Last7Days, None);

        assert!(text.contains("Last 7 days"));
        assert!(text.contains("Entries:        2"));
        assert!(text.contains("Total amount:   110.00"));
        assert!(text.contains("By milk type"));
        assert!(text.contains("Goat"));
        assert!(text.contains("2024-03-04"));
        assert!(text.contains("Recent entries"));
    }

    #[test]
    fn test_render_dashboard_all_time_uses_sparse_series() {
        let entries = vec![entry(1, 1, "Cow", 1.0, 1.0)];
        let now = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let stats = StatsAggregator::compute(&entries, WindowDays::Seven, now);
        let all = StatsAggregator::daily_all(&entries);

        let text = render_dashboard(&stats, TimeRange::AllTime, Some(&all));

        assert!(text.contains("2024-03-01"));
        assert!(!text.contains("2024-03-14"));
    }

    #[test]
    fn test_report_json_shape() {
        let entries = vec![entry(1, 9, "Cow", 10.0, 5.0)];
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let stats = StatsAggregator::compute(&entries, WindowDays::Seven, now);
        let report = DashboardReport {
            range: TimeRange::Last7Days.label(),
            stats: &stats,
            daily_all: None,
        };

        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["totalEntries"], 1);
        assert_eq!(value["dailyStats"].as_array().unwrap().len(), 7);
        assert_eq!(value["weeklyComparison"]["thisWeek"]["quantity"], 10.0);
        assert!(value.get("dailyAll").is_none());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("30d"), Ok(TimeRange::Last30Days));
        assert!(parse_range("year").is_err());
    }
}
