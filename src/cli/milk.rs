//! `milk` subcommands

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};

use super::report::entries_table;
use super::{confirm, print_json, Context};
use crate::format::{format_day, format_decimal};
use crate::services::validation::{edited_milk_request, new_milk_request};
use crate::services::{EntryScope, MilkApi, MilkDraft, StatsAggregator};
use crate::types::{MilkEntry, Result};

#[derive(Subcommand, Debug)]
pub enum MilkCommand {
    /// List milk entries
    List {
        /// Only entries of this milk type
        #[arg(long = "type", value_name = "TYPE")]
        milk_type: Option<String>,

        /// Only entries of this user (administrators)
        #[arg(long, value_name = "ID")]
        user: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entry
    Show {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a new entry (amount = quantity × rate)
    Add(EntryFields),

    /// Edit an entry; omitted fields keep their value
    Update {
        id: i64,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Delete an entry
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct EntryFields {
    #[arg(long = "type", value_name = "TYPE")]
    pub milk_type: Option<String>,

    #[arg(long)]
    pub quantity: Option<f64>,

    #[arg(long)]
    pub rate: Option<f64>,

    /// Entry date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Owner of the entry (administrators must set this)
    #[arg(long, value_name = "ID")]
    pub user: Option<i64>,
}

impl From<EntryFields> for MilkDraft {
    fn from(fields: EntryFields) -> Self {
        Self {
            milk_type: fields.milk_type,
            quantity: fields.quantity,
            rate: fields.rate,
            entry_date: fields.date,
            user_id: fields.user,
        }
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date {:?} (expected YYYY-MM-DD)", s))
}

impl MilkCommand {
    pub fn run(self, ctx: &mut Context) -> Result<()> {
        match self {
            Self::List {
                milk_type,
                user,
                json,
            } => list(ctx, milk_type.as_deref(), user, json),
            Self::Show { id, json } => show(ctx, id, json),
            Self::Add(fields) => add(ctx, fields.into()),
            Self::Update { id, fields } => update(ctx, id, fields.into()),
            Self::Delete { id, yes } => delete(ctx, id, yes),
        }
    }
}

fn list(ctx: &mut Context, milk_type: Option<&str>, user: Option<i64>, json: bool) -> Result<()> {
    let session = ctx.session()?;
    let own_id = session.user.id;
    let caps = ctx.capabilities();
    let api = ctx.api()?;

    let other_user = user.filter(|id| *id != own_id);
    let result = match (other_user, milk_type) {
        (Some(id), _) => {
            ctx.ensure(caps.can_view_all_entries, "listing another user's entries")?;
            api.list_milk_for_user(id)
        }
        (None, Some(t)) if caps.can_view_all_entries && user.is_none() => api.list_milk_by_type(t),
        (None, _) => api.list_milk(if user.is_some() {
            EntryScope::Own
        } else {
            EntryScope::for_capabilities(caps)
        }),
    };
    let mut entries = ctx.checked(result)?;
    if let Some(t) = milk_type {
        entries.retain(|e| e.milk_type == t);
    }

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No milk entries found");
        return Ok(());
    }
    let totals = StatsAggregator::totals(&entries);
    println!("{}", entries_table(&entries));
    println!(
        "{} entries, quantity {}, amount {}",
        entries.len(),
        format_decimal(totals.quantity),
        format_decimal(totals.amount)
    );
    Ok(())
}

fn show(ctx: &mut Context, id: i64, json: bool) -> Result<()> {
    ctx.session()?;
    let result = ctx.api()?.get_milk(id);
    let entry = ctx.checked(result)?;
    if json {
        print_json(&entry)
    } else {
        print!("{}", describe(&entry));
        Ok(())
    }
}

fn add(ctx: &mut Context, draft: MilkDraft) -> Result<()> {
    let request = new_milk_request(&draft, ctx.session()?, Local::now().date_naive())?;
    let result = ctx.api()?.create_milk(&request);
    let created = ctx.checked(result)?;
    match created.id {
        Some(id) => println!("Created entry #{}", id),
        None => println!("Created entry"),
    }
    Ok(())
}

fn update(ctx: &mut Context, id: i64, draft: MilkDraft) -> Result<()> {
    ctx.ensure(ctx.capabilities().can_modify_entries, "editing entries")?;
    let api = ctx.api()?;
    let result = api.get_milk(id);
    let existing = ctx.checked(result)?;

    let today = Local::now().date_naive();
    let request = edited_milk_request(&existing, &draft, ctx.session()?, today)?;
    let result = api.update_milk(id, &request);
    ctx.checked(result)?;
    println!(
        "Updated entry #{} (amount {})",
        id,
        format_decimal(request.amount)
    );
    Ok(())
}

fn delete(ctx: &mut Context, id: i64, yes: bool) -> Result<()> {
    ctx.ensure(ctx.capabilities().can_modify_entries, "deleting entries")?;
    if !yes && !confirm(&format!("Delete milk entry #{}?", id))? {
        println!("Cancelled");
        return Ok(());
    }
    let result = ctx.api()?.delete_milk(id);
    ctx.checked(result)?;
    println!("Deleted entry #{}", id);
    Ok(())
}

fn describe(entry: &MilkEntry) -> String {
    let id = entry.id.map(|id| format!("#{}", id)).unwrap_or_else(|| "-".into());
    format!(
        "Entry:    {}\nDate:     {}\nType:     {}\nQuantity: {}\nRate:     {}\nAmount:   {}\nUser:     {}\nCreated:  {}\nUpdated:  {}\n",
        id,
        format_day(entry.entry_date),
        entry.milk_type,
        format_decimal(entry.quantity),
        format_decimal(entry.rate),
        format_decimal(entry.amount),
        entry.owner_label(),
        entry
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into()),
        entry
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into()),
    )
}
