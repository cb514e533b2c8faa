//! Form validation for milk entries and account changes
//!
//! Everything here runs before a request is sent. Amounts are always
//! recomputed as `quantity × rate` and entry dates are sent at midnight.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::services::capabilities::capabilities_for;
use crate::services::session::Session;
use crate::types::{MilkEntry, MilkRequest, MilktrackError, PasswordChange, Result, UserUpdate};

const USERNAME_LEN: (usize, usize) = (3, 20);
const PASSWORD_LEN: (usize, usize) = (6, 40);
const EMAIL_MAX: usize = 50;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
});

/// Partially filled milk entry form. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilkDraft {
    pub milk_type: Option<String>,
    pub quantity: Option<f64>,
    pub rate: Option<f64>,
    pub entry_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
}

impl MilkDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Validate a new-entry form for the signed-in user
pub fn new_milk_request(
    draft: &MilkDraft,
    session: &Session,
    today: NaiveDate,
) -> Result<MilkRequest> {
    let milk_type = draft
        .milk_type
        .as_deref()
        .ok_or_else(|| MilktrackError::Validation("milk type is required".into()))?;
    let quantity = draft
        .quantity
        .ok_or_else(|| MilktrackError::Validation("quantity is required".into()))?;
    let rate = draft
        .rate
        .ok_or_else(|| MilktrackError::Validation("rate is required".into()))?;
    let user_id = assigned_user(draft.user_id, session)?;

    build(milk_type, quantity, rate, draft.entry_date.unwrap_or(today), user_id)
}

/// Merge an edit onto an existing entry; unspecified fields keep their value
pub fn edited_milk_request(
    existing: &MilkEntry,
    draft: &MilkDraft,
    session: &Session,
    today: NaiveDate,
) -> Result<MilkRequest> {
    if draft.is_empty() {
        return Err(MilktrackError::Validation("nothing to update".into()));
    }

    let milk_type = draft.milk_type.as_deref().unwrap_or(&existing.milk_type);
    let quantity = draft.quantity.unwrap_or(existing.quantity);
    let rate = draft.rate.unwrap_or(existing.rate);
    let entry_date = draft
        .entry_date
        .or_else(|| existing.entry_day())
        .unwrap_or(today);
    let user_id = assigned_user(draft.user_id.or(existing.user_id), session)?;

    build(milk_type, quantity, rate, entry_date, user_id)
}

fn assigned_user(requested: Option<i64>, session: &Session) -> Result<i64> {
    if capabilities_for(Some(session)).can_assign_entries {
        requested.ok_or_else(|| {
            MilktrackError::Validation("Please assign a user for this milk entry.".into())
        })
    } else if session.user.id > 0 {
        Ok(session.user.id)
    } else {
        Err(MilktrackError::NotSignedIn)
    }
}

fn build(
    milk_type: &str,
    quantity: f64,
    rate: f64,
    date: NaiveDate,
    user_id: i64,
) -> Result<MilkRequest> {
    let milk_type = milk_type.trim();
    if milk_type.is_empty() {
        return Err(MilktrackError::Validation("milk type must not be empty".into()));
    }
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(MilktrackError::Validation(format!(
            "quantity must be greater than 0 (got {})",
            quantity
        )));
    }
    if !(rate.is_finite() && rate > 0.0) {
        return Err(MilktrackError::Validation(format!(
            "rate must be greater than 0 (got {})",
            rate
        )));
    }

    Ok(MilkRequest {
        milk_type: milk_type.to_string(),
        quantity,
        rate,
        amount: quantity * rate,
        entry_date: date.and_time(NaiveTime::MIN),
        user_id,
    })
}

/// Validate an account update; at least one field must be present
pub fn validate_user_update(update: &UserUpdate) -> Result<()> {
    if *update == UserUpdate::default() {
        return Err(MilktrackError::Validation("nothing to update".into()));
    }
    if let Some(username) = &update.username {
        check_len("username", username, USERNAME_LEN)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(password) = &update.password {
        check_len("password", password, PASSWORD_LEN)?;
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.chars().count() > EMAIL_MAX {
        return Err(MilktrackError::Validation(format!(
            "email must be at most {} characters",
            EMAIL_MAX
        )));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(MilktrackError::Validation(format!("invalid email address: {}", email)));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    check_len("username", username, USERNAME_LEN)
}

pub fn validate_password(password: &str) -> Result<()> {
    check_len("password", password, PASSWORD_LEN)
}

pub fn validate_password_change(change: &PasswordChange) -> Result<()> {
    if change.current_password.is_empty() {
        return Err(MilktrackError::Validation("current password is required".into()));
    }
    if change.new_password != change.confirm_password {
        return Err(MilktrackError::Validation(
            "new password and confirmation do not match".into(),
        ));
    }
    check_len("new password", &change.new_password, PASSWORD_LEN)
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(MilktrackError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}
