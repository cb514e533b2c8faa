//! Milk entry types and lenient wire decoding
//!
//! Entries cross a network boundary, so decoding never fails on a bad field:
//! numbers arriving as strings are parsed, anything non-numeric becomes 0,
//! and dates that cannot be read become `None`.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded milk transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "RawMilkEntry", rename_all = "camelCase")]
pub struct MilkEntry {
    pub id: Option<i64>,
    pub milk_type: String,
    pub quantity: f64,
    pub rate: f64,
    /// Stored amount, trusted as sent by the backend
    pub amount: f64,
    pub entry_date: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub user_id: Option<i64>,
    /// Owner's username (empty when the backend omits the nested user)
    pub username: String,
}

impl MilkEntry {
    /// Calendar day this entry belongs to
    pub fn entry_day(&self) -> Option<NaiveDate> {
        self.entry_date.map(|d| d.date())
    }

    /// Owner's username, else `#id`, else "-"
    pub fn owner_label(&self) -> String {
        if !self.username.is_empty() {
            self.username.clone()
        } else if let Some(id) = self.user_id {
            format!("#{}", id)
        } else {
            "-".to_string()
        }
    }
}

/// Wire shape of a milk record; every field optional and loosely typed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMilkEntry {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    milk_type: Option<Value>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    rate: Option<Value>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    entry_date: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    updated_at: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    username: Option<Value>,
    #[serde(default)]
    user: Option<Value>,
}

impl From<RawMilkEntry> for MilkEntry {
    fn from(raw: RawMilkEntry) -> Self {
        let owner = raw.user.as_ref().filter(|u| u.is_object());
        let user_id = coerce_i64(raw.user_id.as_ref())
            .or_else(|| owner.and_then(|u| coerce_i64(u.get("id"))));
        let username = owner
            .and_then(|u| u.get("username"))
            .and_then(Value::as_str)
            .or_else(|| raw.username.as_ref().and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        Self {
            id: coerce_i64(raw.id.as_ref()),
            milk_type: raw
                .milk_type
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            quantity: coerce_f64(raw.quantity.as_ref()),
            rate: coerce_f64(raw.rate.as_ref()),
            amount: coerce_f64(raw.amount.as_ref()),
            entry_date: parse_datetime(raw.entry_date.as_ref()),
            created_at: parse_datetime(raw.created_at.as_ref()),
            updated_at: parse_datetime(raw.updated_at.as_ref()),
            user_id,
            username,
        }
    }
}

/// Coerce a loosely typed JSON value to a finite f64 (0 on anything else)
pub fn coerce_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Coerce a loosely typed JSON value to an integer id
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the date representations the backend may produce.
///
/// Accepts ISO local date-times (`2024-01-15T00:00:00`), RFC 3339 with an
/// offset (converted to local time), bare dates, `[y, m, d, h, mi, s, ns]`
/// arrays and epoch milliseconds.
pub fn parse_datetime(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::String(s) => parse_datetime_str(s),
        Value::Array(parts) => {
            let part = |i: usize| {
                parts
                    .get(i)
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
            };
            // trailing time parts may be omitted
            let clock = |i: usize| if i < parts.len() { part(i) } else { Some(0) };
            let year = i32::try_from(parts.first()?.as_i64()?).ok()?;
            let date = NaiveDate::from_ymd_opt(year, part(1)?, part(2)?)?;
            let time = NaiveTime::from_hms_nano_opt(clock(3)?, clock(4)?, clock(5)?, clock(6)?)?;
            Some(date.and_time(time))
        }
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)
            .map(|utc| utc.with_timezone(&Local).naive_local()),
        _ => None,
    }
}

/// Parse a date-time string (see [`parse_datetime`])
pub fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    s.parse::<NaiveDate>()
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Payload for creating or updating a milk entry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilkRequest {
    pub milk_type: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    pub entry_date: NaiveDateTime,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_record() {
        let value = json!({
            "id": 7,
            "milkType": "Cow",
            "quantity": 10,
            "rate": 5.5,
            "amount": 55.0,
            "entryDate": "2024-01-15T00:00:00",
            "createdAt": "2024-01-15T08:30:12.123",
            "updatedAt": "2024-01-15T08:30:12",
            "userId": 3,
            "user": { "id": 3, "username": "asha", "email": "asha@example.com" }
        });
        let entry: MilkEntry = serde_json::from_value(value).unwrap();

        assert_eq!(entry.id, Some(7));
        assert_eq!(entry.milk_type, "Cow");
        assert_eq!(entry.quantity, 10.0);
        assert_eq!(entry.rate, 5.5);
        assert_eq!(entry.amount, 55.0);
        assert_eq!(
            entry.entry_day(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert!(entry.created_at.is_some());
        assert_eq!(entry.user_id, Some(3));
        assert_eq!(entry.username, "asha");
    }

    #[test]
    fn test_decode_coerces_bad_numbers_to_zero() {
        let value = json!({
            "id": 1,
            "milkType": "Buffalo",
            "quantity": "12.5",
            "rate": "abc",
            "amount": null
        });
        let entry: MilkEntry = serde_json::from_value(value).unwrap();

        assert_eq!(entry.quantity, 12.5);
        assert_eq!(entry.rate, 0.0);
        assert_eq!(entry.amount, 0.0);
        assert_eq!(entry.entry_date, None);
    }

    #[test]
    fn test_decode_empty_object() {
        let entry: MilkEntry = serde_json::from_value(json!({})).unwrap();
        assert_eq!(entry, MilkEntry::default());
    }

    #[test]
    fn test_decode_user_id_from_nested_user() {
        let value = json!({ "user": { "id": 9, "username": "ravi" } });
        let entry: MilkEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.user_id, Some(9));
        assert_eq!(entry.username, "ravi");
    }

    #[test]
    fn test_parse_datetime_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_time(NaiveTime::MIN);

        assert_eq!(parse_datetime(Some(&json!("2024-03-02"))), Some(midnight));
        assert_eq!(
            parse_datetime(Some(&json!("2024-03-02T00:00:00"))),
            Some(midnight)
        );
        assert_eq!(
            parse_datetime(Some(&json!("2024-03-02 00:00:00"))),
            Some(midnight)
        );
        assert_eq!(
            parse_datetime(Some(&json!([2024, 3, 2, 0, 0]))),
            Some(midnight)
        );
        assert_eq!(parse_datetime(Some(&json!([2024, 3]))), None);
        // parts that overflow their field are unparseable, not wrapped
        assert_eq!(parse_datetime(Some(&json!([4294969320i64, 3, 2]))), None);
        assert_eq!(parse_datetime(Some(&json!([2024, 3, 2, 4294967296u64]))), None);
        assert_eq!(parse_datetime(Some(&json!([2024, 3, 4294967298u64]))), None);
        assert_eq!(parse_datetime(Some(&json!("not a date"))), None);
        assert_eq!(parse_datetime(Some(&json!(""))), None);
        assert_eq!(parse_datetime(Some(&Value::Null)), None);
        assert_eq!(parse_datetime(None), None);
    }

    #[test]
    fn test_parse_datetime_rfc3339_is_converted_to_local() {
        let parsed = parse_datetime_str("2024-03-02T10:00:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-02T10:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_coerce_f64_rejects_non_finite_strings() {
        assert_eq!(coerce_f64(Some(&json!("NaN"))), 0.0);
        assert_eq!(coerce_f64(Some(&json!("inf"))), 0.0);
        assert_eq!(coerce_f64(Some(&json!(true))), 0.0);
        assert_eq!(coerce_f64(Some(&json!(" 4.25 "))), 4.25);
    }

    #[test]
    fn test_coerce_i64() {
        assert_eq!(coerce_i64(Some(&json!(42))), Some(42));
        assert_eq!(coerce_i64(Some(&json!(42.0))), Some(42));
        assert_eq!(coerce_i64(Some(&json!(42.5))), None);
        assert_eq!(coerce_i64(Some(&json!("17"))), Some(17));
        assert_eq!(coerce_i64(Some(&Value::Null)), None);
    }

    #[test]
    fn test_milk_request_serializes_camel_case() {
        let request = MilkRequest {
            milk_type: "Cow".into(),
            quantity: 2.0,
            rate: 40.0,
            amount: 80.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_time(NaiveTime::MIN),
            user_id: 4,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["milkType"], "Cow");
        assert_eq!(value["entryDate"], "2024-05-01T00:00:00");
        assert_eq!(value["userId"], 4);
    }
}
