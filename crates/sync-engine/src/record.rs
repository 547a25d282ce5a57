//! Field extraction from raw Guesty records.
//!
//! Upstream records are loosely typed: numbers arrive as strings, timestamps
//! in several shapes, nested objects may be absent. These helpers return
//! `None` for anything unusable so callers can apply their own defaults.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Upstream primary key (`_id`).
pub fn external_id(record: &Value) -> Option<String> {
    match record.get("_id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Non-empty string field.
pub fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Field at a dotted path such as `address.full`.
pub fn path<'a>(record: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(record, |value, key| value.get(key))
        .filter(|value| !value.is_null())
}

/// Numeric field, accepting numbers and numeric strings.
pub fn f64_field(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Integer field; fractional values are truncated.
pub fn i64_field(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Boolean field.
pub fn bool_field(value: Option<&Value>) -> Option<bool> {
    value?.as_bool()
}

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) and bare
/// dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar date of an upstream date or timestamp string.
///
/// The date portion is taken as written, without timezone conversion, so a
/// check-in of `2024-06-01T23:00:00-05:00` stays on June 1st.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// RFC 3339 rendering used for every stored timestamp.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Hex SHA-256 of the lower-cased email; `None` for a missing or empty email.
pub fn hash_email(email: Option<&str>) -> Option<String> {
    let email = email.map(str::trim).filter(|e| !e.is_empty())?;
    let mut hasher = Sha256::new();
    hasher.update(email.to_lowercase().as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Amount in minor currency units: `round(amount * 100)`.
pub fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Whole days from `earlier` to `later`, clamped at zero.
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days().max(0)
}

/// Timestamp fields consulted, in order, for when a reservation was booked.
pub const BOOKED_AT_FIELDS: [&str; 5] = ["createdAt", "bookedAt", "confirmedAt", "created_at", "updatedAt"];

/// Booking timestamp of a reservation, falling back to check-in at midnight UTC.
///
/// Returns the timestamp and whether it came from the fallback.
pub fn booked_at(record: &Value, check_in: NaiveDate) -> (DateTime<Utc>, bool) {
    let found = BOOKED_AT_FIELDS
        .iter()
        .filter_map(|key| str_field(record, key))
        .find_map(parse_timestamp);

    match found {
        Some(at) => (at, false),
        None => (check_in.and_time(chrono::NaiveTime::MIN).and_utc(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_external_id() {
        assert_eq!(external_id(&json!({"_id": "abc"})), Some("abc".to_string()));
        assert_eq!(external_id(&json!({"_id": 42})), Some("42".to_string()));
        assert_eq!(external_id(&json!({"_id": ""})), None);
        assert_eq!(external_id(&json!({"id": "abc"})), None);
    }

    #[test]
    fn test_path() {
        let record = json!({"address": {"full": "1 Ocean Dr"}, "money": null});
        assert_eq!(path(&record, "address.full").and_then(Value::as_str), Some("1 Ocean Dr"));
        assert!(path(&record, "address.city").is_none());
        assert!(path(&record, "money.totalPrice").is_none());
        assert!(path(&record, "money").is_none());
    }

    #[test]
    fn test_numbers_from_strings() {
        assert_eq!(f64_field(Some(&json!("450.50"))), Some(450.5));
        assert_eq!(f64_field(Some(&json!(1.5))), Some(1.5));
        assert_eq!(f64_field(Some(&json!("n/a"))), None);
        assert_eq!(i64_field(Some(&json!("3"))), Some(3));
        assert_eq!(i64_field(Some(&json!(2.0))), Some(2));
        assert_eq!(i64_field(None), None);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let expected = date(2024, 5, 1).and_hms_opt(12, 30, 0).unwrap().and_utc();
        assert_eq!(parse_timestamp("2024-05-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-01"),
            Some(date(2024, 5, 1).and_hms_opt(0, 0, 0).unwrap().and_utc())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_date_keeps_local_date() {
        assert_eq!(parse_date("2024-06-01"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date("2024-06-01T23:00:00-05:00"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date("06/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_hash_email_is_case_insensitive() {
        let lower = hash_email(Some("guest@example.com")).unwrap();
        assert_eq!(lower.len(), 64);
        assert_eq!(hash_email(Some("Guest@Example.COM")), Some(lower));
        assert_eq!(hash_email(Some("")), None);
        assert_eq!(hash_email(None), None);
    }

    #[test]
    fn test_minor_units_rounds() {
        assert_eq!(minor_units(450.5), 45_050);
        // 0.29 * 100 is 28.999999999999996 in binary floating point
        assert_eq!(minor_units(0.29), 29);
        assert_eq!(minor_units(0.0), 0);
    }

    #[test]
    fn test_days_between_clamps() {
        assert_eq!(days_between(date(2024, 6, 1), date(2024, 6, 4)), 3);
        assert_eq!(days_between(date(2024, 6, 4), date(2024, 6, 1)), 0);
    }

    #[test]
    fn test_booked_at_candidates_in_order() {
        let check_in = date(2024, 6, 1);

        let record = json!({"bookedAt": "2024-04-01T00:00:00Z", "updatedAt": "2024-05-01T00:00:00Z"});
        let (at, fallback) = booked_at(&record, check_in);
        assert_eq!(at, date(2024, 4, 1).and_hms_opt(0, 0, 0).unwrap().and_utc());
        assert!(!fallback);

        let record = json!({"createdAt": "garbage", "confirmedAt": "2024-03-01T10:00:00Z"});
        let (at, _) = booked_at(&record, check_in);
        assert_eq!(at, date(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap().and_utc());

        let (at, fallback) = booked_at(&json!({}), check_in);
        assert_eq!(at, check_in.and_hms_opt(0, 0, 0).unwrap().and_utc());
        assert!(fallback);
    }
}
