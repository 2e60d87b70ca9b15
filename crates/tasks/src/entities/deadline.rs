//! Lenient deadline parsing for API payloads.
//!
//! Browsers submit `datetime-local` values without seconds or offset, while
//! scripted clients tend to send RFC 3339. Offset-carrying values are
//! converted to local wall-clock time, which is what the deadline buckets
//! compare against.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a deadline string in any accepted format.
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_or_error<E: serde::de::Error>(value: &str) -> Result<NaiveDateTime, E> {
    parse(value).ok_or_else(|| E::custom(format!("invalid deadline '{value}'")))
}

/// `deserialize_with` for `Option<NaiveDateTime>` fields.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_or_error(&s))
        .transpose()
}

/// `deserialize_with` for patch fields: absent stays `None` (via
/// `#[serde(default)]`), explicit `null` becomes `Some(None)`.
pub fn deserialize_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional(deserializer).map(Some)
}
