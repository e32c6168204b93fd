//! Core business logic abstractions

pub mod budget;
pub mod cache;
pub mod config;
pub mod currency;
pub mod format;
pub mod goal;
pub mod log;
pub mod records;

// Re-export main types for cleaner imports
pub use budget::{BudgetProgress, BudgetRecord, ProgressColor, derive_budget_progress};
pub use cache::{CacheLookup, KeyValueCollection, Store};
pub use currency::{Conversion, CurrencyPreferences, CurrencyService, RateTable, convert};
pub use format::{CurrencyFormatter, FormatOptions, Locale};
pub use goal::{GoalProgress, GoalRecord, derive_goal_progress};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Record ids arrive as strings or integers depending on the endpoint.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Accepts RFC 3339 timestamps, offset-less date-times (as UTC) and plain
/// `YYYY-MM-DD` dates (as UTC midnight).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}")))
}

/// Informational timestamps: missing, null or unreadable values become `None`.
pub(crate) fn deserialize_opt_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = parse_timestamp(&s);
        if parsed.is_none() {
            tracing::debug!("Ignoring unreadable timestamp: {}", s);
        }
        parsed
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-01T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2025-06-30T10:00:00"),
            Some(Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2025-06-30 10:00:00.250").map(|d| d.timestamp_millis()),
            Some(
                Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0)
                    .unwrap()
                    .timestamp_millis()
                    + 250
            )
        );
        assert_eq!(parse_timestamp("01/03/2024"), None);
    }
}
