//! Generalized time (`YYYYMMDDHHMMSS[.f]Z`), used by `whenCreated` / `whenChanged`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Decode a generalized-time string. Fractions are ignored; the value is taken as UTC.
pub fn parse_generalized_time(raw: &str) -> Option<DateTime<Utc>> {
    let digits = raw.trim().get(..14)?;
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}
