//! Directory 64-bit timestamps: 100-nanosecond ticks since 1601-01-01 UTC.

use chrono::{DateTime, Datelike, Utc};

/// Ticks per second.
const TICKS_PER_SECOND: i64 = 10_000_000;
/// Seconds between 1601-01-01 and 1970-01-01.
const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Raw value meaning "never" for `accountExpires`.
pub const NEVER: i64 = 0;

/// Decode a raw timestamp.
///
/// `0`, `i64::MAX`, negative values and anything landing in the 1600/1601 epoch
/// years are "unset".
pub fn from_file_time(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 || ticks == i64::MAX {
        return None;
    }
    let secs = ticks.div_euclid(TICKS_PER_SECOND) - EPOCH_OFFSET_SECS;
    let nanos = u32::try_from(ticks.rem_euclid(TICKS_PER_SECOND) * 100).ok()?;
    DateTime::from_timestamp(secs, nanos).filter(|dt| dt.year() > 1601)
}

/// Encode a timestamp as raw ticks.
pub fn to_file_time(time: DateTime<Utc>) -> i64 {
    (time.timestamp() + EPOCH_OFFSET_SECS) * TICKS_PER_SECOND
        + i64::from(time.timestamp_subsec_nanos() / 100)
}
