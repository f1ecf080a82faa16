//! Timezone handling utilities
//!
//! Provides functions for parsing IANA zone names and resolving wall-clock
//! times against them safely.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ScheduleError, ScheduleResult};

/// Parse an IANA timezone string (e.g., "Asia/Kolkata", "Europe/London")
///
/// # Examples
///
/// ```
/// use schedsync_core::timezone::parse_timezone;
///
/// let tz = parse_timezone("Asia/Kolkata").unwrap();
/// assert_eq!(tz.name(), "Asia/Kolkata");
/// ```
pub fn parse_timezone(tz_str: &str) -> ScheduleResult<Tz> {
    tz_str
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(tz_str.to_string()))
}

/// Resolve a wall-clock time in the given zone to an absolute UTC instant.
///
/// Ambiguous times (the repeated hour of a DST fall-back) take the earlier
/// mapping. Nonexistent times (inside a spring-forward gap) are resolved
/// with the offset in force just before the gap.
pub fn resolve_local(wall: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let before_gap = wall - Duration::hours(1);
            match tz.from_local_datetime(&before_gap) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    (dt + Duration::hours(1)).with_timezone(&Utc)
                }
                // No sane tzdata zone has back-to-back gaps; treat as UTC.
                LocalResult::None => Utc.from_utc_datetime(&wall),
            }
        }
    }
}
