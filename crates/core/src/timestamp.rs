//! ICS timestamp resolution
//!
//! Turns a `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]` token plus its parameters
//! into an absolute instant. Wall-clock tokens are resolved against the
//! TZID parameter zone, else the configured default zone; the platform
//! timezone database (via chrono-tz) supplies all offsets.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ScheduleError, ScheduleResult};
use crate::timezone::{parse_timezone, resolve_local};
use crate::warnings::Warnings;

/// An absolute instant with the zone it should be displayed in.
///
/// Identity, ordering and hashing use only the UTC instant; the zone is
/// presentation data and never participates in comparisons.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedInstant {
    pub utc: DateTime<Utc>,
    pub zone: Tz,
    pub all_day: bool,
}

impl PartialEq for ResolvedInstant {
    fn eq(&self, other: &Self) -> bool {
        self.utc == other.utc
    }
}

impl Eq for ResolvedInstant {}

impl PartialOrd for ResolvedInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolvedInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utc.cmp(&other.utc)
    }
}

impl Hash for ResolvedInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.utc.hash(state);
    }
}

/// Resolve an ICS date/date-time token against its parameter set.
///
/// A trailing `Z` marks UTC and overrides any TZID. A bare date (8-digit
/// token or `VALUE=DATE`) resolves to local midnight and is flagged
/// all-day. Unrecognized TZID values fall back to the default zone with a
/// warning. Tokens matching neither grammar are a [`ScheduleError::MalformedTimestamp`].
pub fn resolve_timestamp(
    value: &str,
    params: &BTreeMap<String, String>,
    default_zone: Tz,
    warnings: &mut Warnings,
) -> ScheduleResult<ResolvedInstant> {
    let token = value.trim();

    let is_date_only =
        params.get("VALUE").is_some_and(|v| v == "DATE") || is_digits(token, 8);

    if is_date_only {
        let date = parse_date(token)?;
        let zone = display_zone(params, default_zone, warnings);
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ScheduleError::MalformedTimestamp(token.to_string()))?;
        return Ok(ResolvedInstant {
            utc: resolve_local(midnight, zone),
            zone,
            all_day: true,
        });
    }

    if let Some(body) = token.strip_suffix('Z') {
        let wall = parse_datetime(body)?;
        // Z is authoritative; a TZID, if present, only picks the display zone
        let zone = params
            .get("TZID")
            .and_then(|tzid| parse_timezone(tzid).ok())
            .unwrap_or(default_zone);
        return Ok(ResolvedInstant {
            utc: Utc.from_utc_datetime(&wall),
            zone,
            all_day: false,
        });
    }

    let wall = parse_datetime(token)?;
    let zone = display_zone(params, default_zone, warnings);
    Ok(ResolvedInstant {
        utc: resolve_local(wall, zone),
        zone,
        all_day: false,
    })
}

/// The zone named by TZID when it parses, else the default zone.
fn display_zone(params: &BTreeMap<String, String>, default_zone: Tz, warnings: &mut Warnings) -> Tz {
    match params.get("TZID") {
        None => default_zone,
        Some(tzid) => match parse_timezone(tzid) {
            Ok(zone) => zone,
            Err(_) => {
                warnings.push(format!(
                    "Unknown timezone \"{tzid}\", using {}",
                    default_zone.name()
                ));
                default_zone
            }
        },
    }
}

fn is_digits(token: &str, len: usize) -> bool {
    token.len() == len && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_date(token: &str) -> ScheduleResult<NaiveDate> {
    if !is_digits(token, 8) {
        return Err(ScheduleError::MalformedTimestamp(token.to_string()));
    }
    NaiveDate::parse_from_str(token, "%Y%m%d")
        .map_err(|_| ScheduleError::MalformedTimestamp(token.to_string()))
}

fn parse_datetime(token: &str) -> ScheduleResult<NaiveDateTime> {
    let malformed = || ScheduleError::MalformedTimestamp(token.to_string());
    let (date, time) = token.split_once('T').ok_or_else(malformed)?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return Err(malformed());
    }
    NaiveDateTime::parse_from_str(token, "%Y%m%dT%H%M%S").map_err(|_| malformed())
}
