//! Recurrence rule parsing and bounded expansion
//!
//! Supports the FREQ/INTERVAL/COUNT/UNTIL subset of RFC 5545 RRULEs.
//! Stepping happens on the wall clock of the event's zone, so a 19:30
//! weekly event stays at 19:30 across DST transitions; month and year
//! steps shift the calendar field and clamp the day to the target
//! month's length. Expansion is always bounded by [`MAX_OCCURRENCES`].

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::timestamp::{resolve_timestamp, ResolvedInstant};
use crate::timezone::resolve_local;
use crate::warnings::Warnings;

/// Hard cap on generated occurrences per event, applied even when the
/// rule carries no COUNT or UNTIL.
pub const MAX_OCCURRENCES: usize = 200;

/// Supported recurrence frequencies. The BYDAY/BYMONTHDAY family is
/// intentionally not handled; rules using it repeat on the plain
/// frequency step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// A parsed RRULE value.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Parse an RRULE value string (`FREQ=WEEKLY;INTERVAL=2;COUNT=5`).
    ///
    /// Returns `None` when no supported FREQ is present; the event then
    /// keeps its single master occurrence. UNTIL is resolved against the
    /// default zone.
    pub fn parse(value: &str, default_zone: Tz, warnings: &mut Warnings) -> Option<Self> {
        let mut freq = None;
        let mut interval = 1u32;
        let mut count = None;
        let mut until = None;

        for part in value.split(';') {
            let Some((key, val)) = part.split_once('=') else {
                continue;
            };
            match key.to_uppercase().as_str() {
                "FREQ" => {
                    freq = Frequency::parse(val);
                    if freq.is_none() {
                        warnings.push(format!(
                            "Unsupported recurrence frequency \"{val}\", keeping single occurrence"
                        ));
                        return None;
                    }
                }
                "INTERVAL" => {
                    interval = val.parse().ok().filter(|&i: &u32| i > 0).unwrap_or(1);
                }
                "COUNT" => count = val.parse().ok(),
                "UNTIL" => {
                    match resolve_timestamp(val, &BTreeMap::new(), default_zone, warnings) {
                        Ok(instant) => until = Some(instant.utc),
                        Err(_) => {
                            warnings.push(format!("Unparsable UNTIL \"{val}\" in recurrence rule"));
                        }
                    }
                }
                _ => {}
            }
        }

        freq.map(|freq| Self {
            freq,
            interval,
            count,
            until,
        })
    }
}

/// Expand a master start into its occurrence starts: the rule-generated
/// sequence unioned with RDATE instants, deduplicated by absolute
/// instant and sorted ascending. Always contains the master start.
pub fn expand(
    start: ResolvedInstant,
    rule: Option<&RecurrenceRule>,
    rdates: &[ResolvedInstant],
) -> Vec<ResolvedInstant> {
    let mut occurrences = vec![start];

    if let Some(rule) = rule {
        let mut wall = start.utc.with_timezone(&start.zone).naive_local();
        loop {
            if occurrences.len() >= MAX_OCCURRENCES {
                break;
            }
            if let Some(count) = rule.count
                && occurrences.len() >= count as usize
            {
                break;
            }
            let Some(next) = step(wall, rule.freq, rule.interval) else {
                break;
            };
            wall = next;
            let utc = resolve_local(wall, start.zone);
            if let Some(until) = rule.until
                && utc > until
            {
                break;
            }
            occurrences.push(ResolvedInstant {
                utc,
                zone: start.zone,
                all_day: start.all_day,
            });
        }
    }

    occurrences.extend_from_slice(rdates);
    occurrences.sort();
    occurrences.dedup();
    occurrences
}

fn step(wall: NaiveDateTime, freq: Frequency, interval: u32) -> Option<NaiveDateTime> {
    match freq {
        Frequency::Daily => wall.checked_add_signed(Duration::days(i64::from(interval))),
        Frequency::Weekly => wall.checked_add_signed(Duration::days(7 * i64::from(interval))),
        Frequency::Monthly => add_months(wall, i64::from(interval)),
        Frequency::Yearly => add_months(wall, 12 * i64::from(interval)),
    }
}

/// Calendar-shift the month field, preserving the time of day and
/// clamping the day to the target month's length (Jan 31 + 1 month is
/// Feb 28/29, not Mar 2/3).
fn add_months(wall: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let total = i64::from(wall.year()) * 12 + i64::from(wall.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let day = wall.day().min(days_in_month(year, month));
    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(wall.time()))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}
