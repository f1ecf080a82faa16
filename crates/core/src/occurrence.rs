//! Occurrence resolution for parsed feed events
//!
//! Splits the feed into master events and RECURRENCE-ID overrides,
//! expands each master through its recurrence rule, then applies
//! overrides and EXDATE exclusions to produce the effective occurrence
//! list handed to the schedule builder.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::ics::{decode_text, RawEvent};
use crate::recurrence::{expand, RecurrenceRule};
use crate::timestamp::{resolve_timestamp, ResolvedInstant};
use crate::warnings::Warnings;

/// Event status (CONFIRMED / TENTATIVE / CANCELLED)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    /// Parse a STATUS value; anything unrecognized counts as confirmed.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_uppercase).as_deref() {
            Some("CANCELLED") => Self::Cancelled,
            Some("TENTATIVE") => Self::Tentative,
            _ => Self::Confirmed,
        }
    }
}

/// One effective occurrence of a feed event, after recurrence expansion
/// and override application. Text fields are ICS-unescaped.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub uid: String,
    pub start: ResolvedInstant,
    pub end: Option<ResolvedInstant>,
    pub status: EventStatus,
    pub all_day: bool,
    /// Free-text location as it appeared in the feed
    pub location: Option<String>,
    pub description: Option<String>,
    pub summary: String,
}

/// A RECURRENCE-ID override block: replaces the master occurrence at one
/// instant, field-by-field with master fallback.
#[derive(Debug, Clone, Default)]
struct Override {
    start: Option<ResolvedInstant>,
    end: Option<ResolvedInstant>,
    status: Option<EventStatus>,
    location: Option<String>,
    description: Option<String>,
}

/// Resolve all feed events into effective occurrences.
pub fn resolve_events(
    events: &[RawEvent],
    default_zone: Tz,
    warnings: &mut Warnings,
) -> Vec<Occurrence> {
    let overrides = build_override_map(events, default_zone, warnings);

    let mut occurrences = Vec::new();
    for event in events.iter().filter(|e| !e.has("RECURRENCE-ID")) {
        resolve_master(event, &overrides, default_zone, warnings, &mut occurrences);
    }
    occurrences
}

/// Collect RECURRENCE-ID blocks keyed by `(uid, recurrence instant)`.
///
/// The key instant must match an expanded start exactly (whole-second
/// instants round-trip through ISO-8601, so exact equality is the
/// contract here; EXDATE is the only sub-second-tolerant comparison).
fn build_override_map(
    events: &[RawEvent],
    default_zone: Tz,
    warnings: &mut Warnings,
) -> HashMap<(String, DateTime<Utc>), Override> {
    let mut map = HashMap::new();
    for event in events {
        let Some(rid) = event.singleton("RECURRENCE-ID") else {
            continue;
        };
        let uid = event.value("UID").unwrap_or_default().to_string();
        let at = match resolve_timestamp(&rid.value, &rid.params, default_zone, warnings) {
            Ok(instant) => instant.utc,
            Err(err) => {
                warnings.push(format!("Skipping override for \"{uid}\": {err}"));
                continue;
            }
        };

        let start = event
            .singleton("DTSTART")
            .and_then(|p| resolve_timestamp(&p.value, &p.params, default_zone, warnings).ok());
        let end = event
            .singleton("DTEND")
            .and_then(|p| resolve_timestamp(&p.value, &p.params, default_zone, warnings).ok());

        map.insert(
            (uid, at),
            Override {
                start,
                end,
                status: event.value("STATUS").map(|s| EventStatus::parse(Some(s))),
                location: event.value("LOCATION").map(decode_text),
                description: event.value("DESCRIPTION").map(decode_text),
            },
        );
    }
    map
}

fn resolve_master(
    event: &RawEvent,
    overrides: &HashMap<(String, DateTime<Utc>), Override>,
    default_zone: Tz,
    warnings: &mut Warnings,
    out: &mut Vec<Occurrence>,
) {
    let uid = event.value("UID").unwrap_or_default().to_string();
    let summary = event.value("SUMMARY").map(decode_text).unwrap_or_default();
    let summary = summary.trim();
    if summary.is_empty() {
        return;
    }

    let status = EventStatus::parse(event.value("STATUS"));
    if status == EventStatus::Cancelled {
        return;
    }

    let Some(dtstart) = event.singleton("DTSTART") else {
        warnings.push(format!("Event \"{summary}\" has no DTSTART, skipping"));
        return;
    };
    let start = match resolve_timestamp(&dtstart.value, &dtstart.params, default_zone, warnings) {
        Ok(instant) => instant,
        Err(err) => {
            warnings.push(format!("Event \"{summary}\": {err}, skipping"));
            return;
        }
    };

    let end = match event.singleton("DTEND") {
        None => None,
        Some(prop) => match resolve_timestamp(&prop.value, &prop.params, default_zone, warnings) {
            Ok(instant) => Some(instant),
            Err(err) => {
                warnings.push(format!("Event \"{summary}\": {err}, ignoring end time"));
                None
            }
        },
    };
    let duration = end.map(|e| e.utc - start.utc);

    let rule = event
        .value("RRULE")
        .and_then(|value| RecurrenceRule::parse(value, default_zone, warnings));
    let exdates = collect_instants(event, "EXDATE", default_zone, warnings);
    let rdates = collect_instants(event, "RDATE", default_zone, warnings);

    let location = event.value("LOCATION").map(decode_text);
    let description = event.value("DESCRIPTION").map(decode_text);

    for occurrence_start in expand(start, rule.as_ref(), &rdates) {
        // EXDATE wins over any RDATE at the same instant
        if is_excluded(occurrence_start, &exdates) {
            continue;
        }

        let ovr = overrides.get(&(uid.clone(), occurrence_start.utc));

        let status = ovr.and_then(|o| o.status).unwrap_or(status);
        if status == EventStatus::Cancelled {
            continue;
        }

        let effective_start = ovr.and_then(|o| o.start).unwrap_or(occurrence_start);
        let effective_end = ovr.and_then(|o| o.end).or_else(|| {
            duration.map(|d| shifted_end(effective_start, d, end))
        });

        out.push(Occurrence {
            uid: uid.clone(),
            start: effective_start,
            end: effective_end,
            status,
            all_day: effective_start.all_day,
            location: ovr
                .and_then(|o| o.location.clone())
                .or_else(|| location.clone()),
            description: ovr
                .and_then(|o| o.description.clone())
                .or_else(|| description.clone()),
            summary: summary.to_string(),
        });
    }
}

/// Each occurrence ends its own master-length duration after it starts.
fn shifted_end(
    start: ResolvedInstant,
    duration: Duration,
    master_end: Option<ResolvedInstant>,
) -> ResolvedInstant {
    ResolvedInstant {
        utc: start.utc + duration,
        zone: start.zone,
        all_day: master_end.is_some_and(|e| e.all_day),
    }
}

/// EXDATE comparison absorbs sub-second round-off.
fn is_excluded(start: ResolvedInstant, exdates: &[ResolvedInstant]) -> bool {
    exdates
        .iter()
        .any(|ex| (ex.utc - start.utc).num_milliseconds().abs() < 1000)
}

/// Gather every instant from a repeatable, comma-separated date property
/// (EXDATE / RDATE).
fn collect_instants(
    event: &RawEvent,
    name: &str,
    default_zone: Tz,
    warnings: &mut Warnings,
) -> Vec<ResolvedInstant> {
    let mut instants = Vec::new();
    for prop in event.all(name) {
        for token in prop.value.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match resolve_timestamp(token, &prop.params, default_zone, warnings) {
                Ok(instant) => instants.push(instant),
                Err(err) => warnings.push(format!("Skipping {name} value: {err}")),
            }
        }
    }
    instants
}
