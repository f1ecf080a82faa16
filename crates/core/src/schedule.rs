//! Schedule document assembly
//!
//! Joins resolved occurrences against the authored catalog, attaches
//! venue data, drops past and unmatched entries, and assembles the JSON
//! document the site renderer consumes. The document is a pure function
//! of the inputs and the run's "now" — rebuilding from identical inputs
//! yields identical output.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;

use crate::catalog::{Catalog, EventRecord};
use crate::config::CoreConfig;
use crate::ics;
use crate::occurrence::{resolve_events, Occurrence};
use crate::venue::{ResolvedVenue, VenueDirectory};
use crate::warnings::Warnings;

/// Where the feed came from, echoed into the document for audits.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSource {
    pub kind: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            kind: "calendar-ics".to_string(),
            url: url.into(),
        }
    }
}

/// One renderable schedule row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub description: String,
    /// Zone-offset display form, e.g. `2024-06-01T19:30:00+05:30`
    pub start_iso: String,
    /// Canonical sort/comparison key, e.g. `2024-06-01T14:00:00Z`
    pub start_utc: String,
    pub timezone: String,
    pub date_label: String,
    pub time_label: String,
    pub day: String,
    pub month: String,
    pub location_name: String,
    pub location_url: String,
    pub location_raw: String,
    pub ticket_url: String,
    pub page_url: String,
    pub banner: String,
    pub intro: String,
    pub duration_hours: Option<f64>,
}

/// Per-series grouping with its nearest future occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct SlugBucket {
    pub slug: String,
    pub title: String,
    pub intro: String,
    pub banner: String,
    pub ticket_url: String,
    pub page_url: String,
    pub upcoming: Vec<ScheduleEntry>,
    pub next: Option<ScheduleEntry>,
}

impl SlugBucket {
    fn seed(record: &EventRecord) -> Self {
        Self {
            slug: record.slug.clone(),
            title: record.title.clone(),
            intro: record.intro.clone(),
            banner: record.banner.clone(),
            ticket_url: record.ticket_link.clone(),
            page_url: record.page_url.clone(),
            upcoming: Vec::new(),
            next: None,
        }
    }
}

/// Catalog records with no scheduled occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct OtherEvent {
    pub slug: String,
    pub title: String,
    pub intro: String,
    pub banner: String,
    pub page_url: String,
    pub ticket_url: String,
}

/// The complete output document.
#[derive(Debug, Serialize)]
pub struct ScheduleDocument {
    pub generated_at: String,
    pub source: FeedSource,
    pub timezone: String,
    pub warnings: Vec<String>,
    pub upcoming: Vec<ScheduleEntry>,
    pub other: Vec<OtherEvent>,
    pub scheduled_slugs: Vec<String>,
    pub by_slug: BTreeMap<String, SlugBucket>,
}

/// Run the full pipeline over raw feed text.
///
/// Takes ownership of the run's warning accumulator and embeds it in the
/// document; every recoverable condition inside the pipeline lands there.
pub fn build(
    feed_text: &str,
    catalog: &Catalog,
    venues: &VenueDirectory,
    now: DateTime<Utc>,
    config: &CoreConfig,
    source: FeedSource,
    mut warnings: Warnings,
) -> ScheduleDocument {
    let events = ics::parse_events(feed_text);
    if events.is_empty() {
        warnings.push("No events were parsed from the calendar feed");
    }
    let occurrences = resolve_events(&events, config.default_timezone, &mut warnings);
    assemble(occurrences, catalog, venues, now, config, source, warnings)
}

struct Staged {
    start: DateTime<Utc>,
    future: bool,
    entry: ScheduleEntry,
}

fn assemble(
    occurrences: Vec<Occurrence>,
    catalog: &Catalog,
    venues: &VenueDirectory,
    now: DateTime<Utc>,
    config: &CoreConfig,
    source: FeedSource,
    mut warnings: Warnings,
) -> ScheduleDocument {
    let mut staged: Vec<Staged> = Vec::new();
    let mut seen: HashSet<(String, i64)> = HashSet::new();

    for occ in occurrences {
        let Some(record) = catalog.match_summary(&occ.summary) else {
            warnings.push(format!(
                "Skipping calendar entry without matching event: \"{}\"",
                occ.summary
            ));
            continue;
        };
        if occ.all_day && !config.include_all_day {
            continue;
        }

        let future = occ.start.utc >= now;
        if !future && !config.keep_past_in_buckets {
            continue;
        }

        // redundant feed entries: one entry per (slug, start), first wins
        if !seen.insert((record.slug.clone(), occ.start.utc.timestamp())) {
            continue;
        }

        let venue = venues.resolve(occ.location.as_deref().unwrap_or(""), &mut warnings);
        staged.push(Staged {
            start: occ.start.utc,
            future,
            entry: make_entry(&occ, record, venue),
        });
    }

    // ascending by start; slug breaks exact-instant ties deterministically
    staged.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.entry.slug.cmp(&b.entry.slug))
    });

    let mut upcoming = Vec::new();
    let mut scheduled_slugs: Vec<String> = Vec::new();
    let mut by_slug: BTreeMap<String, SlugBucket> = catalog
        .records()
        .iter()
        .map(|record| (record.slug.clone(), SlugBucket::seed(record)))
        .collect();

    for item in &staged {
        if item.future {
            if !scheduled_slugs.contains(&item.entry.slug) {
                scheduled_slugs.push(item.entry.slug.clone());
            }
            upcoming.push(item.entry.clone());
        }
        if let Some(bucket) = by_slug.get_mut(&item.entry.slug) {
            if item.future && bucket.next.is_none() {
                bucket.next = Some(item.entry.clone());
            }
            bucket.upcoming.push(item.entry.clone());
        }
    }

    let other = catalog
        .records()
        .iter()
        .filter(|record| !scheduled_slugs.contains(&record.slug))
        .map(|record| OtherEvent {
            slug: record.slug.clone(),
            title: record.title.clone(),
            intro: record.intro.clone(),
            banner: record.banner.clone(),
            page_url: record.page_url.clone(),
            ticket_url: record.ticket_link.clone(),
        })
        .collect();

    ScheduleDocument {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        source,
        timezone: config.default_timezone.name().to_string(),
        warnings: warnings.into_vec(),
        upcoming,
        other,
        scheduled_slugs,
        by_slug,
    }
}

fn make_entry(occ: &Occurrence, record: &EventRecord, venue: ResolvedVenue) -> ScheduleEntry {
    let local = occ.start.utc.with_timezone(&occ.start.zone);

    let time_label = if occ.all_day {
        "All day".to_string()
    } else {
        let (is_pm, hour) = local.hour12();
        format!(
            "{}:{:02} {}",
            hour,
            local.minute(),
            if is_pm { "PM" } else { "AM" }
        )
    };

    let duration_hours = occ.end.map(|end| {
        let seconds = (end.utc - occ.start.utc).num_seconds().max(0);
        (seconds as f64 / 3600.0 * 100.0).round() / 100.0
    });

    ScheduleEntry {
        slug: record.slug.clone(),
        title: record.title.clone(),
        summary: occ.summary.clone(),
        description: occ.description.clone().unwrap_or_default(),
        start_iso: local.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        start_utc: occ.start.utc.to_rfc3339_opts(SecondsFormat::Secs, true),
        timezone: occ.start.zone.name().to_string(),
        date_label: local.format("%a, %d %b '%y").to_string(),
        time_label,
        day: local.format("%d").to_string(),
        month: local.format("%b").to_string(),
        location_name: venue.name,
        location_url: venue.map_url,
        location_raw: venue.raw,
        ticket_url: record.ticket_link.clone(),
        page_url: record.page_url.clone(),
        banner: record.banner.clone(),
        intro: record.intro.clone(),
        duration_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::VenueEntry;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn catalog() -> Catalog {
        let mut game_night = EventRecord::new("game-night", "Game Night");
        game_night.banner = "/assets/gn.jpg".to_string();
        game_night.intro = "Tabletop evening".to_string();
        game_night.ticket_link = "https://tickets.example.com/gn".to_string();
        let quiz = EventRecord::new("pub-quiz", "Pub Quiz");
        Catalog::new(vec![game_night, quiz])
    }

    fn venues() -> VenueDirectory {
        VenueDirectory::new(vec![VenueEntry {
            name: "Example Hall".to_string(),
            map_url: "https://maps.example.com/hall".to_string(),
            aliases: Vec::new(),
        }])
    }

    fn build_doc(feed: &str, config: &CoreConfig) -> ScheduleDocument {
        build(
            feed,
            &catalog(),
            &venues(),
            fixed_now(),
            config,
            FeedSource::new("https://calendar.example.com/basic.ics"),
            Warnings::new(),
        )
    }

    fn config_utc() -> CoreConfig {
        CoreConfig {
            default_timezone: chrono_tz::UTC,
            ..CoreConfig::default()
        }
    }

    const FEED: &str = "BEGIN:VCALENDAR\n\
        BEGIN:VEVENT\n\
        UID:gn@example.com\n\
        SUMMARY:Game Night\n\
        DTSTART;TZID=Asia/Kolkata:20240615T193000\n\
        DTEND;TZID=Asia/Kolkata:20240615T223000\n\
        LOCATION:Example Hall\\, MG Road\\, Bangalore\n\
        DESCRIPTION:Bring snacks\n\
        END:VEVENT\n\
        END:VCALENDAR\n";

    #[test]
    fn test_matched_future_entry() {
        let doc = build_doc(FEED, &config_utc());

        assert_eq!(doc.upcoming.len(), 1);
        let entry = &doc.upcoming[0];
        assert_eq!(entry.slug, "game-night");
        assert_eq!(entry.title, "Game Night");
        assert_eq!(entry.start_utc, "2024-06-15T14:00:00Z");
        assert_eq!(entry.start_iso, "2024-06-15T19:30:00+05:30");
        assert_eq!(entry.timezone, "Asia/Kolkata");
        assert_eq!(entry.date_label, "Sat, 15 Jun '24");
        assert_eq!(entry.time_label, "7:30 PM");
        assert_eq!(entry.day, "15");
        assert_eq!(entry.month, "Jun");
        assert_eq!(entry.location_name, "Example Hall");
        assert_eq!(entry.location_url, "https://maps.example.com/hall");
        assert_eq!(entry.duration_hours, Some(3.0));
        assert_eq!(entry.ticket_url, "https://tickets.example.com/gn");
        assert_eq!(entry.page_url, "/events/game-night/");

        let bucket = &doc.by_slug["game-night"];
        assert_eq!(bucket.upcoming.len(), 1);
        assert_eq!(bucket.next.as_ref().unwrap().start_utc, entry.start_utc);

        assert_eq!(doc.scheduled_slugs, vec!["game-night"]);
        // the quiz has no occurrence and lands in `other`
        assert_eq!(doc.other.len(), 1);
        assert_eq!(doc.other[0].slug, "pub-quiz");
    }

    #[test]
    fn test_unmatched_summary_warns_and_drops() {
        let feed = "BEGIN:VEVENT\n\
            UID:x@example.com\n\
            SUMMARY:Secret Gathering\n\
            DTSTART:20240615T190000Z\n\
            END:VEVENT\n";
        let doc = build_doc(feed, &config_utc());

        assert!(doc.upcoming.is_empty());
        assert!(doc.by_slug.values().all(|b| b.upcoming.is_empty()));
        assert!(doc
            .warnings
            .iter()
            .any(|w| w.contains("Secret Gathering")));
    }

    #[test]
    fn test_past_occurrences_never_upcoming() {
        let feed = "BEGIN:VEVENT\n\
            UID:gn@example.com\n\
            SUMMARY:Game Night\n\
            DTSTART:20240101T190000Z\n\
            END:VEVENT\n";

        let doc = build_doc(feed, &config_utc());
        assert!(doc.upcoming.is_empty());
        assert!(doc.by_slug["game-night"].upcoming.is_empty());

        // with history retention the bucket keeps it, upcoming still not
        let config = CoreConfig {
            keep_past_in_buckets: true,
            ..config_utc()
        };
        let doc = build_doc(feed, &config);
        assert!(doc.upcoming.is_empty());
        assert_eq!(doc.by_slug["game-night"].upcoming.len(), 1);
        assert!(doc.by_slug["game-night"].next.is_none());
        assert!(doc.scheduled_slugs.is_empty());
    }

    #[test]
    fn test_redundant_feed_entries_deduplicated() {
        let feed = "BEGIN:VEVENT\n\
            UID:gn@example.com\n\
            SUMMARY:Game Night\n\
            DTSTART:20240615T190000Z\n\
            END:VEVENT\n\
            BEGIN:VEVENT\n\
            UID:gn-copy@example.com\n\
            SUMMARY:Game Night\n\
            DTSTART:20240615T190000Z\n\
            END:VEVENT\n";
        let doc = build_doc(feed, &config_utc());
        assert_eq!(doc.upcoming.len(), 1);
    }

    #[test]
    fn test_all_day_policy() {
        let feed = "BEGIN:VEVENT\n\
            UID:gn@example.com\n\
            SUMMARY:Game Night\n\
            DTSTART;VALUE=DATE:20240615\n\
            END:VEVENT\n";

        let included = build_doc(feed, &config_utc());
        assert_eq!(included.upcoming.len(), 1);
        assert_eq!(included.upcoming[0].time_label, "All day");
        assert_eq!(included.upcoming[0].duration_hours, None);

        let config = CoreConfig {
            include_all_day: false,
            ..config_utc()
        };
        let excluded = build_doc(feed, &config);
        assert!(excluded.upcoming.is_empty());
    }

    #[test]
    fn test_upcoming_sorted_and_deterministic() {
        let feed = "BEGIN:VEVENT\n\
            UID:quiz@example.com\n\
            SUMMARY:Pub Quiz\n\
            DTSTART:20240620T190000Z\n\
            END:VEVENT\n\
            BEGIN:VEVENT\n\
            UID:gn@example.com\n\
            SUMMARY:Game Night\n\
            DTSTART:20240615T190000Z\n\
            RRULE:FREQ=WEEKLY;COUNT=2\n\
            END:VEVENT\n";

        let doc = build_doc(feed, &config_utc());
        let starts: Vec<_> = doc.upcoming.iter().map(|e| e.start_utc.as_str()).collect();
        assert_eq!(
            starts,
            vec![
                "2024-06-15T19:00:00Z",
                "2024-06-20T19:00:00Z",
                "2024-06-22T19:00:00Z",
            ]
        );
        // earliest-start insertion order
        assert_eq!(doc.scheduled_slugs, vec!["game-night", "pub-quiz"]);

        let again = build_doc(feed, &config_utc());
        assert_eq!(
            serde_json::to_string(&doc.upcoming).unwrap(),
            serde_json::to_string(&again.upcoming).unwrap()
        );
    }

    #[test]
    fn test_empty_feed_warns() {
        let doc = build_doc("", &config_utc());
        assert!(doc.upcoming.is_empty());
        assert!(!doc.warnings.is_empty());
        assert_eq!(doc.generated_at, "2024-06-01T00:00:00Z");
    }
}
