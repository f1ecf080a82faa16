//! schedsync sync job
//!
//! Fetches the calendar feed, loads the authored catalog and venue
//! directory, runs the core pipeline and writes the schedule document.
//! Read, compute, write — in that order; only the read of the feed and
//! the final write can fail the run.

mod catalog;
mod config;
mod fetch;
mod locations;

pub use config::Config;

use anyhow::{Context, Result};
use chrono::Utc;
use schedsync_core::{schedule, Warnings};
use tracing::info;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub upcoming: usize,
    pub warnings: usize,
}

/// Execute one sync run
///
/// Fatal errors (unreachable feed, unwritable output) abort before the
/// document is touched; everything else degrades to warnings embedded in
/// the written document.
pub async fn run(config: Config) -> Result<RunSummary> {
    let mut warnings = Warnings::new();

    let (feed_text, source) = fetch::fetch_feed(&config).await?;

    let venues = locations::load_locations(&config.locations_file, &mut warnings).await;
    info!("Loaded {} venue directory entries", venues.len());

    let catalog = catalog::load_catalog(&config.events_dir, &mut warnings).await;
    info!("Loaded {} event records", catalog.len());

    let now = Utc::now();
    let document = schedule::build(
        &feed_text,
        &catalog,
        &venues,
        now,
        &config.core,
        source,
        warnings,
    );

    let json = format!(
        "{}\n",
        serde_json::to_string_pretty(&document).context("Failed to serialize schedule")?
    );
    if let Some(parent) = config.output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&config.output, json)
        .await
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    info!(
        "Wrote {} upcoming entries to {}",
        document.upcoming.len(),
        config.output.display()
    );

    Ok(RunSummary {
        upcoming: document.upcoming.len(),
        warnings: document.warnings.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsync_core::CoreConfig;
    use std::path::PathBuf;

    /// End-to-end run against a local feed and a temp content tree.
    #[tokio::test]
    async fn test_run_writes_schedule_document() {
        let dir = tempfile::tempdir().unwrap();
        let events_dir = dir.path().join("_events");
        std::fs::create_dir(&events_dir).unwrap();
        std::fs::write(
            events_dir.join("game-night.md"),
            "---\ntitle: Game Night\nticket_link: https://t.example/gn\n---\n",
        )
        .unwrap();

        let locations_file = dir.path().join("locations.yml");
        std::fs::write(
            &locations_file,
            "- name: Example Hall\n  map_url: https://maps.example.com/hall\n",
        )
        .unwrap();

        let feed_file = dir.path().join("feed.ics");
        std::fs::write(
            &feed_file,
            "BEGIN:VCALENDAR\r\n\
             BEGIN:VEVENT\r\n\
             UID:gn@example.com\r\n\
             SUMMARY:Game Night\r\n\
             DTSTART:29990615T190000Z\r\n\
             LOCATION:Example Hall\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR\r\n",
        )
        .unwrap();

        let output = dir.path().join("out/schedule.json");
        let config = Config {
            core: CoreConfig::default(),
            ics_url: None,
            ics_file: Some(feed_file),
            output: output.clone(),
            events_dir,
            locations_file,
        };

        let summary = run(config).await.unwrap();
        assert_eq!(summary.upcoming, 1);

        let written = std::fs::read_to_string(output).unwrap();
        let document: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(document["upcoming"][0]["slug"], "game-night");
        assert_eq!(
            document["upcoming"][0]["location_url"],
            "https://maps.example.com/hall"
        );
        assert!(written.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_run_fails_without_feed() {
        let config = Config {
            core: CoreConfig::default(),
            ics_url: None,
            ics_file: Some(PathBuf::from("/nonexistent/feed.ics")),
            output: PathBuf::from("/tmp/never-written.json"),
            events_dir: PathBuf::from("_events"),
            locations_file: PathBuf::from("_data/locations.yml"),
        };
        assert!(run(config).await.is_err());
    }
}
