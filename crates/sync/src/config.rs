//! Configuration for the sync job
//!
//! Loads configuration from environment variables; CLI flags override
//! individual fields after loading.

use anyhow::{Context, Result};
use schedsync_core::CoreConfig;
use std::env;
use std::ops::Deref;
use std::path::PathBuf;
use url::Url;

/// Sync job configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Core pipeline configuration
    pub core: CoreConfig,

    /// Feed URL (CALENDAR_ICS_URL); a configured file takes precedence
    pub ics_url: Option<Url>,

    /// Local ICS file to read instead of fetching (CALENDAR_ICS_FILE)
    pub ics_file: Option<PathBuf>,

    /// Output path for the schedule document (default: _data/event_schedule.json)
    pub output: PathBuf,

    /// Directory of authored event pages (default: _events)
    pub events_dir: PathBuf,

    /// Venue directory file (default: _data/locations.yml)
    pub locations_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let core = CoreConfig::from_env()?;

        let ics_url = match env::var("CALENDAR_ICS_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim()).context("CALENDAR_ICS_URL must be a valid URL")?,
            ),
            _ => None,
        };

        Ok(Self {
            core,
            ics_url,
            ics_file: env::var("CALENDAR_ICS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            output: path_var("SCHEDULE_OUTPUT", "_data/event_schedule.json"),
            events_dir: path_var("EVENTS_DIR", "_events"),
            locations_file: path_var("LOCATIONS_FILE", "_data/locations.yml"),
        })
    }
}

impl Deref for Config {
    type Target = CoreConfig;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}
