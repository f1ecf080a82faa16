//! Shared configuration logic
//!
//! Handles loading of common environment variables.

use crate::error::ConfigError;
use chrono_tz::Tz;
use std::env;

/// Common configuration used by the schedule pipeline
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Default IANA timezone for timestamps without a TZID (default: Asia/Kolkata)
    pub default_timezone: Tz,

    /// Whether all-day events are included in the schedule (default: true)
    pub include_all_day: bool,

    /// Whether past occurrences are retained in per-slug history (default: false)
    pub keep_past_in_buckets: bool,
}

impl CoreConfig {
    /// Load common configuration from environment variables
    ///
    /// This will also initialize dotenv if it hasn't been done yet.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let tz_name = env::var("EVENT_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string());
        let default_timezone = tz_name.parse().map_err(|_| ConfigError::InvalidValue {
            name: "EVENT_TIMEZONE".to_string(),
            value: tz_name,
        })?;

        Ok(Self {
            default_timezone,
            include_all_day: bool_var("SCHEDULE_INCLUDE_ALL_DAY", true)?,
            keep_past_in_buckets: bool_var("SCHEDULE_KEEP_PAST", false)?,
        })
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_timezone: chrono_tz::Asia::Kolkata,
            include_all_day: true,
            keep_past_in_buckets: false,
        }
    }
}

/// Read a boolean environment variable, accepting 1/0/true/false/yes/no
fn bool_var(name: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
        },
    }
}
