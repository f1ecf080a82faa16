//! Feed acquisition
//!
//! One attempt per run: a failed fetch is fatal and nothing is written.
//! Recovery from transient failures is the scheduler's job, not ours.

use anyhow::{bail, Context, Result};
use schedsync_core::FeedSource;
use tracing::info;

use crate::config::Config;

const USER_AGENT: &str = concat!("schedsync/", env!("CARGO_PKG_VERSION"));

/// Obtain the raw ICS text, from the configured file if set, else over
/// HTTP. Returns the text together with the source echoed into the
/// output document.
pub async fn fetch_feed(config: &Config) -> Result<(String, FeedSource)> {
    if let Some(path) = &config.ics_file {
        info!("Reading ICS feed from {}", path.display());
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read ICS file {}", path.display()))?;
        return Ok((text, FeedSource::new(path.display().to_string())));
    }

    let Some(url) = &config.ics_url else {
        bail!("No calendar source configured: set CALENDAR_ICS_URL or pass --ics / --ics-url");
    };

    info!("Fetching ICS feed from {url}");
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/calendar, text/plain;q=0.9")
        .send()
        .await
        .with_context(|| format!("ICS request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("ICS request failed with status {status}");
    }

    let text = response
        .text()
        .await
        .context("Failed to read ICS response body")?;
    Ok((text, FeedSource::new(url.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsync_core::CoreConfig;
    use std::io::Write;
    use std::path::PathBuf;

    fn config_with(ics_file: Option<PathBuf>) -> Config {
        Config {
            core: CoreConfig::default(),
            ics_url: None,
            ics_file,
            output: PathBuf::from("/tmp/out.json"),
            events_dir: PathBuf::from("_events"),
            locations_file: PathBuf::from("_data/locations.yml"),
        }
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "BEGIN:VCALENDAR").unwrap();

        let config = config_with(Some(file.path().to_path_buf()));
        let (text, source) = fetch_feed(&config).await.unwrap();
        assert!(text.starts_with("BEGIN:VCALENDAR"));
        assert_eq!(source.kind, "calendar-ics");
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let config = config_with(Some(PathBuf::from("/nonexistent/feed.ics")));
        assert!(fetch_feed(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_source_is_fatal() {
        let config = config_with(None);
        assert!(fetch_feed(&config).await.is_err());
    }
}
