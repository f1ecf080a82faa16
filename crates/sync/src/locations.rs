//! Venue directory loading
//!
//! The directory is YAML: either a sequence of `{name, map_url, aliases}`
//! records or the legacy map form `{key: {name, map_url}}`, where the key
//! doubles as an alias. A missing or malformed file degrades to an empty
//! directory with a warning.

use std::path::Path;

use schedsync_core::{VenueDirectory, VenueEntry, Warnings};
use serde_yaml::Value;

/// Load the venue directory from `path`.
pub async fn load_locations(path: &Path, warnings: &mut Warnings) -> VenueDirectory {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => {
            warnings.push(format!("Unable to read {}: {err}", path.display()));
            return VenueDirectory::default();
        }
    };
    match parse_entries(&text) {
        Ok(entries) => VenueDirectory::new(entries),
        Err(message) => {
            warnings.push(format!("Unable to parse {}: {message}", path.display()));
            VenueDirectory::default()
        }
    }
}

fn parse_entries(text: &str) -> Result<Vec<VenueEntry>, String> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(_) => serde_yaml::from_value(value).map_err(|e| e.to_string()),
        Value::Mapping(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| {
                let mut entry: VenueEntry = serde_yaml::from_value(value).ok()?;
                if let Some(alias) = key.as_str() {
                    entry.aliases.push(alias.to_string());
                }
                Some(entry)
            })
            .collect()),
        _ => Err("expected a sequence or mapping of venue records".to_string()),
    }
}
