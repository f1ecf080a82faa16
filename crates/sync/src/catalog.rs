//! Event catalog loading
//!
//! Walks the authored events directory and turns each Markdown file's
//! YAML front matter into an [`EventRecord`]. Problems with individual
//! files degrade to warnings; an unreadable directory yields an empty
//! catalog (and, downstream, an empty schedule).

use std::path::Path;

use schedsync_core::{Catalog, EventRecord, Warnings};
use serde::Deserialize;
use tracing::debug;

/// Front-matter fields we consume; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    slug: Option<String>,
    title: Option<String>,
    intro: Option<String>,
    tagline: Option<String>,
    banner: Option<String>,
    hero_image: Option<String>,
    ticket_link: Option<String>,
    permalink: Option<String>,
}

/// Load every event record from `dir`, in file-name order.
pub async fn load_catalog(dir: &Path, warnings: &mut Warnings) -> Catalog {
    let mut paths = Vec::new();
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                let is_markdown = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
                if is_markdown {
                    paths.push(path);
                }
            }
        }
        Err(err) => {
            warnings.push(format!(
                "Unable to read events directory {}: {err}",
                dir.display()
            ));
            return Catalog::default();
        }
    }
    // directory order is platform-dependent; sort for stable output
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) => {
                warnings.push(format!("Could not read {name}: {err}"));
                continue;
            }
        };
        if let Some(record) = parse_record(&name, &content, warnings) {
            debug!("Loaded event record {} from {name}", record.slug);
            records.push(record);
        }
    }
    Catalog::new(records)
}

fn parse_record(name: &str, content: &str, warnings: &mut Warnings) -> Option<EventRecord> {
    let Some(raw) = front_matter(content) else {
        warnings.push(format!("File {name} missing front matter"));
        return None;
    };
    let fm: FrontMatter = match serde_yaml::from_str(raw) {
        Ok(fm) => fm,
        Err(err) => {
            warnings.push(format!("Could not parse front matter for {name}: {err}"));
            return None;
        }
    };

    let Some(title) = fm.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        warnings.push(format!("File {name} has no title, skipping"));
        return None;
    };

    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let slug_source = fm.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut record = EventRecord::new(slug_source.unwrap_or(stem), title);
    record.intro = fm.intro.or(fm.tagline).unwrap_or_default();
    record.banner = fm.banner.or(fm.hero_image).unwrap_or_default();
    record.ticket_link = fm.ticket_link.unwrap_or_default();
    if let Some(permalink) = fm.permalink.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        record.page_url = permalink.to_string();
    }
    Some(record)
}

/// The YAML between the leading `---` fence and the next `---` line.
fn front_matter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let rest = rest.strip_prefix('\n')?;
    rest.find("\n---").map(|end| &rest[..end])
}
