//! Locally authored event catalog
//!
//! The catalog is the source of truth for which event series are
//! publishable: a calendar entry only reaches the schedule when its
//! summary matches a record here, by normalized title first, then slug.

use std::collections::HashMap;

use serde::Serialize;

use crate::normalize::{normalize, slugify};

/// One authored event record (front matter of a content page).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventRecord {
    pub slug: String,
    pub title: String,
    pub banner: String,
    pub intro: String,
    pub ticket_link: String,
    pub page_url: String,
}

impl EventRecord {
    /// Build a record from front-matter fields; the page URL defaults to
    /// `/events/<slug>/` unless an explicit permalink is given.
    pub fn new(slug: &str, title: &str) -> Self {
        let slug = slugify(slug);
        let page_url = format!("/events/{slug}/");
        Self {
            slug,
            title: title.to_string(),
            banner: String::new(),
            intro: String::new(),
            ticket_link: String::new(),
            page_url,
        }
    }
}

/// The record catalog with its normalized title/slug indices.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<EventRecord>,
    by_title: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(records: Vec<EventRecord>) -> Self {
        let mut by_title = HashMap::new();
        let mut by_slug = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_title.entry(normalize(&record.title)).or_insert(i);
            by_slug.entry(normalize(&record.slug)).or_insert(i);
        }
        Self {
            records,
            by_title,
            by_slug,
        }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Match a calendar summary against the catalog: normalized title,
    /// then normalized slug, then the slug derived from the summary.
    pub fn match_summary(&self, summary: &str) -> Option<&EventRecord> {
        let normalized = normalize(summary);
        if normalized.is_empty() {
            return None;
        }
        // the slug index is keyed on the normalized slug, so the same
        // folded summary covers both the slug and slugified-title forms
        let index = self
            .by_title
            .get(&normalized)
            .or_else(|| self.by_slug.get(&normalized))?;
        self.records.get(*index)
    }
}
