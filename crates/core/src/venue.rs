//! Venue directory lookup
//!
//! Feed locations arrive as free text, often layered "Venue, Address,
//! City". Matching runs exact-whole-string first, then per segment, then
//! substring containment, all over the shared normalized form.

use std::collections::HashMap;

use serde::Deserialize;

use crate::normalize::normalize;
use crate::warnings::Warnings;

/// Placeholder shown when the feed carries no location at all.
const UNANNOUNCED: &str = "To Be Announced";

/// One venue directory record.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueEntry {
    pub name: String,
    #[serde(default)]
    pub map_url: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A resolved location: either a directory hit or the raw text passed
/// through with `matched = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVenue {
    pub name: String,
    pub map_url: String,
    pub raw: String,
    pub matched: bool,
}

/// The venue directory with its normalized lookup index.
#[derive(Debug, Default)]
pub struct VenueDirectory {
    entries: Vec<VenueEntry>,
    index: HashMap<String, usize>,
    /// Index keys in directory order, for the deterministic substring pass
    keys: Vec<(String, usize)>,
}

impl VenueDirectory {
    pub fn new(entries: Vec<VenueEntry>) -> Self {
        let mut index = HashMap::new();
        let mut keys = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            for candidate in std::iter::once(&entry.name).chain(&entry.aliases) {
                let key = normalize(candidate);
                if !key.is_empty() && !index.contains_key(&key) {
                    index.insert(key.clone(), i);
                    keys.push((key, i));
                }
            }
        }
        Self { entries, index, keys }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve decoded free-text location against the directory.
    ///
    /// A miss is never fatal: the raw text is passed through as the name
    /// and a warning is recorded so the directory can be extended.
    pub fn resolve(&self, raw_location: &str, warnings: &mut Warnings) -> ResolvedVenue {
        let cleaned = raw_location.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            return ResolvedVenue {
                name: UNANNOUNCED.to_string(),
                map_url: String::new(),
                raw: String::new(),
                matched: false,
            };
        }

        if let Some(entry) = self.lookup(&cleaned) {
            return self.hit(entry, &cleaned);
        }

        // "Venue, Address, City" — try each layer on its own
        for segment in raw_location.split(['\n', ',']) {
            if let Some(entry) = self.lookup(segment) {
                return self.hit(entry, &cleaned);
            }
        }

        // last resort: a directory key buried inside the text
        let haystack = normalize(&cleaned);
        for (key, i) in &self.keys {
            if haystack.contains(key.as_str()) {
                return self.hit(*i, &cleaned);
            }
        }

        warnings.push(format!("No location match for \"{cleaned}\""));
        ResolvedVenue {
            name: cleaned.clone(),
            map_url: String::new(),
            raw: cleaned,
            matched: false,
        }
    }

    fn lookup(&self, text: &str) -> Option<usize> {
        let key = normalize(text);
        if key.is_empty() {
            return None;
        }
        self.index.get(&key).copied()
    }

    fn hit(&self, index: usize, cleaned: &str) -> ResolvedVenue {
        let entry = &self.entries[index];
        ResolvedVenue {
            name: entry.name.clone(),
            map_url: entry.map_url.clone(),
            raw: cleaned.to_string(),
            matched: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> VenueDirectory {
        VenueDirectory::new(vec![
            VenueEntry {
                name: "Example Hall".to_string(),
                map_url: "https://maps.example.com/hall".to_string(),
                aliases: vec!["The Hall".to_string()],
            },
            VenueEntry {
                name: "Community Garden".to_string(),
                map_url: String::new(),
                aliases: Vec::new(),
            },
        ])
    }

    #[test]
    fn test_exact_match() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("example hall", &mut warnings);
        assert!(resolved.matched);
        assert_eq!(resolved.name, "Example Hall");
        assert_eq!(resolved.map_url, "https://maps.example.com/hall");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_alias_match() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("The Hall", &mut warnings);
        assert!(resolved.matched);
        assert_eq!(resolved.name, "Example Hall");
    }

    #[test]
    fn test_segment_match() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("Example Hall, MG Road, Bangalore", &mut warnings);
        assert!(resolved.matched);
        assert_eq!(resolved.name, "Example Hall");
        assert_eq!(resolved.raw, "Example Hall, MG Road, Bangalore");
    }

    #[test]
    fn test_newline_segment_match() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("Community Garden\n12 Side Street", &mut warnings);
        assert!(resolved.matched);
        assert_eq!(resolved.name, "Community Garden");
    }

    #[test]
    fn test_substring_match() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("At the lovely Example Hall venue", &mut warnings);
        assert!(resolved.matched);
        assert_eq!(resolved.name, "Example Hall");
    }

    #[test]
    fn test_miss_passes_raw_through_with_warning() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("Somewhere Else Entirely", &mut warnings);
        assert!(!resolved.matched);
        assert_eq!(resolved.name, "Somewhere Else Entirely");
        assert_eq!(resolved.map_url, "");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_empty_location_is_unannounced() {
        let mut warnings = Warnings::new();
        let resolved = directory().resolve("  ", &mut warnings);
        assert!(!resolved.matched);
        assert_eq!(resolved.name, "To Be Announced");
        assert!(warnings.is_empty());
    }
}
