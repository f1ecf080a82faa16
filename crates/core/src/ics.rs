//! iCalendar (RFC 5545) line tokenizer
//!
//! Unfolds continuation lines, splits `NAME;PARAM=V:value` properties and
//! groups them into per-VEVENT records. The tokenizer is deliberately
//! forgiving: lines it cannot split are skipped, never fatal, and text
//! escapes are left in place for consumers to decode via [`decode_text`].

use std::collections::BTreeMap;

/// One property line after unfolding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    /// Property name, upper-cased (e.g. "DTSTART")
    pub name: String,

    /// Raw value text, still ICS-escaped
    pub value: String,

    /// `KEY=VALUE` parameters from the left side, keys upper-cased
    pub params: BTreeMap<String, String>,
}

impl RawProperty {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(&key.to_uppercase()).map(String::as_str)
    }
}

/// All properties of one `BEGIN:VEVENT`..`END:VEVENT` block.
///
/// Repeatable properties (EXDATE, RDATE, ATTENDEE) accumulate; singleton
/// lookups return the last occurrence when a property was repeated.
#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    props: BTreeMap<String, Vec<RawProperty>>,
}

impl RawEvent {
    fn push(&mut self, prop: RawProperty) {
        self.props.entry(prop.name.clone()).or_default().push(prop);
    }

    /// The last property with this name, if any (last wins for duplicated
    /// singletons such as UID or DTSTART).
    pub fn singleton(&self, name: &str) -> Option<&RawProperty> {
        self.props.get(name).and_then(|list| list.last())
    }

    /// All properties with this name, in feed order.
    pub fn all(&self, name: &str) -> &[RawProperty] {
        self.props.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn has(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// The last value text for this name, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.singleton(name).map(|p| p.value.as_str())
    }
}

/// Remove line folding: a line starting with one space or tab continues
/// the previous line. CRLF and bare LF are both accepted. Idempotent.
pub fn unfold(text: &str) -> String {
    unfold_lines(text).join("\n")
}

fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.replace("\r\n", "\n").split('\n') {
        let continuation = raw.starts_with(' ') || raw.starts_with('\t');
        if continuation && !lines.is_empty() {
            let last = lines.len() - 1;
            lines[last].push_str(&raw[1..]);
        } else {
            lines.push(raw.to_string());
        }
    }
    lines
}

/// Split the feed into per-VEVENT property records.
///
/// Lines outside `BEGIN:VEVENT`..`END:VEVENT` (calendar headers, VTIMEZONE
/// blocks) are ignored, as are blank and colon-less lines.
pub fn parse_events(text: &str) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut current: Option<RawEvent> = None;

    for line in unfold_lines(text) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        match line {
            "BEGIN:VEVENT" => current = Some(RawEvent::default()),
            "END:VEVENT" => {
                if let Some(event) = current.take() {
                    events.push(event);
                }
            }
            _ => {
                if let Some(event) = current.as_mut()
                    && let Some(prop) = parse_line(line)
                {
                    event.push(prop);
                }
            }
        }
    }
    events
}

/// Split one unfolded line into a [`RawProperty`]. Returns `None` for
/// lines without a colon.
pub fn parse_line(line: &str) -> Option<RawProperty> {
    let (left, value) = line.split_once(':')?;

    let mut parts = left.split(';');
    let name = parts.next()?.to_uppercase();
    if name.is_empty() {
        return None;
    }

    let mut params = BTreeMap::new();
    for part in parts {
        if let Some((key, val)) = part.split_once('=') {
            params.insert(key.to_uppercase(), val.to_string());
        }
    }

    Some(RawProperty {
        name,
        value: value.to_string(),
        params,
    })
}

/// Decode ICS text escaping: `\n`/`\N` to newline, `\,` `\;` `\\` to the
/// literal character. Unknown escapes keep the escaped character.
pub fn decode_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}
