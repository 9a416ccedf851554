//! deb822 control-file stanzas
//!
//! Packages, status and translation indexes, and the records read back by
//! [`Records`](crate::Records), are sequences of `Key: value` stanzas separated
//! by blank lines. Continuation lines start with whitespace.

use indexmap::IndexMap;

use crate::error::{CacheError, Result};

/// One parsed stanza. Key lookup is case-insensitive; field order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSection {
    fields: IndexMap<String, (String, String)>,
}

impl TagSection {
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_at(text, 0)
    }

    pub(crate) fn parse_at(text: &str, offset: u64) -> Result<Self> {
        let mut fields: IndexMap<String, (String, String)> = IndexMap::new();
        let mut last: Option<String> = None;

        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let key = last.as_ref().ok_or_else(|| CacheError::MalformedRecord {
                    offset,
                    reason: "continuation line before the first field".to_string(),
                })?;
                if let Some((_, value)) = fields.get_mut(key) {
                    value.push('\n');
                    value.push_str(&line[1..]);
                }
                continue;
            }

            if line.trim().is_empty() {
                break;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| CacheError::MalformedRecord {
                offset,
                reason: format!("line without a field name: '{}'", line),
            })?;
            let key = key.trim();
            let lower = key.to_ascii_lowercase();
            fields.insert(lower.clone(), (key.to_string(), value.trim().to_string()));
            last = Some(lower);
        }

        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(&key.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(&key.to_ascii_lowercase())
    }

    /// Field names as written, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.values().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split a deb822 document into `(byte offset, stanza text)` pairs.
pub fn stanzas(text: &str) -> Vec<(u64, &str)> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    let mut pos = 0;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        match (start, blank) {
            (None, false) => start = Some(pos),
            (Some(s), true) => {
                result.push((s as u64, &text[s..pos]));
                start = None;
            }
            _ => {}
        }
        pos += line.len();
    }

    if let Some(s) = start {
        result.push((s as u64, &text[s..]));
    }

    result
}
