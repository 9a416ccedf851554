//! Parser for relation fields such as `Depends: libc6 (>= 2.34), mail-transport-agent | exim4`

use debcache_version::VersionConstraint;

use crate::error::{CacheError, Result};

/// One alternative of a relation field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// Architecture qualifier (`foo:any`, `foo:i386`)
    pub arch: Option<String>,
    pub constraint: Option<VersionConstraint>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), arch: None, constraint: None }
    }
}

/// Parse a relation field into or-groups.
pub fn parse_relations(field: &str) -> Result<Vec<Vec<Relation>>> {
    field
        .split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(|group| group.split('|').map(parse_relation).collect())
        .collect()
}

/// Parse a single alternative, e.g. `libfoo1:any (>= 1.0) [amd64]`.
///
/// Architecture restriction lists and build profiles are dropped; they only
/// appear in source control files.
pub fn parse_relation(relation: &str) -> Result<Relation> {
    let invalid = |reason: &str| CacheError::InvalidRelation {
        relation: relation.trim().to_string(),
        reason: reason.to_string(),
    };

    let text = strip_restrictions(relation.trim());

    let (name_part, constraint) = match text.find('(') {
        Some(open) => {
            let close = text[open..].find(')').ok_or_else(|| invalid("unterminated version"))? + open;
            let constraint: VersionConstraint = text[open + 1..close]
                .parse()
                .map_err(|e: debcache_version::VersionError| invalid(&e.to_string()))?;
            (text[..open].trim(), Some(constraint))
        }
        None => (text, None),
    };

    if name_part.is_empty() {
        return Err(invalid("missing package name"));
    }
    if name_part.contains(char::is_whitespace) {
        return Err(invalid("unexpected whitespace in package name"));
    }

    let (name, arch) = match name_part.split_once(':') {
        Some((name, arch)) if !arch.is_empty() => (name, Some(arch.to_string())),
        Some(_) => return Err(invalid("empty architecture qualifier")),
        None => (name_part, None),
    };

    Ok(Relation {
        name: name.to_string(),
        arch,
        constraint,
    })
}

fn strip_restrictions(text: &str) -> &str {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '[' | '<' if depth == 0 => return text[..i].trim_end(),
            _ => {}
        }
    }
    text
}
