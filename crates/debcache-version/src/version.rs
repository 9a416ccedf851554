use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::comparator::{cmp_versions, split_version};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version string is empty")]
    Empty,

    #[error("Epoch in version '{version}' is not a number")]
    InvalidEpoch { version: String },

    #[error("Invalid character in version '{version}'")]
    InvalidCharacter { version: String },

    #[error("Upstream version '{version}' does not start with a digit")]
    NoLeadingDigit { version: String },

    #[error("Invalid relation operator: {operator}")]
    UnknownOperator { operator: String },
}

lazy_static! {
    static ref EPOCH_RE: Regex = Regex::new(r"^\d+$").unwrap();

    // Upstream may contain hyphens only when a revision follows and colons
    // only when an epoch precedes, both of which are already split off.
    static ref UPSTREAM_RE: Regex = Regex::new(r"^[A-Za-z0-9.+~:-]+$").unwrap();

    static ref REVISION_RE: Regex = Regex::new(r"^[A-Za-z0-9.+~]*$").unwrap();
}

/// A validated Debian version: `[epoch:]upstream[-revision]`.
///
/// Equality follows Debian ordering, so `1.0` and `1.0-0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    epoch: u64,
    upstream: String,
    revision: String,
}

impl Version {
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }

        let epoch = match version.split_once(':') {
            Some((epoch, _)) if !EPOCH_RE.is_match(epoch) => {
                return Err(VersionError::InvalidEpoch { version: version.to_string() });
            }
            Some((epoch, _)) => epoch
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidEpoch { version: version.to_string() })?,
            None => 0,
        };

        let (_, upstream, revision) = split_version(version);
        if upstream.is_empty() || !UPSTREAM_RE.is_match(upstream) || !REVISION_RE.is_match(revision) {
            return Err(VersionError::InvalidCharacter { version: version.to_string() });
        }
        if !upstream.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(VersionError::NoLeadingDigit { version: version.to_string() });
        }

        Ok(Self {
            raw: version.to_string(),
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Debian revision, empty for native packages
    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_versions(&self.raw, &other.raw)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}
