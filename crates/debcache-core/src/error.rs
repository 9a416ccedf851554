use thiserror::Error;

use crate::resolver::ProblemSet;

#[derive(Error, Debug)]
pub enum CacheError {
    // Lookup errors
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    // Resolver errors
    #[error("Unable to correct problems:\n{0}")]
    Unsatisfiable(ProblemSet),

    // Errors collected from lower layers
    #[error("{}", messages.join("\n"))]
    Backend { messages: Vec<String> },

    // Index parsing errors
    #[error("Invalid relation '{relation}': {reason}")]
    InvalidRelation { relation: String, reason: String },

    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] debcache_version::VersionError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CacheError::NotFound { what: what.into() }
    }

    /// Whether this error only signals an absent value
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. } | CacheError::PackageNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
