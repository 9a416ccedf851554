use std::fmt;
use std::path::PathBuf;

use super::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    #[default]
    Packages,
    Status,
    Translation,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexType::Packages => "Debian Package Index",
            IndexType::Status => "Debian dpkg status file",
            IndexType::Translation => "Debian Translation Index",
        })
    }
}

/// One repository index or the dpkg status file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFile {
    pub id: FileId,
    pub filename: Option<PathBuf>,
    pub archive: Option<String>,
    pub origin: Option<String>,
    pub codename: Option<String>,
    pub label: Option<String>,
    pub site: Option<String>,
    pub component: Option<String>,
    pub architecture: Option<String>,
    pub index_type: IndexType,
    pub trusted: bool,
    pub not_automatic: bool,
    pub but_automatic_upgrades: bool,
}

impl PackageFile {
    /// A repository index for the given archive (suite)
    pub fn repository(archive: impl Into<String>) -> Self {
        Self {
            archive: Some(archive.into()),
            trusted: true,
            ..Self::default()
        }
    }

    pub fn status() -> Self {
        Self {
            archive: Some("now".to_string()),
            index_type: IndexType::Status,
            trusted: true,
            ..Self::default()
        }
    }

    pub fn translation(language: &str) -> Self {
        Self {
            index_type: IndexType::Translation,
            label: Some(language.to_string()),
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_status(&self) -> bool {
        self.index_type == IndexType::Status
    }
}
