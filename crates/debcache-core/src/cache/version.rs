use std::fmt;

use super::{DepId, FileId, PkgId, PrvId, VerId};

/// The `Priority` field of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriorityClass {
    Required,
    Important,
    Standard,
    #[default]
    Optional,
    Extra,
}

impl PriorityClass {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "required" => Some(PriorityClass::Required),
            "important" => Some(PriorityClass::Important),
            "standard" => Some(PriorityClass::Standard),
            "optional" => Some(PriorityClass::Optional),
            "extra" => Some(PriorityClass::Extra),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Required => "required",
            PriorityClass::Important => "important",
            PriorityClass::Standard => "standard",
            PriorityClass::Optional => "optional",
            PriorityClass::Extra => "extra",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a version's control record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerFile {
    pub file: FileId,
    pub offset: u64,
}

/// Where a description of a version lives; `language` is empty for the
/// untranslated description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescFile {
    pub file: FileId,
    pub offset: u64,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct Version {
    pub id: VerId,
    pub parent: PkgId,
    pub version: String,
    pub arch: String,
    /// Download size in bytes
    pub size: u64,
    /// Unpacked size in bytes
    pub installed_size: u64,
    pub section: Option<String>,
    pub priority: PriorityClass,
    pub source_name: String,
    pub source_version: String,
    pub description_md5: Option<String>,
    /// Declaration order, or-groups contiguous
    pub depends: Vec<DepId>,
    pub provides: Vec<PrvId>,
    pub files: Vec<VerFile>,
    pub descriptions: Vec<DescFile>,
    pub(crate) downloadable: bool,
}

impl Version {
    /// Whether any repository (as opposed to the status file) offers this version
    pub fn downloadable(&self) -> bool {
        self.downloadable
    }

    pub fn description_in(&self, language: &str) -> Option<&DescFile> {
        self.descriptions.iter().find(|d| d.language == language)
    }
}
