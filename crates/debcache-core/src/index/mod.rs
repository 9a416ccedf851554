//! Index data handed to the [`CacheBuilder`](crate::CacheBuilder)
//!
//! The builder never reads files itself. It consumes [`IndexEntry`] tuples
//! grouped per [`PackageFile`], installed state as [`StatusEntry`] values and
//! optional [`TranslationEntry`] values. The [`deb822`] module produces all
//! three from Debian `Packages`, dpkg `status`, apt `extended_states` and
//! `Translation-*` files.

pub mod deb822;
pub mod relation;

use crate::cache::{DepType, PackageFile, PriorityClass, Selection};
use crate::error::Result;

pub use relation::{parse_relation, parse_relations, Relation};

/// One version record from a repository index or the status file
#[derive(Debug, Clone, Default)]
pub struct IndexEntry {
    pub package: String,
    pub version: String,
    pub architecture: String,
    pub essential: bool,
    pub priority: PriorityClass,
    pub section: Option<String>,
    pub size: u64,
    pub installed_size: u64,
    pub source: Option<String>,
    pub source_version: Option<String>,
    pub relations: Vec<(DepType, Vec<Vec<Relation>>)>,
    pub provides: Vec<Relation>,
    /// Byte offset of the record in its file
    pub offset: u64,
    pub has_description: bool,
    pub description_md5: Option<String>,
}

impl IndexEntry {
    pub fn new(package: &str, version: &str, architecture: &str) -> Self {
        Self {
            package: package.to_string(),
            version: version.to_string(),
            architecture: architecture.to_string(),
            ..Self::default()
        }
    }

    /// Add a relation field, e.g. `with_relations(DepType::Depends, "a (>= 1) | b")`
    pub fn with_relations(mut self, dep_type: DepType, field: &str) -> Result<Self> {
        let groups = parse_relations(field)?;
        if !groups.is_empty() {
            self.relations.push((dep_type, groups));
        }
        Ok(self)
    }

    pub fn with_provides(mut self, field: &str) -> Result<Self> {
        for group in parse_relations(field)? {
            self.provides.extend(group);
        }
        Ok(self)
    }

    pub fn essential(mut self, essential: bool) -> Self {
        self.essential = essential;
        self
    }

    pub fn sizes(mut self, size: u64, installed_size: u64) -> Self {
        self.size = size;
        self.installed_size = installed_size;
        self
    }

    pub fn priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }

    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self.has_description = true;
        self
    }
}

/// Installed state of one package from the dpkg status file
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub entry: IndexEntry,
    pub selection: Selection,
    /// False for packages that are only known (e.g. `config-files`)
    pub installed: bool,
    pub auto_installed: bool,
}

impl StatusEntry {
    pub fn installed(entry: IndexEntry) -> Self {
        Self {
            entry,
            selection: Selection::Install,
            installed: true,
            auto_installed: false,
        }
    }

    pub fn auto(mut self, auto_installed: bool) -> Self {
        self.auto_installed = auto_installed;
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }
}

/// A translated description record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub package: String,
    pub description_md5: String,
    pub offset: u64,
}

/// All entries read from one package file
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub file: PackageFile,
    pub entries: Vec<IndexEntry>,
}

impl LoadedIndex {
    pub fn new(file: PackageFile, entries: Vec<IndexEntry>) -> Self {
        Self { file, entries }
    }
}
