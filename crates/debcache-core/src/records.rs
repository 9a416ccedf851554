//! Textual package records
//!
//! The graph keeps only `(file, offset)` locations for each version and
//! description. [`Records`] reads the stanza at such a location on demand
//! and remembers the last one, so asking for the short description, long
//! description and a hash of the same record parses it once.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::sync::Arc;

use crate::cache::{DescFile, FileId, PackageCache, PackageFile, VerFile};
use crate::error::{CacheError, Result};
use crate::index::deb822::is_description_key;
use crate::tagfile::{stanzas, TagSection};

/// Names of well-known record fields
pub struct RecordField;

impl RecordField {
    pub const PACKAGE: &'static str = "Package";
    pub const VERSION: &'static str = "Version";
    pub const ARCHITECTURE: &'static str = "Architecture";
    pub const SOURCE: &'static str = "Source";
    pub const MAINTAINER: &'static str = "Maintainer";
    pub const SECTION: &'static str = "Section";
    pub const PRIORITY: &'static str = "Priority";
    pub const ESSENTIAL: &'static str = "Essential";
    pub const INSTALLED_SIZE: &'static str = "Installed-Size";
    pub const SIZE: &'static str = "Size";
    pub const FILENAME: &'static str = "Filename";
    pub const HOMEPAGE: &'static str = "Homepage";
    pub const DESCRIPTION: &'static str = "Description";
    pub const DESCRIPTION_MD5: &'static str = "Description-md5";
    pub const MD5SUM: &'static str = "MD5sum";
    pub const SHA1: &'static str = "SHA1";
    pub const SHA256: &'static str = "SHA256";
    pub const SHA512: &'static str = "SHA512";
    pub const TAG: &'static str = "Tag";
    pub const MULTI_ARCH: &'static str = "Multi-Arch";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashType {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashType {
    /// Record field carrying this hash
    pub fn field(&self) -> &'static str {
        match self {
            HashType::Md5 => RecordField::MD5SUM,
            HashType::Sha1 => RecordField::SHA1,
            HashType::Sha256 => RecordField::SHA256,
            HashType::Sha512 => RecordField::SHA512,
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Where record text comes from
pub trait RecordSource {
    /// Text of the stanza starting at `offset` in `file`
    fn read(&self, file: &PackageFile, offset: u64) -> Result<String>;
}

/// Reads stanzas from the files the package files were loaded from
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRecordSource;

impl RecordSource for FileRecordSource {
    fn read(&self, file: &PackageFile, offset: u64) -> Result<String> {
        let path = file
            .filename
            .as_ref()
            .ok_or_else(|| CacheError::not_found(format!("File of package file {}", file.id)))?;

        let mut reader = BufReader::new(File::open(path)?);
        reader.seek(SeekFrom::Start(offset))?;

        let mut record = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
                break;
            }
            record.push_str(&line);
        }

        if record.is_empty() {
            return Err(CacheError::MalformedRecord {
                offset,
                reason: format!("no record in {}", path.display()),
            });
        }
        Ok(record)
    }
}

/// Records held in memory, keyed by file and offset
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: HashMap<(FileId, u64), String>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileId, offset: u64, text: impl Into<String>) {
        self.records.insert((file, offset), text.into());
    }

    /// Register every stanza of a deb822 document under its byte offset
    pub fn add_document(&mut self, file: FileId, text: &str) {
        for (offset, stanza) in stanzas(text) {
            self.insert(file, offset, stanza);
        }
    }
}

impl RecordSource for MemoryRecordSource {
    fn read(&self, file: &PackageFile, offset: u64) -> Result<String> {
        self.records
            .get(&(file.id, offset))
            .cloned()
            .ok_or_else(|| CacheError::not_found(format!("Record at offset {} of package file {}", offset, file.id)))
    }
}

/// Cursor over package records
pub struct Records<S: RecordSource = FileRecordSource> {
    cache: Arc<PackageCache>,
    source: S,
    current: Option<(FileId, u64)>,
    section: TagSection,
    parses: usize,
}

impl<S: RecordSource> Records<S> {
    pub fn new(cache: Arc<PackageCache>, source: S) -> Self {
        Self {
            cache,
            source,
            current: None,
            section: TagSection::default(),
            parses: 0,
        }
    }

    /// Move to the record at `offset` in `file`. Looking up the current
    /// record again does not reread it.
    pub fn lookup(&mut self, file: FileId, offset: u64) -> Result<()> {
        if self.current == Some((file, offset)) {
            return Ok(());
        }

        // a failed lookup leaves an empty cursor behind
        self.current = None;
        self.section = TagSection::default();

        let text = self.source.read(self.cache.file(file), offset)?;
        self.section = TagSection::parse_at(&text, offset)?;
        self.current = Some((file, offset));
        self.parses += 1;
        Ok(())
    }

    pub fn lookup_version(&mut self, location: &VerFile) -> Result<()> {
        self.lookup(location.file, location.offset)
    }

    pub fn lookup_description(&mut self, location: &DescFile) -> Result<()> {
        self.lookup(location.file, location.offset)
    }

    /// Number of records read and parsed so far
    pub fn parse_count(&self) -> usize {
        self.parses
    }

    pub fn section(&self) -> &TagSection {
        &self.section
    }

    fn description(&self) -> Result<&str> {
        let key = self
            .section
            .keys()
            .find(|key| is_description_key(key))
            .ok_or_else(|| CacheError::not_found("Description"))?;
        self.section.get(key).ok_or_else(|| CacheError::not_found("Description"))
    }

    /// First line of the description
    pub fn short_desc(&self) -> Result<String> {
        let description = self.description()?;
        Ok(description.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Whole description; lines consisting of `.` become empty lines
    pub fn long_desc(&self) -> Result<String> {
        let lines: Vec<&str> = self
            .description()?
            .lines()
            .map(|line| if line.trim() == "." { "" } else { line })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Hex digest published for the record
    pub fn hash(&self, hash_type: HashType) -> Result<String> {
        self.get_field(hash_type.field())
    }

    /// Raw value of a field
    pub fn get_field(&self, name: &str) -> Result<String> {
        self.section
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| CacheError::not_found(format!("Field {}", name)))
    }
}
