//! Loaders for Debian `Packages`, dpkg `status`, apt `extended_states` and
//! `Translation-*` files.
//!
//! Loaders never fail outright: an unreadable file is reported as a warning
//! (the source may be optional) and a malformed stanza as an error, both into
//! the caller's [`ErrorCollector`], and loading continues with what is left.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::cache::{DepType, PackageFile, PriorityClass, Selection};
use crate::collector::ErrorCollector;
use crate::error::{CacheError, Result};
use crate::tagfile::{stanzas, TagSection};

use super::{parse_relations, IndexEntry, LoadedIndex, StatusEntry, TranslationEntry};

fn read(path: &Path, errors: &mut ErrorCollector) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            errors.warning(format!("Unable to read {}: {}", path.display(), e));
            None
        }
    }
}

/// Read a `Packages` file. The file's filename is set to `path`.
pub fn load_packages(path: &Path, file: PackageFile, errors: &mut ErrorCollector) -> LoadedIndex {
    let file = file.with_filename(path);
    match read(path, errors) {
        Some(text) => parse_packages(&text, file, errors),
        None => LoadedIndex::new(file, Vec::new()),
    }
}

pub fn parse_packages(text: &str, file: PackageFile, errors: &mut ErrorCollector) -> LoadedIndex {
    let mut entries = Vec::new();
    for (offset, stanza) in stanzas(text) {
        match TagSection::parse_at(stanza, offset).and_then(|s| entry_from_section(&s, offset)) {
            Ok(entry) => entries.push(entry),
            Err(e) => errors.error(format!("{}: {}", describe(&file), e)),
        }
    }
    log::debug!("Read {} records from {}", entries.len(), describe(&file));
    LoadedIndex::new(file, entries)
}

/// Read the dpkg status file
pub fn load_status(path: &Path, errors: &mut ErrorCollector) -> (PackageFile, Vec<StatusEntry>) {
    let file = PackageFile::status().with_filename(path);
    let entries = match read(path, errors) {
        Some(text) => parse_status(&text, errors),
        None => Vec::new(),
    };
    (file, entries)
}

pub fn parse_status(text: &str, errors: &mut ErrorCollector) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    for (offset, stanza) in stanzas(text) {
        let parsed = TagSection::parse_at(stanza, offset).and_then(|section| {
            let entry = entry_from_section(&section, offset)?;
            let status = section.get("Status").unwrap_or("install ok installed");
            let words: Vec<&str> = status.split_whitespace().collect();
            if words.len() != 3 {
                return Err(CacheError::MalformedRecord {
                    offset,
                    reason: format!("invalid Status field '{}'", status),
                });
            }
            Ok(StatusEntry {
                entry,
                selection: words[0].parse().unwrap_or_default(),
                // dpkg keeps a current version in every other state
                installed: !matches!(words[2], "not-installed" | "config-files"),
                auto_installed: false,
            })
        });
        match parsed {
            Ok(entry) => entries.push(entry),
            Err(e) => errors.error(format!("dpkg status: {}", e)),
        }
    }
    entries
}

/// Apply an apt `extended_states` file to status entries.
pub fn load_extended_states(path: &Path, status: &mut [StatusEntry], errors: &mut ErrorCollector) {
    if let Some(text) = read(path, errors) {
        apply_extended_states(&text, status, errors);
    }
}

pub fn apply_extended_states(text: &str, status: &mut [StatusEntry], errors: &mut ErrorCollector) {
    let mut auto: HashSet<(String, Option<String>)> = HashSet::new();
    for (offset, stanza) in stanzas(text) {
        match TagSection::parse_at(stanza, offset) {
            Ok(section) => {
                let (Some(name), Some("1")) = (section.get("Package"), section.get("Auto-Installed")) else {
                    continue;
                };
                auto.insert((name.to_string(), section.get("Architecture").map(str::to_string)));
            }
            Err(e) => errors.error(format!("extended_states: {}", e)),
        }
    }

    for entry in status.iter_mut() {
        let name = entry.entry.package.clone();
        let arch = Some(entry.entry.architecture.clone());
        if auto.contains(&(name.clone(), arch)) || auto.contains(&(name, None)) {
            entry.auto_installed = true;
        }
    }
}

/// Read a `Translation-<language>` file
pub fn load_translation(
    path: &Path,
    language: &str,
    errors: &mut ErrorCollector,
) -> (PackageFile, Vec<TranslationEntry>) {
    let file = PackageFile::translation(language).with_filename(path);
    let entries = match read(path, errors) {
        Some(text) => parse_translation(&text, errors),
        None => Vec::new(),
    };
    (file, entries)
}

pub fn parse_translation(text: &str, errors: &mut ErrorCollector) -> Vec<TranslationEntry> {
    let mut entries = Vec::new();
    for (offset, stanza) in stanzas(text) {
        match TagSection::parse_at(stanza, offset) {
            Ok(section) => match (section.get("Package"), section.get("Description-md5")) {
                (Some(package), Some(md5)) => entries.push(TranslationEntry {
                    package: package.to_string(),
                    description_md5: md5.to_string(),
                    offset,
                }),
                _ => errors.warning(format!("Translation record at offset {} lacks Package or Description-md5", offset)),
            },
            Err(e) => errors.error(format!("translation: {}", e)),
        }
    }
    entries
}

fn entry_from_section(section: &TagSection, offset: u64) -> Result<IndexEntry> {
    let required = |key: &str| {
        section.get(key).ok_or_else(|| CacheError::MalformedRecord {
            offset,
            reason: format!("missing {} field", key),
        })
    };

    let mut entry = IndexEntry::new(
        required("Package")?,
        required("Version")?,
        section.get("Architecture").unwrap_or("all"),
    );
    entry.offset = offset;
    entry.essential = section.get("Essential") == Some("yes");
    entry.priority = section
        .get("Priority")
        .and_then(PriorityClass::parse)
        .unwrap_or_default();
    entry.section = section.get("Section").map(str::to_string);
    entry.size = parse_number(section.get("Size"));
    // Installed-Size is in KiB
    entry.installed_size = parse_number(section.get("Installed-Size")).saturating_mul(1024);
    entry.has_description = section.keys().any(|k| is_description_key(k));
    entry.description_md5 = section.get("Description-md5").map(str::to_string);

    if let Some(source) = section.get("Source") {
        match source.split_once('(') {
            Some((name, version)) => {
                entry.source = Some(name.trim().to_string());
                entry.source_version = Some(version.trim_end_matches(')').trim().to_string());
            }
            None => entry.source = Some(source.trim().to_string()),
        }
    }

    for dep_type in DepType::FIELDS {
        if let Some(field) = section.get(dep_type.field_name()) {
            let groups = parse_relations(field)?;
            if !groups.is_empty() {
                entry.relations.push((dep_type, groups));
            }
        }
    }

    if let Some(field) = section.get("Provides") {
        entry.provides = parse_relations(field)?.into_iter().flatten().collect();
    }

    Ok(entry)
}

pub(crate) fn is_description_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "description" || (key.starts_with("description-") && key != "description-md5")
}

fn parse_number(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

fn describe(file: &PackageFile) -> String {
    match (&file.filename, &file.archive) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(archive)) => archive.clone(),
        (None, None) => file.index_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGES: &str = "\
Package: foo
Version: 1.2-1
Architecture: amd64
Priority: optional
Section: utils
Installed-Size: 120
Size: 40960
Source: foo-src (1.2-0.1)
Depends: libfoo1 (>= 1.0), mail-transport-agent | exim4
Conflicts: oldfoo
Provides: foo-tool (= 1.2)
Description: the foo tool
 Longer text.

Package: libfoo1
Version: 1.2-1
Architecture: amd64
Essential: yes
Description-md5: 0123456789abcdef

";

    #[test]
    fn test_parse_packages() {
        let mut errors = ErrorCollector::new();
        let index = parse_packages(PACKAGES, PackageFile::repository("stable"), &mut errors);
        assert!(errors.is_empty());
        assert_eq!(index.entries.len(), 2);

        let foo = &index.entries[0];
        assert_eq!(foo.package, "foo");
        assert_eq!(foo.offset, 0);
        assert_eq!(foo.installed_size, 120 * 1024);
        assert_eq!(foo.size, 40960);
        assert_eq!(foo.source.as_deref(), Some("foo-src"));
        assert_eq!(foo.source_version.as_deref(), Some("1.2-0.1"));
        assert_eq!(foo.relations.len(), 2);
        assert_eq!(foo.relations[0].0, DepType::Depends);
        assert_eq!(foo.relations[0].1[1].len(), 2);
        assert_eq!(foo.relations[1].0, DepType::Conflicts);
        assert_eq!(foo.provides[0].name, "foo-tool");
        assert!(foo.has_description);

        let lib = &index.entries[1];
        assert!(lib.essential);
        assert!(lib.offset > 0);
        assert!(!lib.has_description);
        assert_eq!(lib.description_md5.as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn test_malformed_stanza_is_collected() {
        let mut errors = ErrorCollector::new();
        let index = parse_packages(
            "Package: nover\n\nPackage: ok\nVersion: 1\n",
            PackageFile::repository("stable"),
            &mut errors,
        );
        assert_eq!(index.entries.len(), 1);
        assert!(errors.has_errors());
    }

    #[test]
    fn test_parse_status() {
        let mut errors = ErrorCollector::new();
        let status = parse_status(
            "Package: a\nStatus: install ok installed\nVersion: 1\nArchitecture: amd64\n\n\
             Package: b\nStatus: hold ok installed\nVersion: 2\nArchitecture: amd64\n\n\
             Package: c\nStatus: deinstall ok config-files\nVersion: 3\nArchitecture: amd64\n",
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(status.len(), 3);
        assert!(status[0].installed);
        assert_eq!(status[1].selection, Selection::Hold);
        assert!(!status[2].installed);
        assert_eq!(status[2].selection, Selection::DeInstall);
    }

    #[test]
    fn test_unfinished_states_count_as_installed() {
        let mut errors = ErrorCollector::new();
        let stanza = |name: &str, state: &str| {
            format!("Package: {}\nStatus: install ok {}\nVersion: 1\nArchitecture: amd64\n", name, state)
        };
        let states = [
            ("half-installed", true),
            ("unpacked", true),
            ("half-configured", true),
            ("triggers-awaited", true),
            ("triggers-pending", true),
            ("installed", true),
            ("config-files", false),
            ("not-installed", false),
        ];
        let text: Vec<String> = states.iter().map(|(state, _)| stanza(state, state)).collect();

        let status = parse_status(&text.join("\n"), &mut errors);
        assert!(errors.is_empty());
        assert_eq!(status.len(), states.len());
        for (entry, (state, installed)) in status.iter().zip(states) {
            assert_eq!(entry.installed, installed, "{}", state);
        }
    }

    #[test]
    fn test_oversized_installed_size_saturates() {
        let mut errors = ErrorCollector::new();
        let index = parse_packages(
            &format!("Package: huge\nVersion: 1\nInstalled-Size: {}\n", u64::MAX / 2),
            PackageFile::repository("stable"),
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(index.entries[0].installed_size, u64::MAX);
    }

    #[test]
    fn test_extended_states() {
        let mut errors = ErrorCollector::new();
        let mut status = parse_status(
            "Package: a\nStatus: install ok installed\nVersion: 1\nArchitecture: amd64\n\n\
             Package: b\nStatus: install ok installed\nVersion: 1\nArchitecture: amd64\n",
            &mut errors,
        );
        apply_extended_states(
            "Package: b\nArchitecture: amd64\nAuto-Installed: 1\n\nPackage: a\nAuto-Installed: 0\n",
            &mut status,
            &mut errors,
        );
        assert!(!status[0].auto_installed);
        assert!(status[1].auto_installed);
    }

    #[test]
    fn test_missing_file_is_a_warning() {
        let mut errors = ErrorCollector::new();
        let index = load_packages(
            Path::new("/nonexistent/Packages"),
            PackageFile::repository("stable"),
            &mut errors,
        );
        assert!(index.entries.is_empty());
        assert!(!errors.has_errors());
        assert_eq!(errors.warnings().count(), 1);
    }

    #[test]
    fn test_parse_translation() {
        let mut errors = ErrorCollector::new();
        let entries = parse_translation(
            "Package: foo\nDescription-md5: abc\nDescription-de: Werkzeug\n\nPackage: bar\n",
            &mut errors,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description_md5, "abc");
        assert_eq!(errors.warnings().count(), 1);
    }

    #[test]
    fn test_description_keys() {
        assert!(is_description_key("Description"));
        assert!(is_description_key("Description-de"));
        assert!(!is_description_key("Description-md5"));
    }
}
