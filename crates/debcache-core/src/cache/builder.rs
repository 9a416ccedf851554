use std::collections::HashMap;
use std::time::Instant;

use debcache_version::{cmp_versions, Version as DebVersion};

use super::{
    DepId, DescFile, Dependency, FileId, IndexType, Package, PackageCache, PackageFile, PkgId, Provide, PrvId,
    VerFile, VerId, Version,
};
use crate::collector::ErrorCollector;
use crate::config::Config;
use crate::error::Result;
use crate::index::{IndexEntry, LoadedIndex, StatusEntry, TranslationEntry};

/// Builds a [`PackageCache`] from loaded indexes and installed state.
///
/// ```rust,no_run
/// use debcache_core::{CacheBuilder, Config, ErrorCollector, PackageFile};
/// use debcache_core::index::deb822;
/// use std::path::Path;
///
/// let config = Config::default();
/// let mut errors = ErrorCollector::new();
/// let index = deb822::load_packages(Path::new("Packages"), PackageFile::repository("stable"), &mut errors);
/// let (status_file, status) = deb822::load_status(Path::new("/var/lib/dpkg/status"), &mut errors);
/// let cache = CacheBuilder::new(&config)
///     .with_index(index)
///     .with_status(status_file, status)
///     .build(&mut errors)
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct CacheBuilder {
    architectures: Vec<String>,
    indexes: Vec<LoadedIndex>,
    status: Option<(PackageFile, Vec<StatusEntry>)>,
    translations: Vec<(PackageFile, Vec<TranslationEntry>)>,
}

impl CacheBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            architectures: config.architectures(),
            indexes: Vec::new(),
            status: None,
            translations: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: LoadedIndex) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_status(mut self, file: PackageFile, entries: Vec<StatusEntry>) -> Self {
        self.status = Some((file, entries));
        self
    }

    pub fn with_translation(mut self, file: PackageFile, entries: Vec<TranslationEntry>) -> Self {
        self.translations.push((file, entries));
        self
    }

    /// Build the graph.
    ///
    /// Recoverable problems (duplicate records, unparseable versions) are
    /// pushed as warnings; any error-severity entry pending in `errors`,
    /// including ones left by the loaders, fails the build.
    pub fn build(self, errors: &mut ErrorCollector) -> Result<PackageCache> {
        let start = Instant::now();
        let mut graph = Graph {
            cache: PackageCache {
                architectures: self.architectures,
                ..PackageCache::default()
            },
            seen: HashMap::new(),
            errors,
        };

        for index in self.indexes {
            let file = graph.add_file(index.file);
            for entry in &index.entries {
                graph.add_entry(file, entry);
            }
        }

        if let Some((file, entries)) = self.status {
            let file = graph.add_file(file);
            for status in &entries {
                graph.add_status(file, status);
            }
        }

        for (file, entries) in self.translations {
            let language = file.label.clone().unwrap_or_default();
            let file = graph.add_file(file);
            for entry in &entries {
                graph.add_translation(file, &language, entry);
            }
        }

        let errors = graph.errors;
        let mut cache = graph.cache;
        finish(&mut cache);

        log::info!(
            "Built cache with {} packages, {} versions and {} dependencies in {:.3} seconds",
            cache.packages.len(),
            cache.versions.len(),
            cache.dependencies.len(),
            start.elapsed().as_secs_f64()
        );

        errors.raise_pending()?;
        Ok(cache)
    }
}

struct Graph<'e> {
    cache: PackageCache,
    /// (package, version string, architecture as written)
    seen: HashMap<(PkgId, String, String), VerId>,
    errors: &'e mut ErrorCollector,
}

impl Graph<'_> {
    fn native(&self) -> &str {
        self.cache.native_arch()
    }

    /// Architecture a package is registered under
    fn arch_key(&self, arch: &str) -> String {
        if arch.is_empty() || arch == "all" {
            self.native().to_string()
        } else {
            arch.to_string()
        }
    }

    fn target_arch(&self, qualifier: Option<&str>, owner_arch: &str) -> String {
        match qualifier {
            None => owner_arch.to_string(),
            Some("any") | Some("native") => self.native().to_string(),
            Some(arch) => arch.to_string(),
        }
    }

    fn intern(&mut self, name: &str, arch: &str) -> PkgId {
        let key = (name.to_string(), arch.to_string());
        if let Some(&id) = self.cache.by_name.get(&key) {
            return id;
        }
        let id = PkgId::from_index(self.cache.packages.len());
        self.cache.packages.push(Package::new(id, name, arch));
        self.cache.by_name.insert(key, id);
        id
    }

    fn add_file(&mut self, mut file: PackageFile) -> FileId {
        let id = FileId::from_index(self.cache.files.len());
        file.id = id;
        self.cache.files.push(file);
        id
    }

    fn add_entry(&mut self, file: FileId, entry: &IndexEntry) -> Option<VerId> {
        if let Err(e) = DebVersion::parse(&entry.version) {
            self.errors.warning(format!("Skipping {} {}: {}", entry.package, entry.version, e));
            return None;
        }

        let arch = self.arch_key(&entry.architecture);
        let pkg = self.intern(&entry.package, &arch);
        let key = (pkg, entry.version.clone(), entry.architecture.clone());
        let is_status = self.cache.files[file.index()].index_type == IndexType::Status;

        if let Some(&ver) = self.seen.get(&key) {
            let version = &mut self.cache.versions[ver.index()];
            if version.files.iter().any(|f| f.file == file) {
                self.errors.warning(format!(
                    "Duplicate record for {}:{} {}, ignoring the later one",
                    entry.package, entry.architecture, entry.version
                ));
                return Some(ver);
            }
            version.files.push(VerFile { file, offset: entry.offset });
            if entry.has_description && version.description_in("").is_none() {
                version.descriptions.push(DescFile { file, offset: entry.offset, language: String::new() });
            }
            if entry.essential {
                self.cache.packages[pkg.index()].essential = true;
            }
            return Some(ver);
        }

        let ver = VerId::from_index(self.cache.versions.len());
        let mut version = Version {
            id: ver,
            parent: pkg,
            version: entry.version.clone(),
            arch: entry.architecture.clone(),
            size: entry.size,
            installed_size: entry.installed_size,
            section: entry.section.clone(),
            priority: entry.priority,
            source_name: entry.source.clone().unwrap_or_else(|| entry.package.clone()),
            source_version: entry.source_version.clone().unwrap_or_else(|| entry.version.clone()),
            description_md5: entry.description_md5.clone(),
            depends: Vec::new(),
            provides: Vec::new(),
            files: vec![VerFile { file, offset: entry.offset }],
            descriptions: Vec::new(),
            downloadable: !is_status,
        };
        if entry.has_description {
            version.descriptions.push(DescFile { file, offset: entry.offset, language: String::new() });
        }

        for (dep_type, groups) in &entry.relations {
            for group in groups {
                for (i, relation) in group.iter().enumerate() {
                    let target_arch = self.target_arch(relation.arch.as_deref(), &arch);
                    let target = self.intern(&relation.name, &target_arch);
                    let id = DepId::from_index(self.cache.dependencies.len());
                    self.cache.dependencies.push(Dependency {
                        id,
                        owner: ver,
                        target,
                        dep_type: *dep_type,
                        constraint: relation.constraint.clone(),
                        or_next: i + 1 < group.len(),
                    });
                    version.depends.push(id);
                    self.cache.packages[target.index()].rev_depends.push(id);
                }
            }
        }

        for relation in &entry.provides {
            let target_arch = self.target_arch(relation.arch.as_deref(), &arch);
            let target = self.intern(&relation.name, &target_arch);
            let id = PrvId::from_index(self.cache.provides.len());
            self.cache.provides.push(Provide {
                id,
                owner: ver,
                target,
                version: relation.constraint.as_ref().map(|c| c.version.clone()),
            });
            version.provides.push(id);
            self.cache.packages[target.index()].provided_by.push(id);
        }

        self.cache.versions.push(version);
        let package = &mut self.cache.packages[pkg.index()];
        package.versions.push(ver);
        package.essential |= entry.essential;
        self.seen.insert(key, ver);
        Some(ver)
    }

    fn add_status(&mut self, file: FileId, status: &StatusEntry) {
        let arch = self.arch_key(&status.entry.architecture);
        let pkg = self.intern(&status.entry.package, &arch);
        self.cache.packages[pkg.index()].selection = status.selection;

        if !status.installed {
            return;
        }

        if let Some(ver) = self.add_entry(file, &status.entry) {
            let previous = self.cache.packages[pkg.index()].current;
            if previous.map_or(false, |previous| previous != ver) {
                self.errors.warning(format!(
                    "{} has more than one installed version, using {}",
                    status.entry.package, status.entry.version
                ));
            }
            let package = &mut self.cache.packages[pkg.index()];
            package.current = Some(ver);
            package.auto_installed = status.auto_installed;
        }
    }

    fn add_translation(&mut self, file: FileId, language: &str, entry: &TranslationEntry) {
        let matching: Vec<PkgId> = self
            .cache
            .packages
            .iter()
            .filter(|p| p.name == entry.package)
            .map(|p| p.id)
            .collect();

        for pkg in matching {
            for &ver in &self.cache.packages[pkg.index()].versions {
                let version = &mut self.cache.versions[ver.index()];
                if version.description_md5.as_deref() == Some(entry.description_md5.as_str())
                    && version.description_in(language).is_none()
                {
                    version.descriptions.push(DescFile {
                        file,
                        offset: entry.offset,
                        language: language.to_string(),
                    });
                }
            }
        }
    }
}

/// Order versions newest first and settle downloadability.
fn finish(cache: &mut PackageCache) {
    let versions = &mut cache.versions;
    let files = &cache.files;

    for version in versions.iter_mut() {
        version.downloadable = version
            .files
            .iter()
            .any(|f| files[f.file.index()].index_type == IndexType::Packages);
    }

    for package in cache.packages.iter_mut() {
        package
            .versions
            .sort_by(|&a, &b| cmp_versions(&versions[b.index()].version, &versions[a.index()].version));
    }
}
