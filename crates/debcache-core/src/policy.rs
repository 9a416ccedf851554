//! Candidate selection
//!
//! Every version gets a pin priority. Package-specific pins win; otherwise a
//! version inherits the highest priority of the package files it appears in,
//! which is where generic (`*`) pins, the default release, `NotAutomatic`
//! releases and the dpkg status file come in. The candidate is the version
//! with the highest priority, the newer one on ties, and never a downgrade
//! unless a pin of at least 1000 asks for it.

use std::cmp::Ordering;

use debcache_version::cmp_versions;
use glob::Pattern;

use crate::cache::{FileId, PackageCache, PackageFile, PkgId, VerId};
use crate::config::{Config, ReleaseSelector};

pub const PRIORITY_NOT_AUTOMATIC: i32 = 1;
pub const PRIORITY_STATUS: i32 = 100;
pub const PRIORITY_BUT_AUTOMATIC_UPGRADES: i32 = 100;
pub const PRIORITY_DEFAULT: i32 = 500;
pub const PRIORITY_DEFAULT_RELEASE: i32 = 990;
/// Candidates at or above this priority may downgrade the installed version
pub const PRIORITY_ALLOW_DOWNGRADE: i32 = 1000;

#[derive(Debug, Clone)]
struct CompiledPin {
    package: Pattern,
    version: Option<Pattern>,
    release: Option<ReleaseSelector>,
    priority: i32,
}

/// Policy for selecting the candidate version of each package.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Package-specific pins, in configuration order
    pins: Vec<CompiledPin>,
    /// Priority of each package file, by file id
    file_priorities: Vec<i32>,
}

impl Policy {
    /// Compile the pins from `config` and assign a priority to every package file.
    ///
    /// Pins with invalid glob patterns are skipped with a warning.
    pub fn new(cache: &PackageCache, config: &Config) -> Self {
        let mut pins = Vec::new();
        let mut generic = Vec::new();

        for pin in &config.pins {
            let package = match Pattern::new(&pin.package) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("Ignoring pin for '{}': {}", pin.package, e);
                    continue;
                }
            };
            let version = match pin.version.as_deref().map(Pattern::new).transpose() {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Ignoring pin for '{}': {}", pin.package, e);
                    continue;
                }
            };

            if pin.is_generic() && version.is_none() {
                match &pin.release {
                    Some(release) => generic.push((release.clone(), pin.priority)),
                    None => log::warn!("Ignoring generic pin without a release selector"),
                }
            } else {
                pins.push(CompiledPin {
                    package,
                    version,
                    release: pin.release.clone(),
                    priority: pin.priority,
                });
            }
        }

        let file_priorities = cache
            .files()
            .map(|file| default_file_priority(file, &generic, config.default_release.as_deref()))
            .collect();

        Self { pins, file_priorities }
    }

    pub fn file_priority(&self, file: FileId) -> i32 {
        self.file_priorities.get(file.index()).copied().unwrap_or(PRIORITY_DEFAULT)
    }

    fn pin_priority(&self, cache: &PackageCache, ver: VerId) -> Option<i32> {
        let version = cache.version(ver);
        let name = &cache.package(version.parent).name;

        self.pins
            .iter()
            .find(|pin| {
                pin.package.matches(name)
                    && pin.version.as_ref().map_or(true, |p| p.matches(&version.version))
                    && pin.release.as_ref().map_or(true, |release| {
                        version.files.iter().any(|f| release.matches(cache.file(f.file)))
                    })
            })
            .map(|pin| pin.priority)
    }

    /// Numeric priority of a version, as `apt policy` would show it.
    pub fn priority(&self, cache: &PackageCache, ver: VerId) -> i32 {
        if let Some(priority) = self.pin_priority(cache, ver) {
            return priority;
        }

        cache
            .version(ver)
            .files
            .iter()
            .map(|f| self.file_priority(f.file))
            .max()
            .unwrap_or(0)
    }

    /// Priority shown for a package as a whole: that of its candidate, or 0.
    pub fn package_priority(&self, cache: &PackageCache, pkg: PkgId) -> i32 {
        self.candidate(cache, pkg).map_or(0, |ver| self.priority(cache, ver))
    }

    /// The version that would be installed or upgraded to, absent other constraints.
    pub fn candidate(&self, cache: &PackageCache, pkg: PkgId) -> Option<VerId> {
        let package = cache.package(pkg);
        let mut best: Option<(VerId, i32)> = None;

        // versions are newest first, so a strict comparison keeps the newer on ties
        for &ver in &package.versions {
            let installed = package.current == Some(ver);
            if !cache.version(ver).downloadable() && !installed {
                continue;
            }
            let priority = self.priority(cache, ver);
            if priority < 0 {
                continue;
            }
            if best.map_or(true, |(_, p)| priority > p) {
                best = Some((ver, priority));
            }
        }

        let candidate = match (best, package.current) {
            (Some((ver, priority)), Some(current))
                if ver != current
                    && priority < PRIORITY_ALLOW_DOWNGRADE
                    && cmp_versions(&cache.version(ver).version, &cache.version(current).version) == Ordering::Less =>
            {
                Some(current)
            }
            (best, _) => best.map(|(ver, _)| ver),
        };

        log::trace!(
            "Candidate for {} is {}",
            package.fullname(),
            candidate.map_or("(none)", |v| cache.version(v).version.as_str())
        );
        candidate
    }

    /// Compare two versions by preference.
    ///
    /// Returns `Ordering::Less` when `a` is preferred over `b`.
    pub fn compare_by_priority(&self, cache: &PackageCache, a: VerId, b: VerId) -> Ordering {
        let pa = self.priority(cache, a);
        let pb = self.priority(cache, b);
        if pa != pb {
            // higher priority first
            return pb.cmp(&pa);
        }
        cmp_versions(&cache.version(b).version, &cache.version(a).version)
    }
}

fn default_file_priority(file: &PackageFile, generic: &[(ReleaseSelector, i32)], default_release: Option<&str>) -> i32 {
    if file.is_status() {
        return PRIORITY_STATUS;
    }

    if let Some((_, priority)) = generic.iter().find(|(release, _)| release.matches(file)) {
        return *priority;
    }

    let is_default_release = default_release.map_or(false, |release| {
        file.archive.as_deref() == Some(release) || file.codename.as_deref() == Some(release)
    });

    if is_default_release {
        PRIORITY_DEFAULT_RELEASE
    } else if file.not_automatic && file.but_automatic_upgrades {
        PRIORITY_BUT_AUTOMATIC_UPGRADES
    } else if file.not_automatic {
        PRIORITY_NOT_AUTOMATIC
    } else {
        PRIORITY_DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBuilder;
    use crate::collector::ErrorCollector;
    use crate::config::Pin;
    use crate::index::{IndexEntry, LoadedIndex, StatusEntry};

    fn entry(name: &str, version: &str) -> IndexEntry {
        IndexEntry::new(name, version, "amd64")
    }

    fn build(config: &Config, repos: Vec<(PackageFile, Vec<IndexEntry>)>, installed: Vec<IndexEntry>) -> PackageCache {
        let mut builder = CacheBuilder::new(config);
        for (file, entries) in repos {
            builder = builder.with_index(LoadedIndex::new(file, entries));
        }
        builder = builder.with_status(
            PackageFile::status(),
            installed.into_iter().map(StatusEntry::installed).collect(),
        );
        builder.build(&mut ErrorCollector::new()).unwrap()
    }

    fn version_of(cache: &PackageCache, ver: Option<VerId>) -> Option<&str> {
        ver.map(|v| cache.version(v).version.as_str())
    }

    #[test]
    fn test_highest_version_wins_on_equal_priority() {
        let config = Config::default();
        let cache = build(
            &config,
            vec![
                (PackageFile::repository("stable"), vec![entry("foo", "1.0")]),
                (PackageFile::repository("updates"), vec![entry("foo", "1.1")]),
            ],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.1"));
    }

    #[test]
    fn test_candidate_is_stable() {
        let config = Config::default();
        let cache = build(&config, vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0")])], vec![]);
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(policy.candidate(&cache, foo), policy.candidate(&cache, foo));
    }

    #[test]
    fn test_not_automatic_release_is_not_candidate() {
        let config = Config::default();
        let experimental = PackageFile { not_automatic: true, ..PackageFile::repository("experimental") };
        let cache = build(
            &config,
            vec![
                (PackageFile::repository("stable"), vec![entry("foo", "1.0")]),
                (experimental, vec![entry("foo", "2.0")]),
            ],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.0"));

        let two = cache.package(foo).versions[0];
        assert_eq!(policy.priority(&cache, two), PRIORITY_NOT_AUTOMATIC);
    }

    #[test]
    fn test_default_release_boost() {
        let config = Config { default_release: Some("stable".into()), ..Config::default() };
        let cache = build(
            &config,
            vec![
                (PackageFile::repository("stable"), vec![entry("foo", "1.0")]),
                (PackageFile::repository("testing"), vec![entry("foo", "2.0")]),
            ],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.0"));
        assert_eq!(policy.file_priority(FileId(0)), PRIORITY_DEFAULT_RELEASE);
        assert_eq!(policy.file_priority(FileId(1)), PRIORITY_DEFAULT);
    }

    #[test]
    fn test_installed_version_is_sticky_against_downgrade() {
        let config = Config::default();
        let cache = build(
            &config,
            vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0")])],
            vec![entry("foo", "1.5")],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.5"));
        assert_eq!(policy.priority(&cache, cache.package(foo).current.unwrap()), PRIORITY_STATUS);
    }

    #[test]
    fn test_installed_only_version_remains_eligible() {
        let config = Config::default();
        let cache = build(&config, vec![], vec![entry("local", "0.1")]);
        let policy = Policy::new(&cache, &config);
        let local = cache.find_package("local", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, local)), Some("0.1"));
    }

    #[test]
    fn test_pin_forces_downgrade() {
        let config = Config {
            pins: vec![Pin::new("foo", 1001).version("1.0*")],
            ..Config::default()
        };
        let cache = build(
            &config,
            vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0"), entry("foo", "2.0")])],
            vec![entry("foo", "2.0")],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.0"));
    }

    #[test]
    fn test_pin_below_downgrade_threshold_keeps_installed() {
        let config = Config {
            pins: vec![Pin::new("foo", 900).version("1.0")],
            ..Config::default()
        };
        let cache = build(
            &config,
            vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0"), entry("foo", "2.0")])],
            vec![entry("foo", "2.0")],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("2.0"));
    }

    #[test]
    fn test_negative_pin_excludes_version() {
        let config = Config {
            pins: vec![Pin::new("foo", -1).version("2.*")],
            ..Config::default()
        };
        let cache = build(
            &config,
            vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0"), entry("foo", "2.0")])],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("1.0"));
    }

    #[test]
    fn test_generic_release_pin() {
        let config = Config {
            pins: vec![Pin::new("*", 700).release(ReleaseSelector::archive("testing"))],
            ..Config::default()
        };
        let cache = build(
            &config,
            vec![
                (PackageFile::repository("stable"), vec![entry("foo", "3.0")]),
                (PackageFile::repository("testing"), vec![entry("foo", "2.0")]),
            ],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap().id;
        assert_eq!(policy.file_priority(FileId(1)), 700);
        assert_eq!(version_of(&cache, policy.candidate(&cache, foo)), Some("2.0"));
    }

    #[test]
    fn test_virtual_package_has_no_candidate() {
        let config = Config::default();
        let cache = build(
            &config,
            vec![(
                PackageFile::repository("stable"),
                vec![entry("impl", "1.0").with_provides("virt").unwrap()],
            )],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let virt = cache.find_package("virt", None).unwrap().id;
        assert_eq!(policy.candidate(&cache, virt), None);
    }

    #[test]
    fn test_compare_by_priority() {
        let config = Config::default();
        let cache = build(
            &config,
            vec![(PackageFile::repository("stable"), vec![entry("foo", "1.0"), entry("foo", "2.0")])],
            vec![],
        );
        let policy = Policy::new(&cache, &config);
        let foo = cache.find_package("foo", None).unwrap();
        let (newer, older) = (foo.versions[0], foo.versions[1]);
        assert_eq!(policy.compare_by_priority(&cache, newer, older), Ordering::Less); // prefer newer
        assert_eq!(policy.compare_by_priority(&cache, older, newer), Ordering::Greater);
    }
}
