//! The package graph
//!
//! [`PackageCache`] owns every package, version, dependency, provide and
//! package file in flat arenas. Handles are plain indices ([`PkgId`],
//! [`VerId`], ...) that stay valid for the lifetime of the cache; the graph is
//! never mutated after [`CacheBuilder::build`] returns, so it is shared as an
//! `Arc<PackageCache>`.

mod builder;
mod dependency;
mod package;
mod package_file;
mod version;

use std::collections::{HashMap, HashSet};
use std::fmt;

pub use builder::CacheBuilder;
pub use dependency::{DepType, Dependency, Provide};
pub use package::{Package, Selection};
pub use package_file::{IndexType, PackageFile};
pub use version::{DescFile, PriorityClass, VerFile, Version};

use crate::policy::Policy;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Package`]
    PkgId
);
arena_id!(
    /// Index of a [`Version`]
    VerId
);
arena_id!(
    /// Index of a [`Dependency`]
    DepId
);
arena_id!(
    /// Index of a [`Provide`]
    PrvId
);
arena_id!(
    /// Index of a [`PackageFile`]
    FileId
);

#[derive(Debug, Default)]
pub struct PackageCache {
    pub(crate) packages: Vec<Package>,
    pub(crate) versions: Vec<Version>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) provides: Vec<Provide>,
    pub(crate) files: Vec<PackageFile>,
    pub(crate) by_name: HashMap<(String, String), PkgId>,
    pub(crate) architectures: Vec<String>,
}

impl PackageCache {
    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn version(&self, id: VerId) -> &Version {
        &self.versions[id.index()]
    }

    pub fn dependency(&self, id: DepId) -> &Dependency {
        &self.dependencies[id.index()]
    }

    pub fn provide(&self, id: PrvId) -> &Provide {
        &self.provides[id.index()]
    }

    pub fn file(&self, id: FileId) -> &PackageFile {
        &self.files[id.index()]
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn native_arch(&self) -> &str {
        self.architectures.first().map(String::as_str).unwrap_or("amd64")
    }

    /// Look up a package by name.
    ///
    /// Without an architecture the configured architectures are searched in
    /// order (native first); `any` and `native` are accepted as qualifiers.
    /// Absence is not an error.
    pub fn find_package(&self, name: &str, arch: Option<&str>) -> Option<&Package> {
        let (name, qualifier) = match (arch, name.split_once(':')) {
            (Some(arch), _) => (name, Some(arch)),
            (None, Some((name, arch))) => (name, Some(arch)),
            (None, None) => (name, None),
        };

        match qualifier {
            Some("any") | Some("native") | None => self
                .architectures
                .iter()
                .find_map(|arch| self.by_name.get(&(name.to_string(), arch.clone())))
                .map(|&id| self.package(id)),
            Some(arch) => self
                .by_name
                .get(&(name.to_string(), arch.to_string()))
                .map(|&id| self.package(id)),
        }
    }

    /// Every package, virtual ones included. Calling it again restarts the sequence.
    pub fn all_packages(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn files(&self) -> std::slice::Iter<'_, PackageFile> {
        self.files.iter()
    }

    /// Versions of a package, newest first
    pub fn versions_of(&self, pkg: PkgId) -> impl Iterator<Item = &Version> + '_ {
        self.package(pkg).versions.iter().map(move |&v| self.version(v))
    }

    pub fn parent(&self, ver: VerId) -> &Package {
        self.package(self.version(ver).parent)
    }

    /// Name with architecture; the native architecture is omitted when `pretty`.
    pub fn fullname(&self, pkg: PkgId, pretty: bool) -> String {
        let pkg = self.package(pkg);
        if pretty && pkg.arch == self.native_arch() {
            pkg.name.clone()
        } else {
            pkg.fullname()
        }
    }

    /// Dependencies of a version split into or-groups, in declaration order.
    pub fn or_groups(&self, ver: VerId) -> Vec<&[DepId]> {
        let deps = &self.version(ver).depends;
        let mut groups = Vec::new();
        let mut start = 0;
        for (i, &dep) in deps.iter().enumerate() {
            if !self.dependency(dep).or_next {
                groups.push(&deps[start..=i]);
                start = i + 1;
            }
        }
        // a trailing member with the or flag still set closes the group
        if start < deps.len() {
            groups.push(&deps[start..]);
        }
        groups
    }

    /// Dependencies (of any version) that point at this package
    pub fn rev_depends(&self, pkg: PkgId) -> impl Iterator<Item = &Dependency> + '_ {
        self.package(pkg).rev_depends.iter().map(move |&d| self.dependency(d))
    }

    /// Provides that name this package as their target
    pub fn providers(&self, pkg: PkgId) -> impl Iterator<Item = &Provide> + '_ {
        self.package(pkg).provided_by.iter().map(move |&p| self.provide(p))
    }

    /// Packages providing `pkg`, deduplicated, in index order.
    ///
    /// With `candidates_only`, a provider is listed only when its candidate
    /// version is the one doing the providing.
    pub fn provides_of(&self, pkg: PkgId, candidates_only: bool, policy: &Policy) -> Vec<PkgId> {
        self.provides_of_with(pkg, candidates_only, |p| policy.candidate(self, p))
    }

    pub(crate) fn provides_of_with<F>(&self, pkg: PkgId, candidates_only: bool, candidate: F) -> Vec<PkgId>
    where
        F: Fn(PkgId) -> Option<VerId>,
    {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for provide in self.providers(pkg) {
            let parent = self.version(provide.owner).parent;
            if candidates_only && candidate(parent) != Some(provide.owner) {
                continue;
            }
            if seen.insert(parent) {
                result.push(parent);
            }
        }

        result
    }

    /// Human-readable form of one dependency, e.g. `libc6 (>= 2.34)`
    pub fn describe_dependency(&self, dep: DepId) -> String {
        let dep = self.dependency(dep);
        let target = self.fullname(dep.target, true);
        match &dep.constraint {
            Some(constraint) => format!("{} ({})", target, constraint),
            None => target,
        }
    }

    /// Human-readable form of an or-group, e.g. `mail-transport-agent | exim4`
    pub fn describe_group(&self, group: &[DepId]) -> String {
        group
            .iter()
            .map(|&d| self.describe_dependency(d))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
