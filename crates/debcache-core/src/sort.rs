//! Filtering and ordering package listings

use crate::cache::PkgId;
use crate::depcache::DepCache;

/// Tri-state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Any,
    Only,
    Exclude,
}

impl Filter {
    fn accepts(&self, value: bool) -> bool {
        match self {
            Filter::Any => true,
            Filter::Only => value,
            Filter::Exclude => !value,
        }
    }
}

impl From<bool> for Filter {
    fn from(only: bool) -> Self {
        if only {
            Filter::Only
        } else {
            Filter::Exclude
        }
    }
}

/// Selects packages from a [`DepCache`].
///
/// ```rust,ignore
/// let upgradable = depcache.packages(&PackageSort::default().upgradable(true).names());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSort {
    pub upgradable: Filter,
    pub virtual_pkgs: Filter,
    pub installed: Filter,
    pub auto_installed: Filter,
    pub auto_removable: Filter,
    pub sort_by_name: bool,
}

impl Default for PackageSort {
    fn default() -> Self {
        Self {
            upgradable: Filter::Any,
            virtual_pkgs: Filter::Exclude,
            installed: Filter::Any,
            auto_installed: Filter::Any,
            auto_removable: Filter::Any,
            sort_by_name: false,
        }
    }
}

impl PackageSort {
    pub fn upgradable(mut self, filter: impl Into<Filter>) -> Self {
        self.upgradable = filter.into();
        self
    }

    pub fn virtual_pkgs(mut self, filter: impl Into<Filter>) -> Self {
        self.virtual_pkgs = filter.into();
        self
    }

    pub fn installed(mut self, filter: impl Into<Filter>) -> Self {
        self.installed = filter.into();
        self
    }

    pub fn auto_installed(mut self, filter: impl Into<Filter>) -> Self {
        self.auto_installed = filter.into();
        self
    }

    pub fn auto_removable(mut self, filter: impl Into<Filter>) -> Self {
        self.auto_removable = filter.into();
        self
    }

    /// Order by name, then architecture, instead of by id
    pub fn names(mut self) -> Self {
        self.sort_by_name = true;
        self
    }

    fn matches(&self, depcache: &DepCache, pkg: PkgId) -> bool {
        let package = depcache.cache().package(pkg);
        self.virtual_pkgs.accepts(package.is_virtual())
            && self.installed.accepts(package.is_installed())
            && self.upgradable.accepts(depcache.is_upgradable(pkg))
            && self.auto_installed.accepts(package.is_installed() && depcache.is_auto_installed(pkg))
            && self.auto_removable.accepts(depcache.is_auto_removable(pkg))
    }
}

impl DepCache {
    pub fn packages(&self, sort: &PackageSort) -> Vec<PkgId> {
        let cache = self.cache();
        let mut found: Vec<PkgId> = cache
            .all_packages()
            .map(|p| p.id)
            .filter(|&pkg| sort.matches(self, pkg))
            .collect();

        if sort.sort_by_name {
            found.sort_by(|&a, &b| {
                let (a, b) = (cache.package(a), cache.package(b));
                a.name.cmp(&b.name).then_with(|| a.arch.cmp(&b.arch))
            });
        }
        found
    }
}
