use std::str::FromStr;

use super::{DepId, PkgId, PrvId, VerId};

/// dpkg selection state ("want") of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unknown,
    Install,
    Hold,
    DeInstall,
    Purge,
}

impl FromStr for Selection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Selection::Unknown),
            "install" => Ok(Selection::Install),
            "hold" => Ok(Selection::Hold),
            "deinstall" => Ok(Selection::DeInstall),
            "purge" => Ok(Selection::Purge),
            _ => Err(()),
        }
    }
}

/// A package identified by name and architecture.
///
/// A package without versions is virtual: it only exists as the target of
/// dependencies or provides.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PkgId,
    pub name: String,
    pub arch: String,
    pub essential: bool,
    /// Installed version
    pub current: Option<VerId>,
    /// Newest first
    pub versions: Vec<VerId>,
    /// Provides that target this package
    pub provided_by: Vec<PrvId>,
    pub rev_depends: Vec<DepId>,
    pub selection: Selection,
    /// Auto-installed according to the installed-status source
    pub auto_installed: bool,
}

impl Package {
    pub(crate) fn new(id: PkgId, name: &str, arch: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            arch: arch.to_string(),
            essential: false,
            current: None,
            versions: Vec::new(),
            provided_by: Vec::new(),
            rev_depends: Vec::new(),
            selection: Selection::Unknown,
            auto_installed: false,
        }
    }

    pub fn fullname(&self) -> String {
        format!("{}:{}", self.name, self.arch)
    }

    pub fn is_virtual(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn is_installed(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_provides(&self) -> bool {
        !self.provided_by.is_empty()
    }
}
