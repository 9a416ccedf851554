use std::fmt;
use std::str::FromStr;

use debcache_version::VersionConstraint;

use super::{DepId, PkgId, PrvId, VerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepType {
    Depends,
    PreDepends,
    Suggests,
    Recommends,
    Conflicts,
    Replaces,
    Obsoletes,
    Breaks,
    Enhances,
}

impl DepType {
    /// Control fields that carry relations, in the order they are read
    pub const FIELDS: [DepType; 9] = [
        DepType::PreDepends,
        DepType::Depends,
        DepType::Recommends,
        DepType::Suggests,
        DepType::Enhances,
        DepType::Conflicts,
        DepType::Breaks,
        DepType::Replaces,
        DepType::Obsoletes,
    ];

    /// Name of the control field
    pub fn field_name(&self) -> &'static str {
        match self {
            DepType::Depends => "Depends",
            DepType::PreDepends => "Pre-Depends",
            DepType::Suggests => "Suggests",
            DepType::Recommends => "Recommends",
            DepType::Conflicts => "Conflicts",
            DepType::Replaces => "Replaces",
            DepType::Obsoletes => "Obsoletes",
            DepType::Breaks => "Breaks",
            DepType::Enhances => "Enhances",
        }
    }

    /// Types that make a package broken when unsatisfied
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            DepType::Depends | DepType::PreDepends | DepType::Conflicts | DepType::Breaks | DepType::Obsoletes
        )
    }

    /// Types satisfied by the *absence* of a matching version
    pub fn is_negative(&self) -> bool {
        matches!(self, DepType::Conflicts | DepType::Breaks | DepType::Obsoletes)
    }
}

impl FromStr for DepType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DepType::FIELDS
            .iter()
            .copied()
            .find(|t| t.field_name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for DepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// An edge from a version to a target package.
///
/// `or_next` links this dependency to the following one in the same
/// disjunctive group; only the last member of a group has it cleared.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub id: DepId,
    pub owner: VerId,
    pub target: PkgId,
    pub dep_type: DepType,
    pub constraint: Option<VersionConstraint>,
    pub or_next: bool,
}

impl Dependency {
    pub fn is_critical(&self) -> bool {
        self.dep_type.is_critical()
    }

    pub fn is_negative(&self) -> bool {
        self.dep_type.is_negative()
    }

    /// Whether a version string of the target satisfies the constraint
    pub fn accepts(&self, version: &str) -> bool {
        self.constraint.as_ref().map_or(true, |c| c.satisfied_by(version))
    }

    /// Whether a provide satisfies the constraint. Unversioned provides
    /// never satisfy a versioned dependency.
    pub fn accepts_provide(&self, provide: &Provide) -> bool {
        match (&self.constraint, &provide.version) {
            (None, _) => true,
            (Some(constraint), Some(version)) => constraint.satisfied_by(version),
            (Some(_), None) => false,
        }
    }
}

/// Installing `owner` satisfies dependencies on `target`
#[derive(Debug, Clone)]
pub struct Provide {
    pub id: PrvId,
    pub owner: VerId,
    pub target: PkgId,
    pub version: Option<String>,
}
