use std::ops::{AddAssign, SubAssign};

use crate::cache::VerId;

/// What a package is marked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Keep,
    Delete,
    Install,
}

/// The effective change for a package, derived from its mode and versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkedAction {
    Keep,
    Install,
    Upgrade,
    Downgrade,
    ReInstall,
    Delete,
    Purge,
}

impl MarkedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkedAction::Keep => "keep",
            MarkedAction::Install => "install",
            MarkedAction::Upgrade => "upgrade",
            MarkedAction::Downgrade => "downgrade",
            MarkedAction::ReInstall => "reinstall",
            MarkedAction::Delete => "remove",
            MarkedAction::Purge => "purge",
        }
    }

    pub fn is_change(&self) -> bool {
        *self != MarkedAction::Keep
    }
}

/// Desired state of one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCache {
    pub candidate: Option<VerId>,
    /// Version the plan ends up with; `None` when deleting or never installed
    pub install_ver: Option<VerId>,
    pub mode: Mode,
    pub purge: bool,
    pub reinstall: bool,
    pub auto: bool,
    /// An upgrade was asked for or considered and then reverted
    pub held_back: bool,
    pub garbage: bool,
    /// Set by the resolver; automatic marks may not touch the package
    pub protected: bool,
    pub now_broken: bool,
    pub inst_broken: bool,
}

impl StateCache {
    pub fn is_install(&self) -> bool {
        self.mode == Mode::Install
    }

    pub fn is_delete(&self) -> bool {
        self.mode == Mode::Delete
    }

    pub fn is_keep(&self) -> bool {
        self.mode == Mode::Keep
    }
}

/// Plan-wide counters, kept up to date incrementally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub install: usize,
    pub delete: usize,
    /// Installed packages kept back from an upgrade that was marked or considered
    pub keep: usize,
    pub broken: usize,
    pub download: u64,
    pub disk: i64,
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.install += rhs.install;
        self.delete += rhs.delete;
        self.keep += rhs.keep;
        self.broken += rhs.broken;
        self.download += rhs.download;
        self.disk += rhs.disk;
    }
}

impl SubAssign for Totals {
    fn sub_assign(&mut self, rhs: Self) {
        self.install -= rhs.install;
        self.delete -= rhs.delete;
        self.keep -= rhs.keep;
        self.broken -= rhs.broken;
        self.download -= rhs.download;
        self.disk -= rhs.disk;
    }
}

/// Saved marks, used to try a change and roll it back
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) states: Vec<StateCache>,
    pub(crate) contributions: Vec<Totals>,
    pub(crate) totals: Totals,
}
