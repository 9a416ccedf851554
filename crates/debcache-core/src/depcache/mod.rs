//! Desired-state overlay on top of the package graph
//!
//! A [`DepCache`] holds one [`StateCache`] per package describing what the
//! pending plan does with it, plus counters that are updated incrementally as
//! marks change. Dependencies are evaluated in three views:
//!
//! - *now*: installed versions,
//! - *install*: versions the plan leaves installed,
//! - *candidate*: candidate versions.
//!
//! Every mark re-evaluates the package and its reverse dependencies, then
//! recomputes garbage. Inside an [`ActionGroup`] only the marked package is
//! refreshed and the full pass runs once, when the outermost group ends.

mod action_group;
mod marks;
mod state;
mod upgrade;


use std::cmp::Ordering;
use std::sync::Arc;

use debcache_version::cmp_versions;

use crate::cache::{DepId, DepType, Dependency, PackageCache, PkgId, Selection, VerId};
use crate::config::Config;
use crate::policy::Policy;
use crate::util::DiskSpace;

pub use action_group::ActionGroup;
pub use state::{MarkedAction, Mode, Snapshot, StateCache, Totals};
pub use upgrade::Upgrade;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Now,
    Install,
    Candidate,
}

#[derive(Debug)]
pub struct DepCache {
    cache: Arc<PackageCache>,
    policy: Policy,
    states: Vec<StateCache>,
    /// What each package currently adds to `totals`
    contributions: Vec<Totals>,
    totals: Totals,
    group_level: u32,
    full_updates: usize,
    install_recommends: bool,
    ignore_hold: bool,
    max_depth: u32,
    pub(crate) resolver_passes: u32,
}

impl DepCache {
    pub fn new(cache: Arc<PackageCache>, policy: Policy, config: &Config) -> Self {
        let states = cache
            .all_packages()
            .map(|package| StateCache {
                candidate: policy.candidate(&cache, package.id),
                install_ver: package.current,
                auto: package.auto_installed,
                ..StateCache::default()
            })
            .collect();

        let mut depcache = Self {
            contributions: vec![Totals::default(); cache.package_count()],
            cache,
            policy,
            states,
            totals: Totals::default(),
            group_level: 0,
            full_updates: 0,
            install_recommends: config.install_recommends,
            ignore_hold: config.ignore_hold,
            max_depth: config.max_auto_install_depth,
            resolver_passes: config.resolver_max_passes,
        };
        depcache.update();
        depcache
    }

    pub fn cache(&self) -> &Arc<PackageCache> {
        &self.cache
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn state(&self, pkg: PkgId) -> &StateCache {
        &self.states[pkg.index()]
    }

    pub fn candidate(&self, pkg: PkgId) -> Option<VerId> {
        self.states[pkg.index()].candidate
    }

    /// Version installed once the plan is applied
    pub fn install_version(&self, pkg: PkgId) -> Option<VerId> {
        self.view_version(pkg, View::Install)
    }

    /// Number of full recomputations run so far
    pub fn update_count(&self) -> usize {
        self.full_updates
    }

    /// Begin a batch of marks; see [`ActionGroup`].
    pub fn action_group(&mut self) -> ActionGroup<'_> {
        ActionGroup::new(self)
    }

    // --- queries ---

    pub fn is_upgradable(&self, pkg: PkgId) -> bool {
        let current = self.cache.package(pkg).current;
        match (current, self.candidate(pkg)) {
            (Some(current), Some(candidate)) => self.compare(candidate, current) == Ordering::Greater,
            _ => false,
        }
    }

    pub fn is_auto_installed(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].auto
    }

    pub fn is_garbage(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].garbage
    }

    pub fn is_auto_removable(&self, pkg: PkgId) -> bool {
        (self.cache.package(pkg).is_installed() || self.marked_install(pkg)) && self.is_garbage(pkg)
    }

    pub fn is_protected(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].protected
    }

    pub fn is_now_broken(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].now_broken
    }

    pub fn is_inst_broken(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].inst_broken
    }

    /// Marked for installation and not installed yet
    pub fn marked_install(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].is_install() && self.cache.package(pkg).current.is_none()
    }

    pub fn marked_upgrade(&self, pkg: PkgId) -> bool {
        self.install_direction(pkg) == Some(Ordering::Greater)
    }

    pub fn marked_downgrade(&self, pkg: PkgId) -> bool {
        self.install_direction(pkg) == Some(Ordering::Less)
    }

    pub fn marked_delete(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].is_delete()
    }

    pub fn marked_purge(&self, pkg: PkgId) -> bool {
        let state = &self.states[pkg.index()];
        state.is_delete() && state.purge
    }

    pub fn marked_keep(&self, pkg: PkgId) -> bool {
        self.states[pkg.index()].is_keep()
    }

    pub fn marked_reinstall(&self, pkg: PkgId) -> bool {
        let state = &self.states[pkg.index()];
        state.reinstall && !state.is_delete()
    }

    pub fn marked_action(&self, pkg: PkgId) -> MarkedAction {
        let state = &self.states[pkg.index()];
        match state.mode {
            Mode::Delete if state.purge => MarkedAction::Purge,
            Mode::Delete => MarkedAction::Delete,
            Mode::Install => match self.install_direction(pkg) {
                None => MarkedAction::Install,
                Some(Ordering::Less) => MarkedAction::Downgrade,
                Some(Ordering::Greater) => MarkedAction::Upgrade,
                Some(Ordering::Equal) => MarkedAction::ReInstall,
            },
            Mode::Keep if state.reinstall => MarkedAction::ReInstall,
            Mode::Keep => MarkedAction::Keep,
        }
    }

    /// Packages whose marks change the system, by id or by name
    pub fn changes(&self, sort_by_name: bool) -> Vec<PkgId> {
        let mut changed: Vec<PkgId> = self
            .cache
            .all_packages()
            .map(|p| p.id)
            .filter(|&pkg| self.marked_action(pkg).is_change())
            .collect();
        if sort_by_name {
            changed.sort_by(|&a, &b| {
                let (a, b) = (self.cache.package(a), self.cache.package(b));
                a.name.cmp(&b.name).then_with(|| a.arch.cmp(&b.arch))
            });
        }
        changed
    }

    /// Like [`PackageCache::provides_of`], but against this plan's candidates.
    pub fn provides_of(&self, pkg: PkgId, candidates_only: bool) -> Vec<PkgId> {
        self.cache.provides_of_with(pkg, candidates_only, |p| self.candidate(p))
    }

    pub fn is_held(&self, pkg: PkgId) -> bool {
        !self.ignore_hold && self.cache.package(pkg).selection == Selection::Hold
    }

    // --- aggregates ---

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn install_count(&self) -> usize {
        self.totals.install
    }

    pub fn delete_count(&self) -> usize {
        self.totals.delete
    }

    pub fn keep_count(&self) -> usize {
        self.totals.keep
    }

    pub fn broken_count(&self) -> usize {
        self.totals.broken
    }

    /// Bytes to fetch
    pub fn download_size(&self) -> u64 {
        self.totals.download
    }

    /// Change in installed size, in bytes; negative when space is freed
    pub fn disk_size(&self) -> i64 {
        self.totals.disk
    }

    pub fn disk_space(&self) -> DiskSpace {
        DiskSpace::from_delta(self.totals.disk)
    }

    // --- snapshots ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            states: self.states.clone(),
            contributions: self.contributions.clone(),
            totals: self.totals,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.states = snapshot.states;
        self.contributions = snapshot.contributions;
        self.totals = snapshot.totals;
    }

    pub(crate) fn states_equal(&self, snapshot: &Snapshot) -> bool {
        self.states == snapshot.states
    }

    // --- evaluation ---

    fn compare(&self, a: VerId, b: VerId) -> Ordering {
        cmp_versions(&self.cache.version(a).version, &self.cache.version(b).version)
    }

    /// Direction of an Install mark relative to the installed version
    fn install_direction(&self, pkg: PkgId) -> Option<Ordering> {
        let state = &self.states[pkg.index()];
        if !state.is_install() {
            return None;
        }
        match (state.install_ver, self.cache.package(pkg).current) {
            (Some(target), Some(current)) => Some(self.compare(target, current)),
            _ => None,
        }
    }

    pub(crate) fn view_version(&self, pkg: PkgId, view: View) -> Option<VerId> {
        let state = &self.states[pkg.index()];
        match view {
            View::Now => self.cache.package(pkg).current,
            View::Candidate => state.candidate,
            View::Install => match state.mode {
                Mode::Install => state.install_ver,
                Mode::Keep => self.cache.package(pkg).current,
                Mode::Delete => None,
            },
        }
    }

    /// Whether a positive dependency is met in `view`
    pub(crate) fn dep_satisfied(&self, dep: &Dependency, view: View) -> bool {
        if let Some(ver) = self.view_version(dep.target, view) {
            if dep.accepts(&self.cache.version(ver).version) {
                return true;
            }
        }

        self.cache.providers(dep.target).any(|provide| {
            let parent = self.cache.version(provide.owner).parent;
            self.view_version(parent, view) == Some(provide.owner) && dep.accepts_provide(provide)
        })
    }

    /// Whether version `ver` of `pkg` would trip a negative dependency
    pub(crate) fn violated_by(&self, dep: &Dependency, pkg: PkgId, ver: VerId) -> bool {
        if self.cache.version(dep.owner).parent == pkg {
            return false;
        }
        if pkg == dep.target && dep.accepts(&self.cache.version(ver).version) {
            return true;
        }
        self.cache
            .version(ver)
            .provides
            .iter()
            .map(|&p| self.cache.provide(p))
            .any(|provide| provide.target == dep.target && dep.accepts_provide(provide))
    }

    /// Packages that violate a negative dependency in `view`, the owner excluded
    pub(crate) fn violators(&self, dep: &Dependency, view: View) -> Vec<PkgId> {
        let owner = self.cache.version(dep.owner).parent;
        let mut found = Vec::new();

        if dep.target != owner {
            if let Some(ver) = self.view_version(dep.target, view) {
                if dep.accepts(&self.cache.version(ver).version) {
                    found.push(dep.target);
                }
            }
        }

        for provide in self.cache.providers(dep.target) {
            let parent = self.cache.version(provide.owner).parent;
            if parent != owner
                && !found.contains(&parent)
                && self.view_version(parent, view) == Some(provide.owner)
                && dep.accepts_provide(provide)
            {
                found.push(parent);
            }
        }

        found
    }

    pub(crate) fn group_ok(&self, group: &[DepId], view: View) -> bool {
        let first = self.cache.dependency(group[0]);
        if first.is_negative() {
            group
                .iter()
                .all(|&d| self.violators(self.cache.dependency(d), view).is_empty())
        } else {
            group.iter().any(|&d| self.dep_satisfied(self.cache.dependency(d), view))
        }
    }

    /// Critical or-groups of `ver` that are unmet in `view`
    pub(crate) fn broken_groups(&self, ver: VerId, view: View) -> Vec<&[DepId]> {
        self.cache
            .or_groups(ver)
            .into_iter()
            .filter(|group| self.cache.dependency(group[0]).is_critical() && !self.group_ok(group, view))
            .collect()
    }

    fn is_broken(&self, ver: VerId, view: View) -> bool {
        self.cache
            .or_groups(ver)
            .into_iter()
            .any(|group| self.cache.dependency(group[0]).is_critical() && !self.group_ok(group, view))
    }

    fn contribution(&self, pkg: PkgId) -> Totals {
        let state = &self.states[pkg.index()];
        let current = self.cache.package(pkg).current;
        let mut totals = Totals::default();

        match (current, state.mode) {
            (None, Mode::Install) => totals.install = 1,
            (None, _) => {}
            (Some(_), Mode::Delete) => totals.delete = 1,
            (Some(_), Mode::Install) => totals.install = 1,
            (Some(_), Mode::Keep) if state.reinstall => totals.install = 1,
            (Some(_), Mode::Keep) if state.held_back => totals.keep = 1,
            (Some(_), Mode::Keep) => {}
        }

        if state.inst_broken {
            totals.broken = 1;
        }

        let installed_size = |ver: VerId| i64::try_from(self.cache.version(ver).installed_size).unwrap_or(i64::MAX);
        match (state.mode, state.install_ver, current) {
            (Mode::Install, Some(target), current) if Some(target) != current => {
                totals.download = self.cache.version(target).size;
                totals.disk = installed_size(target).saturating_sub(current.map_or(0, installed_size));
            }
            (Mode::Keep, _, Some(current)) if state.reinstall => {
                totals.download = self.cache.version(current).size;
            }
            (Mode::Delete, _, Some(current)) => {
                totals.disk = -installed_size(current);
            }
            _ => {}
        }

        totals
    }

    /// Flag an installed, upgradable package left at Keep as held back
    pub(crate) fn hold_back(&mut self, pkg: PkgId) {
        let state = &self.states[pkg.index()];
        if state.is_keep() && !state.held_back && self.is_upgradable(pkg) {
            self.states[pkg.index()].held_back = true;
            self.refresh(pkg);
        }
    }

    /// Recompute broken flags and counters of one package
    pub(crate) fn refresh(&mut self, pkg: PkgId) {
        let current = self.cache.package(pkg).current;
        let now_broken = current.map_or(false, |ver| self.is_broken(ver, View::Now));
        let inst_broken = self
            .install_version(pkg)
            .map_or(false, |ver| self.is_broken(ver, View::Install));

        let state = &mut self.states[pkg.index()];
        state.now_broken = now_broken;
        state.inst_broken = inst_broken;

        let contribution = self.contribution(pkg);
        let previous = std::mem::replace(&mut self.contributions[pkg.index()], contribution);
        self.totals -= previous;
        self.totals += contribution;
    }

    /// Packages whose dependencies may be affected by a change to `pkg`
    fn dependents(&self, pkg: PkgId) -> Vec<PkgId> {
        let mut found: Vec<PkgId> = self
            .cache
            .rev_depends(pkg)
            .map(|dep| self.cache.version(dep.owner).parent)
            .collect();

        for version in self.cache.versions_of(pkg) {
            for &provide in &version.provides {
                let target = self.cache.provide(provide).target;
                found.extend(self.cache.rev_depends(target).map(|dep| self.cache.version(dep.owner).parent));
            }
        }

        found.sort();
        found.dedup();
        found
    }

    pub(crate) fn after_change(&mut self, pkg: PkgId) {
        self.refresh(pkg);
        if self.group_level > 0 {
            return;
        }
        for dependent in self.dependents(pkg) {
            self.refresh(dependent);
        }
        self.mark_and_sweep();
    }

    /// Re-evaluate every package and recompute garbage
    pub fn update(&mut self) {
        for index in 0..self.states.len() {
            self.refresh(PkgId::from_index(index));
        }
        self.mark_and_sweep();
        self.full_updates += 1;
    }

    /// Flag auto-installed packages unreachable from the manually installed set
    fn mark_and_sweep(&mut self) {
        let cache = Arc::clone(&self.cache);
        let mut reachable = vec![false; self.states.len()];

        let mut stack: Vec<PkgId> = cache
            .all_packages()
            .filter(|p| self.install_version(p.id).is_some() && (!self.states[p.id.index()].auto || p.essential))
            .map(|p| p.id)
            .collect();

        while let Some(pkg) = stack.pop() {
            if std::mem::replace(&mut reachable[pkg.index()], true) {
                continue;
            }
            let Some(ver) = self.install_version(pkg) else {
                continue;
            };

            for &dep in &cache.version(ver).depends {
                let dep = cache.dependency(dep);
                if !matches!(
                    dep.dep_type,
                    DepType::Depends | DepType::PreDepends | DepType::Recommends | DepType::Suggests
                ) {
                    continue;
                }

                if let Some(target) = self.install_version(dep.target) {
                    if dep.accepts(&cache.version(target).version) && !reachable[dep.target.index()] {
                        stack.push(dep.target);
                    }
                }
                for provide in cache.providers(dep.target) {
                    let parent = cache.version(provide.owner).parent;
                    if self.install_version(parent) == Some(provide.owner) && !reachable[parent.index()] {
                        stack.push(parent);
                    }
                }
            }
        }

        for (index, state) in self.states.iter_mut().enumerate() {
            let has_version = match state.mode {
                Mode::Install => state.install_ver.is_some(),
                Mode::Keep => cache.packages[index].current.is_some(),
                Mode::Delete => false,
            };
            state.garbage = has_version && state.auto && !reachable[index];
        }
    }
}
