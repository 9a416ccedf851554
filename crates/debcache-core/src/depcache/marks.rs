//! Mark operations
//!
//! Marks return `false` when the transition is impossible (no candidate,
//! virtual package, vetoed by a hold or by resolver protection) and leave
//! the state untouched in that case.

use std::sync::Arc;

use super::{DepCache, Mode, View};
use crate::cache::{DepId, DepType, PkgId, VerId};

impl DepCache {
    /// User requests always pass; automatic ones respect protection and holds.
    fn is_mode_change_ok(&self, mode: Mode, pkg: PkgId, depth: u32, from_user: bool) -> bool {
        let package = self.cache.package(pkg);
        let state = &self.states[pkg.index()];

        if mode != Mode::Keep && depth > self.max_depth {
            log::debug!("Not changing {}: dependency depth {} exceeded", package.fullname(), depth);
            return false;
        }
        if mode != Mode::Keep && package.is_virtual() {
            return false;
        }
        if from_user {
            return true;
        }
        if state.protected {
            log::debug!("Not changing protected package {}", package.fullname());
            return false;
        }
        if state.mode == mode {
            return true;
        }
        if mode != Mode::Keep && self.is_held(pkg) {
            log::debug!("Not changing held package {}", package.fullname());
            return false;
        }
        true
    }

    /// Reset a package to keep its installed version (or stay uninstalled).
    pub fn mark_keep(&mut self, pkg: PkgId) -> bool {
        self.mark_keep_from(pkg, true, 0)
    }

    pub(crate) fn mark_keep_from(&mut self, pkg: PkgId, from_user: bool, depth: u32) -> bool {
        if !self.is_mode_change_ok(Mode::Keep, pkg, depth, from_user) {
            return false;
        }

        let current = self.cache.package(pkg).current;
        let reverted = !self.states[pkg.index()].is_keep() && self.is_upgradable(pkg);
        let state = &mut self.states[pkg.index()];
        state.mode = Mode::Keep;
        state.install_ver = current;
        state.purge = false;
        state.reinstall = false;
        if reverted {
            state.held_back = true;
        }
        self.after_change(pkg);
        true
    }

    /// Mark for removal. Dependents that break are only flagged, not changed.
    pub fn mark_delete(&mut self, pkg: PkgId, purge: bool) -> bool {
        self.mark_delete_from(pkg, purge, true, 0)
    }

    pub(crate) fn mark_delete_from(&mut self, pkg: PkgId, purge: bool, from_user: bool, depth: u32) -> bool {
        // nothing installed, so not installing is the removal
        if self.cache.package(pkg).current.is_none() {
            return self.mark_keep_from(pkg, from_user, depth);
        }
        if !self.is_mode_change_ok(Mode::Delete, pkg, depth, from_user) {
            return false;
        }

        let state = &mut self.states[pkg.index()];
        state.mode = Mode::Delete;
        state.install_ver = None;
        state.purge = purge;
        state.reinstall = false;
        state.held_back = false;
        self.after_change(pkg);
        true
    }

    /// Mark for installation (or upgrade) to the candidate version.
    ///
    /// With `auto_install`, unmet Depends and Pre-Depends of the candidate
    /// are installed as automatic packages (Recommends too when configured)
    /// and installed packages it conflicts with are upgraded or removed.
    /// Failures while doing so are silent; check [`DepCache::is_inst_broken`].
    pub fn mark_install(&mut self, pkg: PkgId, auto_install: bool, from_user: bool) -> bool {
        self.mark_install_inner(pkg, auto_install, from_user, 0)
    }

    pub(crate) fn mark_install_inner(&mut self, pkg: PkgId, auto_install: bool, from_user: bool, depth: u32) -> bool {
        if !self.is_mode_change_ok(Mode::Install, pkg, depth, from_user) {
            return false;
        }
        let Some(candidate) = self.states[pkg.index()].candidate else {
            return false;
        };
        let current = self.cache.package(pkg).current;

        if current == Some(candidate) {
            if !self.states[pkg.index()].is_keep() && !self.mark_keep_from(pkg, from_user, depth) {
                return false;
            }
            if from_user && self.states[pkg.index()].auto {
                self.states[pkg.index()].auto = false;
                self.after_change(pkg);
            }
            if auto_install {
                self.install_dependencies(pkg, candidate, depth);
            }
            return true;
        }

        let state = &self.states[pkg.index()];
        if state.is_install() && state.install_ver == Some(candidate) && !state.inst_broken {
            if from_user && state.auto {
                self.states[pkg.index()].auto = false;
                self.after_change(pkg);
            }
            return true;
        }

        let state = &mut self.states[pkg.index()];
        let fresh = current.is_none() && !state.is_install();
        state.mode = Mode::Install;
        state.install_ver = Some(candidate);
        state.purge = false;
        state.reinstall = false;
        state.held_back = false;
        if from_user {
            state.auto = false;
        } else if fresh {
            state.auto = true;
        }
        self.after_change(pkg);

        if auto_install {
            self.install_dependencies(pkg, candidate, depth);
        }
        true
    }

    fn install_dependencies(&mut self, pkg: PkgId, ver: VerId, depth: u32) {
        let cache = Arc::clone(&self.cache);

        for group in cache.or_groups(ver) {
            let first = cache.dependency(group[0]);
            if first.is_negative() {
                for &dep in group {
                    self.remove_violators(pkg, dep, depth);
                }
                continue;
            }

            let wanted = match first.dep_type {
                DepType::Depends | DepType::PreDepends => true,
                DepType::Recommends => self.install_recommends,
                _ => false,
            };
            if !wanted || self.group_ok(group, View::Install) {
                continue;
            }

            'group: for &dep in group {
                for target in self.install_targets(dep) {
                    if self.mark_install_inner(target, true, false, depth + 1) {
                        break 'group;
                    }
                }
            }
        }
    }

    /// Packages whose candidate would satisfy `dep`: the target itself, then providers
    pub(crate) fn install_targets(&self, dep: DepId) -> Vec<PkgId> {
        let dep = self.cache.dependency(dep);
        let mut targets = Vec::new();

        if let Some(candidate) = self.candidate(dep.target) {
            if dep.accepts(&self.cache.version(candidate).version) {
                targets.push(dep.target);
            }
        }

        for provide in self.cache.providers(dep.target) {
            let parent = self.cache.version(provide.owner).parent;
            if self.candidate(parent) == Some(provide.owner)
                && dep.accepts_provide(provide)
                && !targets.contains(&parent)
            {
                targets.push(parent);
            }
        }

        targets
    }

    /// Upgrade away from or remove packages that `pkg` conflicts with
    fn remove_violators(&mut self, pkg: PkgId, dep: DepId, depth: u32) {
        let cache = Arc::clone(&self.cache);
        let dependency = cache.dependency(dep);

        for violator in self.violators(dependency, View::Install) {
            if let Some(candidate) = self.candidate(violator) {
                if Some(candidate) != self.install_version(violator)
                    && !self.violated_by(dependency, violator, candidate)
                    && self.mark_install_inner(violator, false, false, depth + 1)
                {
                    continue;
                }
            }
            log::debug!(
                "{} {} {}, removing it",
                cache.fullname(pkg, true),
                dependency.dep_type,
                cache.fullname(violator, true)
            );
            self.mark_delete_from(violator, false, false, depth + 1);
        }
    }

    pub fn mark_auto(&mut self, pkg: PkgId, is_auto: bool) {
        self.states[pkg.index()].auto = is_auto;
        self.after_change(pkg);
    }

    /// Reinstall the installed version. Fails when nothing is installed or
    /// the installed version cannot be downloaded.
    pub fn mark_reinstall(&mut self, pkg: PkgId, on: bool) -> bool {
        let Some(current) = self.cache.package(pkg).current else {
            return false;
        };
        if on && !self.cache.version(current).downloadable() {
            return false;
        }

        let state = &mut self.states[pkg.index()];
        if on && state.is_delete() {
            state.mode = Mode::Keep;
            state.install_ver = Some(current);
            state.purge = false;
        }
        state.reinstall = on;
        self.after_change(pkg);
        true
    }

    /// Override the policy's candidate for one package.
    ///
    /// A pending install of the old candidate follows the new one. Returns
    /// `false` for a version that is neither downloadable nor installed.
    pub fn set_candidate_version(&mut self, ver: VerId) -> bool {
        let version = self.cache.version(ver);
        let pkg = version.parent;
        let current = self.cache.package(pkg).current;
        if !version.downloadable() && current != Some(ver) {
            return false;
        }

        let state = &mut self.states[pkg.index()];
        if state.is_install() && state.install_ver == state.candidate {
            if current == Some(ver) {
                state.mode = Mode::Keep;
                state.install_ver = current;
            } else {
                state.install_ver = Some(ver);
            }
        }
        if current == Some(ver) {
            state.held_back = false;
        }
        state.candidate = Some(ver);
        self.after_change(pkg);
        true
    }

    pub(crate) fn set_protected(&mut self, pkg: PkgId, protected: bool) {
        self.states[pkg.index()].protected = protected;
    }

    /// Local repair: install what broken packages miss, remove them if that fails.
    ///
    /// Returns `true` when nothing is left broken.
    pub fn fix_broken(&mut self) -> bool {
        let broken: Vec<PkgId> = (0..self.states.len())
            .map(PkgId::from_index)
            .filter(|&pkg| self.is_inst_broken(pkg))
            .collect();

        for pkg in broken {
            if !self.is_inst_broken(pkg) || self.marked_delete(pkg) {
                continue;
            }
            self.mark_install_inner(pkg, true, false, 0);
            if self.is_inst_broken(pkg) {
                log::debug!("Removing {} to fix broken dependencies", self.cache.fullname(pkg, true));
                self.mark_delete_from(pkg, false, false, 0);
            }
        }

        self.broken_count() == 0
    }

    /// Mark every installed garbage package for removal; returns how many were marked.
    pub fn mark_auto_removals(&mut self, purge: bool) -> usize {
        let garbage: Vec<PkgId> = self
            .cache
            .all_packages()
            .filter(|p| p.is_installed() && self.is_garbage(p.id) && !self.marked_delete(p.id))
            .map(|p| p.id)
            .collect();

        let mut count = 0;
        let mut group = self.action_group();
        for pkg in garbage {
            if group.mark_delete_from(pkg, purge, false, 0) {
                count += 1;
            }
        }
        group.release();
        count
    }
}
