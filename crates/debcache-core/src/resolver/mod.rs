//! Problem resolver
//!
//! A greedy fixer over a [`DepCache`]. Every package gets a score once, at
//! the start of [`ProblemResolver::resolve`]:
//!
//! | term | value |
//! |---|---|
//! | priority class | Required 3, Important 2, Standard 1, Optional -1, Extra -2 |
//! | installed | +1 |
//! | essential | +100 |
//! | explicitly requested | +50 |
//! | protected | +10000 |
//! | each reverse Depends/Pre-Depends from the plan | +1 |
//!
//! Broken packages are visited highest score first, ties by package id.
//! A broken dependency group is fixed by installing the first alternative
//! (declaration order) that neither breaks nor removes a higher-scored
//! package, and never removes an essential one. A
//! conflict removes the lower-scored side. When nothing works the package
//! is kept at its installed version or not installed at all. Passes repeat
//! until one changes nothing, up to `resolver_max_passes`.

mod problem;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Instant;

use crate::cache::{DepId, PkgId, PriorityClass};
use crate::depcache::{DepCache, Snapshot, View};
use crate::error::{CacheError, Result};
use crate::progress::{Phase, ProgressSink};

pub use problem::{Problem, ProblemKind, ProblemSet};

pub const SCORE_INSTALLED: i64 = 1;
pub const SCORE_ESSENTIAL: i64 = 100;
pub const SCORE_EXPLICIT: i64 = 50;
pub const SCORE_PROTECTED: i64 = 10000;

fn class_weight(class: PriorityClass) -> i64 {
    match class {
        PriorityClass::Required => 3,
        PriorityClass::Important => 2,
        PriorityClass::Standard => 1,
        PriorityClass::Optional => -1,
        PriorityClass::Extra => -2,
    }
}

pub struct ProblemResolver<'a> {
    cache: &'a mut DepCache,
    max_passes: u32,
}

impl<'a> ProblemResolver<'a> {
    pub fn new(cache: &'a mut DepCache) -> Self {
        let max_passes = cache.resolver_passes.max(1);
        Self { cache, max_passes }
    }

    /// Override the number of passes before giving up
    pub fn max_passes(mut self, passes: u32) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    /// Never change the marks of `pkg`
    pub fn protect(&mut self, pkg: PkgId) {
        self.cache.set_protected(pkg, true);
    }

    pub fn clear(&mut self, pkg: PkgId) {
        self.cache.set_protected(pkg, false);
    }

    pub fn score(&self, pkg: PkgId) -> i64 {
        let cache = self.cache.cache();
        let package = cache.package(pkg);
        let state = self.cache.state(pkg);
        let mut score = 0;

        if let Some(ver) = self.cache.install_version(pkg).or(state.candidate) {
            score += class_weight(cache.version(ver).priority);
        }
        if package.is_installed() {
            score += SCORE_INSTALLED;
        }
        if package.essential {
            score += SCORE_ESSENTIAL;
        }
        if state.is_install() && !state.auto {
            score += SCORE_EXPLICIT;
        }
        if state.protected {
            score += SCORE_PROTECTED;
        }

        // reverse hard dependencies from versions the plan installs
        let mut targets = vec![pkg];
        if let Some(ver) = self.cache.install_version(pkg) {
            targets.extend(cache.version(ver).provides.iter().map(|&p| cache.provide(p).target));
        }
        for target in targets {
            score += cache
                .rev_depends(target)
                .filter(|dep| dep.is_critical() && !dep.is_negative())
                .filter(|dep| self.cache.install_version(cache.version(dep.owner).parent) == Some(dep.owner))
                .count() as i64;
        }

        score
    }

    /// Fix every broken package, or fail with the problems that remain.
    ///
    /// On failure the cache keeps the marks of the last attempt.
    pub fn resolve(&mut self, fix_broken: bool, progress: &mut dyn ProgressSink) -> Result<()> {
        let start = Instant::now();
        let count = self.cache.cache().package_count();
        let scores: Vec<i64> = (0..count).map(|i| self.score(PkgId::from_index(i))).collect();

        let mut order: Vec<PkgId> = (0..count).map(PkgId::from_index).collect();
        order.sort_by(|a, b| scores[b.index()].cmp(&scores[a.index()]).then(a.cmp(b)));

        log::debug!("Resolving with {} broken packages", self.cache.broken_count());

        let mut passes = 0;
        let mut settled = false;
        while passes < self.max_passes {
            passes += 1;
            let before = self.cache.snapshot();

            for (i, &pkg) in order.iter().enumerate() {
                if self.cache.is_inst_broken(pkg) {
                    self.fix_package(pkg, &scores);
                }
                let done = (passes - 1) as f32 + (i + 1) as f32 / count.max(1) as f32;
                progress.progress(Phase::Resolve, done * 100.0 / self.max_passes as f32);
            }

            if self.cache.broken_count() == 0 || self.cache.states_equal(&before) {
                settled = true;
                break;
            }
        }

        log::debug!("Resolver finished after {} passes", passes);

        if fix_broken && self.cache.broken_count() > 0 {
            self.cache.fix_broken();
        }
        progress.progress(Phase::Resolve, 100.0);

        log::info!(
            "Dependency resolution completed in {:.3} seconds",
            start.elapsed().as_secs_f64()
        );

        let problems = self.problems(&order, settled, passes);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Unsatisfiable(problems))
        }
    }

    fn fix_package(&mut self, pkg: PkgId, scores: &[i64]) {
        let Some(ver) = self.cache.install_version(pkg) else {
            return;
        };
        let cache = Arc::clone(self.cache.cache());
        let groups: Vec<Vec<DepId>> = self
            .cache
            .broken_groups(ver, View::Install)
            .into_iter()
            .map(|group| group.to_vec())
            .collect();

        for group in groups {
            // an earlier fix may have changed or removed the package
            if self.cache.install_version(pkg) != Some(ver) {
                return;
            }
            if self.cache.group_ok(&group, View::Install) {
                continue;
            }

            if cache.dependency(group[0]).is_negative() {
                for &dep in &group {
                    self.resolve_conflict(pkg, dep, scores);
                }
            } else if !self.try_alternatives(pkg, &group, scores) {
                log::debug!(
                    "No alternative for {} {}: {}",
                    cache.fullname(pkg, true),
                    cache.dependency(group[0]).dep_type,
                    cache.describe_group(&group)
                );
                self.give_up(pkg);
            }
        }
    }

    fn resolve_conflict(&mut self, pkg: PkgId, dep: DepId, scores: &[i64]) {
        let cache = Arc::clone(self.cache.cache());
        let dependency = cache.dependency(dep);

        for other in self.cache.violators(dependency, View::Install) {
            if self.cache.install_version(pkg).is_none() {
                return;
            }

            if self.cache.is_protected(other) || scores[other.index()] > scores[pkg.index()] {
                log::debug!(
                    "{} conflicts with {}, giving up on {}",
                    cache.fullname(pkg, true),
                    cache.fullname(other, true),
                    cache.fullname(pkg, true)
                );
                self.give_up(pkg);
                return;
            }

            // prefer upgrading the other side out of the conflict
            if let Some(candidate) = self.cache.candidate(other) {
                if Some(candidate) != self.cache.install_version(other)
                    && !self.cache.violated_by(dependency, other, candidate)
                    && self.cache.mark_install_inner(other, false, false, 0)
                {
                    continue;
                }
            }

            log::debug!(
                "{} conflicts with {}, removing {}",
                cache.fullname(pkg, true),
                cache.fullname(other, true),
                cache.fullname(other, true)
            );
            if !self.cache.mark_delete_from(other, false, false, 0) {
                self.give_up(pkg);
                return;
            }
        }
    }

    /// Install the first alternative that satisfies the group without breaking
    /// anything scored higher than `pkg`.
    fn try_alternatives(&mut self, pkg: PkgId, group: &[DepId], scores: &[i64]) -> bool {
        for &dep in group {
            for target in self.cache.install_targets(dep) {
                let snapshot = self.cache.snapshot();
                if self.cache.mark_install_inner(target, true, false, 0)
                    && self.cache.group_ok(group, View::Install)
                    && !self.cache.is_inst_broken(target)
                    && !self.breaks_higher(pkg, scores, &snapshot)
                {
                    log::debug!(
                        "Installing {} for {}",
                        self.cache.cache().fullname(target, true),
                        self.cache.cache().fullname(pkg, true)
                    );
                    return true;
                }
                self.cache.restore(snapshot);
            }
        }
        false
    }

    /// Whether the last attempt broke or removed a package that outranks
    /// `pkg`. Essential packages always outrank it for removal.
    fn breaks_higher(&self, pkg: PkgId, scores: &[i64], before: &Snapshot) -> bool {
        let threshold = scores[pkg.index()];
        let cache = self.cache.cache();
        before.states.iter().enumerate().any(|(i, state)| {
            let other = PkgId::from_index(i);
            let broken = !state.inst_broken && self.cache.is_inst_broken(other);
            let removed = !state.is_delete() && self.cache.marked_delete(other);
            (broken && scores[i] > threshold) || (removed && (scores[i] > threshold || cache.package(other).essential))
        })
    }

    /// Keep the installed version of an upgrade, otherwise remove (or don't install)
    fn give_up(&mut self, pkg: PkgId) -> bool {
        let current = self.cache.cache().package(pkg).current;
        if current.is_some() && self.cache.install_version(pkg) != current && self.cache.mark_keep_from(pkg, false, 0) {
            return true;
        }
        self.cache.mark_delete_from(pkg, false, false, 0)
    }

    fn problems(&self, order: &[PkgId], settled: bool, passes: u32) -> ProblemSet {
        let cache = self.cache.cache();
        let mut problems = ProblemSet::new();
        let broken: Vec<PkgId> = order.iter().copied().filter(|&p| self.cache.is_inst_broken(p)).collect();

        if !settled {
            if let Some(&first) = broken.first() {
                problems.add(Problem {
                    pkg: first,
                    package: cache.fullname(first, true),
                    kind: ProblemKind::IterationCap { passes },
                });
            }
        }

        for pkg in broken {
            let Some(ver) = self.cache.install_version(pkg) else {
                continue;
            };
            for group in self.cache.broken_groups(ver, View::Install) {
                let first = cache.dependency(group[0]);
                if first.is_negative() {
                    for &dep in group {
                        for other in self.cache.violators(cache.dependency(dep), View::Install) {
                            let with = cache.fullname(other, true);
                            let kind = if self.cache.is_protected(pkg) || self.cache.is_protected(other) {
                                ProblemKind::ProtectedConflict { with }
                            } else {
                                ProblemKind::Conflict { with }
                            };
                            problems.add(Problem { pkg, package: cache.fullname(pkg, true), kind });
                        }
                    }
                } else {
                    problems.add(Problem {
                        pkg,
                        package: cache.fullname(pkg, true),
                        kind: ProblemKind::MissingDependency {
                            dependency: format!("{}: {}", first.dep_type, cache.describe_group(group)),
                        },
                    });
                }
            }
        }

        problems
    }
}
