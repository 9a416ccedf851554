use std::time::Instant;

use super::DepCache;
use crate::cache::PkgId;
use crate::error::Result;
use crate::progress::{Phase, ProgressSink};
use crate::resolver::ProblemResolver;

/// How far an upgrade may go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Upgrade {
    /// Only upgrade packages that need nothing new and remove nothing
    SafeUpgrade,
    /// New packages may be installed, nothing is removed
    #[default]
    Upgrade,
    /// Anything goes; conflicts are settled by the problem resolver
    FullUpgrade,
}

impl DepCache {
    fn new_install_count(&self) -> usize {
        self.cache
            .all_packages()
            .filter(|p| self.marked_install(p.id))
            .count()
    }

    /// Mark upgradable packages for upgrade. Held packages are skipped.
    pub fn upgrade(&mut self, mode: Upgrade, progress: &mut dyn ProgressSink) -> Result<()> {
        let start = Instant::now();
        let candidates: Vec<PkgId> = self
            .cache
            .all_packages()
            .map(|p| p.id)
            .filter(|&pkg| self.is_upgradable(pkg) && !self.is_held(pkg))
            .collect();
        let total = candidates.len().max(1) as f32;

        log::debug!("{} packages can be upgraded ({:?})", candidates.len(), mode);

        if mode == Upgrade::FullUpgrade {
            {
                let mut group = self.action_group();
                for (i, &pkg) in candidates.iter().enumerate() {
                    group.mark_install_inner(pkg, true, false, 0);
                    progress.progress(Phase::Upgrade, (i + 1) as f32 * 100.0 / total);
                }
            }
            ProblemResolver::new(self).resolve(true, progress)?;
        } else {
            for (i, &pkg) in candidates.iter().enumerate() {
                let snapshot = self.snapshot();
                let (broken, deleted, installed) = (self.broken_count(), self.delete_count(), self.new_install_count());

                if self.mark_install_inner(pkg, true, false, 0) {
                    let held_back = self.broken_count() > broken
                        || self.delete_count() > deleted
                        || (mode == Upgrade::SafeUpgrade && self.new_install_count() > installed);
                    if held_back {
                        log::debug!("Keeping back {}", self.cache.fullname(pkg, true));
                        self.restore(snapshot);
                    }
                }
                progress.progress(Phase::Upgrade, (i + 1) as f32 * 100.0 / total);
            }
        }

        // everything upgradable that stayed put, holds included
        let kept: Vec<PkgId> = self
            .cache
            .all_packages()
            .map(|p| p.id)
            .filter(|&pkg| self.is_upgradable(pkg) && self.marked_keep(pkg))
            .collect();
        for pkg in kept {
            self.hold_back(pkg);
        }

        log::info!(
            "Upgrade calculation completed in {:.3} seconds",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
