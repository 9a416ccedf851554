//! Upgrade command - simulate apt-get upgrade / full-upgrade

use anyhow::Result;
use clap::Args;

use debcache_core::{CacheError, ProgressSink, Upgrade};

use crate::context::{report_problems, CacheArgs};
use crate::output::print_plan;

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Never install new packages
    #[arg(long, conflicts_with = "full")]
    pub safe: bool,

    /// Allow removals to complete the upgrade
    #[arg(long)]
    pub full: bool,

    /// Print the transaction as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub cache: CacheArgs,
}

impl UpgradeArgs {
    fn mode(&self) -> Upgrade {
        if self.safe {
            Upgrade::SafeUpgrade
        } else if self.full {
            Upgrade::FullUpgrade
        } else {
            Upgrade::Upgrade
        }
    }
}

pub fn execute(args: UpgradeArgs) -> Result<i32> {
    let mut session = args.cache.open()?;

    let result = session.depcache.upgrade(args.mode(), &mut session.progress);
    session.progress.finish();
    match result {
        Ok(()) => {}
        Err(CacheError::Unsatisfiable(problems)) => {
            report_problems(&problems);
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    }

    print_plan(&session.depcache, args.json)?;
    Ok(0)
}
