//! Remove command - simulate apt-get remove

use anyhow::Result;
use clap::Args;
use console::style;

use crate::context::CacheArgs;
use crate::output::print_plan;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Packages to remove
    #[arg(value_name = "PACKAGES", required = true)]
    pub packages: Vec<String>,

    /// Remove configuration files too
    #[arg(long)]
    pub purge: bool,

    /// Also remove automatically installed packages nothing needs anymore
    #[arg(long)]
    pub auto_remove: bool,

    /// Print the transaction as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub cache: CacheArgs,
}

pub fn execute(args: RemoveArgs) -> Result<i32> {
    let mut session = args.cache.open()?;

    let mut requested = Vec::new();
    for name in &args.packages {
        let pkg = session.find(name)?;
        if !session.depcache.cache().package(pkg).is_installed() {
            println!("Package '{}' is not installed, so not removed", style(name).bold());
            continue;
        }
        requested.push(pkg);
    }

    {
        let mut group = session.depcache.action_group();
        for &pkg in &requested {
            group.mark_delete(pkg, args.purge);
        }
    }

    // packages depending on the removed ones go too
    if !session.resolve(&requested, false)? {
        return Ok(1);
    }

    if args.auto_remove {
        let count = session.depcache.mark_auto_removals(args.purge);
        log::info!("Marked {} unused packages for removal", count);
    }

    print_plan(&session.depcache, args.json)?;
    Ok(0)
}
