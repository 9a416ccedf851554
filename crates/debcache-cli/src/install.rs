//! Install command - simulate apt-get install

use anyhow::{bail, Result};
use clap::Args;
use console::style;

use debcache_core::PkgId;

use crate::context::{CacheArgs, Session};
use crate::output::print_plan;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Packages to install, optionally with a version (`foo=1.2-1`)
    #[arg(value_name = "PACKAGES", required = true)]
    pub packages: Vec<String>,

    /// Do not install missing dependencies automatically
    #[arg(long)]
    pub no_auto: bool,

    /// Let the resolver repair packages that were broken before
    #[arg(short, long)]
    pub fix_broken: bool,

    /// Print the transaction as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub cache: CacheArgs,
}

/// Resolve a request to a real package, following a single provider of a
/// virtual one and pinning an explicit version.
fn select(session: &mut Session, spec: &str) -> Result<PkgId> {
    let (name, wanted) = match spec.split_once('=') {
        Some((name, version)) => (name, Some(version)),
        None => (spec, None),
    };
    let mut pkg = session.find(name)?;
    let cache = session.depcache.cache().clone();

    if cache.package(pkg).is_virtual() {
        let providers = session.depcache.provides_of(pkg, true);
        match providers.as_slice() {
            [] => bail!("Package '{}' has no installation candidate", name),
            [only] => {
                println!("Note, selecting '{}' instead of '{}'", cache.fullname(*only, true), name);
                pkg = *only;
            }
            _ => {
                let names: Vec<String> = providers.iter().map(|&p| cache.fullname(p, true)).collect();
                bail!(
                    "Package '{}' is a virtual package provided by {}; select one explicitly",
                    name,
                    names.join(", ")
                );
            }
        }
    }

    if let Some(wanted) = wanted {
        let Some(version) = cache.versions_of(pkg).find(|v| v.version == wanted) else {
            bail!("Version '{}' for '{}' was not found", wanted, name);
        };
        if !session.depcache.set_candidate_version(version.id) {
            bail!("Version '{}' for '{}' cannot be downloaded", wanted, name);
        }
    }

    Ok(pkg)
}

pub fn execute(args: InstallArgs) -> Result<i32> {
    let mut session = args.cache.open()?;

    let mut requested = Vec::new();
    for spec in &args.packages {
        requested.push(select(&mut session, spec)?);
    }

    {
        let mut group = session.depcache.action_group();
        for &pkg in &requested {
            if !group.mark_install(pkg, !args.no_auto, true) {
                bail!("Package '{}' has no installation candidate", group.cache().fullname(pkg, true));
            }
        }
    }

    for &pkg in &requested {
        if session.depcache.marked_keep(pkg) && !session.depcache.marked_reinstall(pkg) {
            let cache = session.depcache.cache();
            let version = cache.package(pkg).current.map(|v| cache.version(v).version.clone());
            println!(
                "{} is already the newest version ({}).",
                style(cache.fullname(pkg, true)).bold(),
                version.unwrap_or_default()
            );
        }
    }

    if !session.resolve(&requested, args.fix_broken)? {
        return Ok(1);
    }

    print_plan(&session.depcache, args.json)?;
    Ok(0)
}
