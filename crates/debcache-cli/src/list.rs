//! List command - apt list

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use debcache_core::{DepCache, Filter, PackageSort, PkgId};

use crate::context::CacheArgs;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only installed packages
    #[arg(long)]
    pub installed: bool,

    /// Only packages with a newer candidate
    #[arg(long)]
    pub upgradable: bool,

    /// Only automatically installed packages nothing needs anymore
    #[arg(long)]
    pub auto_removable: bool,

    /// Include virtual packages
    #[arg(long)]
    pub all_virtual: bool,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub cache: CacheArgs,
}

impl ListArgs {
    fn sort(&self) -> PackageSort {
        let only = |flag: bool| if flag { Filter::Only } else { Filter::Any };
        PackageSort::default()
            .installed(only(self.installed))
            .upgradable(only(self.upgradable))
            .auto_removable(only(self.auto_removable))
            .virtual_pkgs(if self.all_virtual { Filter::Any } else { Filter::Exclude })
            .names()
    }
}

fn status_of(depcache: &DepCache, pkg: PkgId) -> Vec<String> {
    let cache = depcache.cache();
    let mut flags = Vec::new();
    if cache.package(pkg).is_installed() {
        flags.push(if depcache.is_auto_installed(pkg) { "installed,automatic" } else { "installed" }.to_string());
    }
    if depcache.is_upgradable(pkg) {
        if let Some(current) = cache.package(pkg).current {
            flags.push(format!("upgradable from: {}", cache.version(current).version));
        }
    }
    if depcache.is_auto_removable(pkg) {
        flags.push("auto-removable".to_string());
    }
    flags
}

pub fn execute(args: ListArgs) -> Result<i32> {
    let session = args.cache.open()?;
    let depcache = &session.depcache;
    let cache = depcache.cache();
    let packages = depcache.packages(&args.sort());

    if args.json {
        let entries: Vec<serde_json::Value> = packages
            .iter()
            .map(|&pkg| {
                let version = depcache.candidate(pkg).map(|v| cache.version(v).version.clone());
                serde_json::json!({
                    "package": cache.fullname(pkg, true),
                    "candidate": version,
                    "status": status_of(depcache, pkg),
                })
            })
            .collect();
        let text = serde_json::to_string_pretty(&entries).context("Failed to serialize the package list")?;
        println!("{}", text);
        return Ok(0);
    }

    for pkg in packages {
        let package = cache.package(pkg);
        let shown = depcache.candidate(pkg).or(package.current);
        let (version, archive) = match shown {
            Some(ver) => {
                let version = cache.version(ver);
                let archive = version
                    .files
                    .iter()
                    .filter_map(|f| cache.file(f.file).archive.clone())
                    .collect::<Vec<_>>()
                    .join(",");
                (version.version.clone(), archive)
            }
            None => (String::new(), String::new()),
        };

        let status = status_of(depcache, pkg);
        let suffix = if status.is_empty() { String::new() } else { format!(" [{}]", status.join(",")) };
        println!("{}/{} {} {}{}", style(&package.name).green(), archive, version, package.arch, suffix);
    }

    Ok(0)
}
