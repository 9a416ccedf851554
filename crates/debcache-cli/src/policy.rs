//! Policy command - apt-cache policy

use anyhow::Result;
use clap::Args;
use console::style;

use debcache_core::cache::IndexType;
use debcache_core::{DepCache, PackageFile, PkgId, VerId};

use crate::context::CacheArgs;

#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Packages to show; without any, list the package files
    #[arg(value_name = "PACKAGES")]
    pub packages: Vec<String>,

    #[command(flatten)]
    pub cache: CacheArgs,
}

pub fn execute(args: PolicyArgs) -> Result<i32> {
    let session = args.cache.open()?;
    let depcache = &session.depcache;

    if args.packages.is_empty() {
        print_files(depcache);
        return Ok(0);
    }

    for name in &args.packages {
        let pkg = session.find(name)?;
        print_package(depcache, pkg);
    }
    Ok(0)
}

pub fn describe_file(file: &PackageFile) -> String {
    let location = file
        .filename
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    if file.is_status() {
        return location;
    }
    match (&file.archive, location.is_empty()) {
        (Some(archive), false) => format!("{} {}", archive, location),
        (Some(archive), true) => archive.clone(),
        (None, _) => location,
    }
}

fn print_files(depcache: &DepCache) {
    let cache = depcache.cache();
    println!("Package files:");
    for file in cache.files() {
        if file.index_type != IndexType::Packages && !file.is_status() {
            continue;
        }
        println!(" {} {}", depcache.policy().file_priority(file.id), describe_file(file));
        if let Some(archive) = &file.archive {
            if !file.is_status() {
                println!("     release a={}", archive);
            }
        }
    }
}

fn print_package(depcache: &DepCache, pkg: PkgId) {
    let cache = depcache.cache();
    let package = cache.package(pkg);
    let policy = depcache.policy();
    let version_name = |ver: Option<VerId>| {
        ver.map_or_else(|| "(none)".to_string(), |v| cache.version(v).version.clone())
    };

    println!("{}:", style(cache.fullname(pkg, true)).bold());
    println!("  Installed: {}", version_name(package.current));
    println!("  Candidate: {}", version_name(depcache.candidate(pkg)));

    if package.is_virtual() {
        let providers: Vec<String> = depcache
            .provides_of(pkg, false)
            .into_iter()
            .map(|p| cache.fullname(p, true))
            .collect();
        if !providers.is_empty() {
            println!("  Provided by: {}", providers.join(", "));
        }
        return;
    }

    println!("  Version table:");
    for version in cache.versions_of(pkg) {
        let marker = if package.current == Some(version.id) { "***" } else { "   " };
        println!(" {} {} {}", marker, version.version, policy.priority(cache, version.id));
        for location in &version.files {
            let file = cache.file(location.file);
            println!("        {} {}", policy.file_priority(file.id), describe_file(file));
        }
    }
}
