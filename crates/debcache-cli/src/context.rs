//! Cache sources shared by every subcommand

use anyhow::{bail, Context, Result};
use clap::Args;
use console::{style, Term};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use debcache_core::index::deb822;
use debcache_core::{
    CacheBuilder, CacheError, Config, DepCache, ErrorCollector, PackageCache, PackageFile, PkgId, Policy,
    ProblemResolver, ProblemSet, ProgressBarSink, ProgressSink,
};

#[derive(Args, Debug, Clone, Default)]
pub struct CacheArgs {
    /// Packages index, optionally prefixed with its archive (`stable=lists/Packages`)
    #[arg(id = "packages_files", long = "packages", value_name = "[ARCHIVE=]FILE", action = clap::ArgAction::Append)]
    pub packages: Vec<String>,

    /// dpkg status file
    #[arg(long, value_name = "FILE")]
    pub status: Option<PathBuf>,

    /// apt extended_states file with Auto-Installed flags
    #[arg(long, value_name = "FILE", requires = "status")]
    pub extended_states: Option<PathBuf>,

    /// Translation index prefixed with its language (`de=lists/Translation-de`)
    #[arg(long = "translation", value_name = "LANG=FILE", action = clap::ArgAction::Append)]
    pub translations: Vec<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not show progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

/// Split `ARCHIVE=FILE`; a bare path is archive `local`.
pub fn split_source(arg: &str) -> (&str, &str) {
    match arg.split_once('=') {
        Some((archive, path)) if !archive.is_empty() && !archive.contains('/') => (archive, path),
        _ => ("local", arg),
    }
}

impl CacheArgs {
    pub fn load_config(&self) -> Result<Config> {
        Config::build(self.config.as_deref(), true).context("Failed to load configuration")
    }

    pub fn load_cache(&self, config: &Config) -> Result<PackageCache> {
        if self.packages.is_empty() && self.status.is_none() {
            bail!("No package sources given, use --packages or --status");
        }

        let mut errors = ErrorCollector::new();
        let mut builder = CacheBuilder::new(config);

        for arg in &self.packages {
            let (archive, path) = split_source(arg);
            builder = builder.with_index(deb822::load_packages(
                Path::new(path),
                PackageFile::repository(archive),
                &mut errors,
            ));
        }

        if let Some(status) = &self.status {
            let (file, mut entries) = deb822::load_status(status, &mut errors);
            if let Some(extended) = &self.extended_states {
                deb822::load_extended_states(extended, &mut entries, &mut errors);
            }
            builder = builder.with_status(file, entries);
        }

        for arg in &self.translations {
            let Some((language, path)) = arg.split_once('=') else {
                bail!("Translation source '{}' must look like LANG=FILE", arg);
            };
            let (file, entries) = deb822::load_translation(Path::new(path), language, &mut errors);
            builder = builder.with_translation(file, entries);
        }

        let result = builder.build(&mut errors);
        for warning in errors.warnings() {
            eprintln!("{} {}", style("W:").yellow().bold(), warning.message);
        }
        result.context("Failed to build the package cache")
    }

    /// Configuration, cache, policy and a fresh plan
    pub fn open(&self) -> Result<Session> {
        let config = self.load_config()?;
        let cache = self.load_cache(&config)?;
        let policy = Policy::new(&cache, &config);
        let depcache = DepCache::new(Arc::new(cache), policy, &config);
        let progress = ProgressBarSink::new(!self.quiet && Term::stderr().is_term());
        Ok(Session { depcache, progress })
    }
}

pub struct Session {
    pub depcache: DepCache,
    pub progress: ProgressBarSink,
}

impl Session {
    pub fn find(&self, name: &str) -> Result<PkgId> {
        self.depcache
            .cache()
            .find_package(name, None)
            .map(|p| p.id)
            .ok_or_else(|| CacheError::PackageNotFound { name: name.to_string() }.into())
    }

    /// Run the problem resolver with `protect` fixed. Problems are printed;
    /// returns whether the plan is consistent.
    pub fn resolve(&mut self, protect: &[PkgId], fix_broken: bool) -> Result<bool> {
        let mut resolver = ProblemResolver::new(&mut self.depcache);
        for &pkg in protect {
            resolver.protect(pkg);
        }

        let result = resolver.resolve(fix_broken, &mut self.progress);
        self.progress.finish();
        match result {
            Ok(()) => Ok(true),
            Err(CacheError::Unsatisfiable(problems)) => {
                report_problems(&problems);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub fn report_problems(problems: &ProblemSet) {
    eprintln!("Some packages could not be installed. The following information may help to resolve the situation:");
    eprintln!();
    eprintln!("The following packages have unmet dependencies:");
    eprintln!("{}", problems);
    if problems.hit_iteration_cap() {
        eprintln!("{} The resolver gave up before the plan settled.", style("E:").red().bold());
    }
    eprintln!("{} Unable to correct problems, you have held broken packages.", style("E:").red().bold());
}
