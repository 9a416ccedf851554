use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use super::pin::Pin;
use crate::error::{CacheError, Result};

/// Cache, policy and resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Native architecture; `all` packages are registered under it
    pub architecture: String,

    /// Additional architectures, searched after the native one
    pub foreign_architectures: Vec<String>,

    /// Archive or codename whose files get priority 990
    pub default_release: Option<String>,

    /// Preferences, first match wins
    pub pins: Vec<Pin>,

    /// Follow Recommends when auto-installing dependencies
    pub install_recommends: bool,

    /// Let automatic changes touch packages on hold
    pub ignore_hold: bool,

    /// Number of full passes the problem resolver makes before giving up
    pub resolver_max_passes: u32,

    /// Recursion bound for auto-installing dependencies
    pub max_auto_install_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            architecture: "amd64".to_string(),
            foreign_architectures: Vec::new(),
            default_release: None,
            pins: Vec::new(),
            install_recommends: false,
            ignore_hold: false,
            resolver_max_passes: 10,
            max_auto_install_depth: 100,
        }
    }
}

impl Config {
    /// Build configuration from defaults, an optional JSON file and, when
    /// `use_environment` is set, `DEBCACHE_*` variables.
    pub fn build(path: Option<&Path>, use_environment: bool) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if use_environment {
            config.apply_env();
        }

        Ok(config)
    }

    /// Load configuration from a JSON file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CacheError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_json_str(&contents)
            .map_err(|e| CacheError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(contents)?;
        if config.architecture.is_empty() {
            return Err(CacheError::Config("architecture must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Apply `DEBCACHE_ARCH`, `DEBCACHE_DEFAULT_RELEASE` and
    /// `DEBCACHE_INSTALL_RECOMMENDS` overrides.
    pub fn apply_env(&mut self) {
        if let Some(arch) = get_env("DEBCACHE_ARCH") {
            self.architecture = arch;
        }
        if let Some(release) = get_env("DEBCACHE_DEFAULT_RELEASE") {
            self.default_release = Some(release);
        }
        if let Some(value) = get_env("DEBCACHE_INSTALL_RECOMMENDS") {
            self.install_recommends = parse_bool(&value);
        }
    }

    /// Architectures in lookup order, native first.
    pub fn architectures(&self) -> Vec<String> {
        let mut archs = vec![self.architecture.clone()];
        for arch in &self.foreign_architectures {
            if !archs.contains(arch) {
                archs.push(arch.clone());
            }
        }
        archs
    }
}

fn get_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
