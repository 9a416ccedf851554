//! Configuration for building and resolving a cache
//!
//! Configuration is an explicit value threaded into [`CacheBuilder`](crate::CacheBuilder),
//! [`Policy`](crate::Policy) and [`DepCache`](crate::DepCache). It can be loaded from a
//! JSON file and overridden from the environment.
//!
//! # Configuration Sources (in priority order, highest to lowest)
//!
//! 1. Environment variables (`DEBCACHE_*`)
//! 2. JSON configuration file
//! 3. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use debcache_core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::build(Some(Path::new("/etc/debcache.json")), true).unwrap();
//! println!("Native architecture: {}", config.architecture);
//! ```

mod config;
mod pin;

pub use config::Config;
pub use pin::{Pin, ReleaseSelector};
