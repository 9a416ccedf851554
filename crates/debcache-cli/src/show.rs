//! Show command - print index records

use anyhow::{bail, Context, Result};
use clap::Args;

use debcache_core::{FileRecordSource, Records, VerId};

use crate::context::CacheArgs;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Package, optionally with a version (`foo=1.2-1`)
    #[arg(value_name = "PACKAGE", required = true)]
    pub packages: Vec<String>,

    /// Show every version instead of the candidate
    #[arg(short, long)]
    pub all_versions: bool,

    /// Prefer descriptions from this translation
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    #[command(flatten)]
    pub cache: CacheArgs,
}

/// Continuation lines get their leading space back; empty lines become ` .`
fn format_field(key: &str, value: &str) -> String {
    let mut lines = value.lines();
    let mut out = format!("{}: {}", key, lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push(' ');
        out.push_str(if line.is_empty() { "." } else { line });
    }
    out
}

pub fn execute(args: ShowArgs) -> Result<i32> {
    let session = args.cache.open()?;
    let cache = session.depcache.cache();
    let mut records = Records::new(cache.clone(), FileRecordSource);

    for arg in &args.packages {
        let (name, wanted) = match arg.split_once('=') {
            Some((name, version)) => (name, Some(version)),
            None => (arg.as_str(), None),
        };
        let pkg = session.find(name)?;

        let versions: Vec<VerId> = match wanted {
            Some(wanted) => match cache.versions_of(pkg).find(|v| v.version == wanted) {
                Some(version) => vec![version.id],
                None => bail!("Version '{}' for '{}' was not found", wanted, name),
            },
            None if args.all_versions => cache.package(pkg).versions.clone(),
            None => session
                .depcache
                .candidate(pkg)
                .or(cache.package(pkg).current)
                .into_iter()
                .collect(),
        };
        if versions.is_empty() {
            bail!("Package '{}' has no installation candidate", name);
        }

        for ver in versions {
            let version = cache.version(ver);
            let Some(location) = version.files.first() else {
                continue;
            };
            records
                .lookup_version(location)
                .with_context(|| format!("Failed to read the record of {} {}", name, version.version))?;

            let section = records.section();
            for key in section.keys() {
                if key.to_ascii_lowercase().starts_with("description") {
                    continue;
                }
                println!("{}", format_field(key, section.get(key).unwrap_or_default()));
            }

            let mut description = ("Description".to_string(), records.long_desc().ok());
            if let Some(lang) = &args.lang {
                if let Some(translated) = version.description_in(lang) {
                    records.lookup_description(translated)?;
                    description = (format!("Description-{}", lang), records.long_desc().ok());
                }
            }
            if let (key, Some(text)) = description {
                println!("{}", format_field(&key, &text));
            }
            if let Some(md5) = &version.description_md5 {
                println!("Description-md5: {}", md5);
            }
            println!();
        }
    }

    Ok(0)
}
