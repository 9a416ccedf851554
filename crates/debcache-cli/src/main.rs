mod context;
mod install;
mod list;
mod output;
mod policy;
mod remove;
mod show;
mod upgrade;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "debcache")]
#[command(about = "Inspect Debian package indexes and simulate apt transactions")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show priorities and the candidate of packages
    Policy(policy::PolicyArgs),

    /// Show the index record of a package
    Show(show::ShowArgs),

    /// Simulate installing packages
    Install(install::InstallArgs),

    /// Simulate removing packages
    Remove(remove::RemoveArgs),

    /// Simulate upgrading installed packages
    Upgrade(upgrade::UpgradeArgs),

    /// List packages matching filters
    List(list::ListArgs),
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("DEBCACHE_LOG")
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logger(args.verbose);

    match args.command {
        Commands::Policy(args) => policy::execute(args),
        Commands::Show(args) => show::execute(args),
        Commands::Install(args) => install::execute(args),
        Commands::Remove(args) => remove::execute(args),
        Commands::Upgrade(args) => upgrade::execute(args),
        Commands::List(args) => list::execute(args),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::from(100)
        }
    }
}
