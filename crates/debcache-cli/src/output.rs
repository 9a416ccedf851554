//! apt-style plan summaries

use anyhow::{Context, Result};
use console::style;

use debcache_core::{unit_str, DepCache, Operation, PkgId, Transaction};

const WIDTH: usize = 78;

fn print_list(title: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }

    println!("{}", title);
    let mut line = String::from(" ");
    for name in names {
        if line.len() + name.len() + 1 > WIDTH && line.len() > 1 {
            println!("{}", line);
            line = String::from(" ");
        }
        line.push(' ');
        line.push_str(name);
    }
    println!("{}", line);
}

fn names_where(depcache: &DepCache, pkgs: &[PkgId], keep: impl Fn(PkgId) -> bool) -> Vec<String> {
    pkgs.iter()
        .copied()
        .filter(|&pkg| keep(pkg))
        .map(|pkg| {
            let name = depcache.cache().fullname(pkg, true);
            if depcache.marked_purge(pkg) {
                format!("{}*", name)
            } else {
                name
            }
        })
        .collect()
}

/// Print what the plan does, or the transaction as JSON.
pub fn print_plan(depcache: &DepCache, json: bool) -> Result<()> {
    let transaction = Transaction::from_depcache(depcache);

    if json {
        let text = serde_json::to_string_pretty(&transaction).context("Failed to serialize the transaction")?;
        println!("{}", text);
        return Ok(());
    }

    let changes = depcache.changes(true);
    let held_back: Vec<PkgId> = depcache
        .cache()
        .all_packages()
        .map(|p| p.id)
        .filter(|&pkg| depcache.marked_keep(pkg) && depcache.is_upgradable(pkg))
        .collect();

    print_list("The following packages will be REMOVED:", &names_where(depcache, &changes, |p| depcache.marked_delete(p)));
    print_list("The following NEW packages will be installed:", &names_where(depcache, &changes, |p| depcache.marked_install(p)));
    print_list("The following packages have been kept back:", &names_where(depcache, &held_back, |_| true));
    print_list("The following packages will be upgraded:", &names_where(depcache, &changes, |p| depcache.marked_upgrade(p)));
    print_list("The following packages will be DOWNGRADED:", &names_where(depcache, &changes, |p| depcache.marked_downgrade(p)));
    print_list("The following packages will be REINSTALLED:", &names_where(depcache, &changes, |p| depcache.marked_reinstall(p)));

    let count = |f: &dyn Fn(PkgId) -> bool| changes.iter().filter(|&&p| f(p)).count();
    let upgraded = count(&|p| depcache.marked_upgrade(p));
    let installed = count(&|p| depcache.marked_install(p));
    let downgraded = count(&|p| depcache.marked_downgrade(p));
    let reinstalled = count(&|p| depcache.marked_reinstall(p));

    let mut summary = format!("{} upgraded, {} newly installed, ", upgraded, installed);
    if downgraded > 0 {
        summary.push_str(&format!("{} downgraded, ", downgraded));
    }
    if reinstalled > 0 {
        summary.push_str(&format!("{} reinstalled, ", reinstalled));
    }
    summary.push_str(&format!(
        "{} to remove and {} not upgraded.",
        depcache.delete_count(),
        held_back.len()
    ));
    println!("{}", summary);

    if depcache.download_size() > 0 {
        println!("Need to get {} of archives.", unit_str(depcache.download_size()));
    }
    if depcache.disk_size() != 0 {
        println!("{}", depcache.disk_space());
    }

    for operation in &transaction.operations {
        println!("{}", simulate_line(operation));
    }
    if depcache.broken_count() > 0 {
        println!(
            "{} {} broken packages remain",
            style("W:").yellow().bold(),
            depcache.broken_count()
        );
    }

    Ok(())
}

/// `apt-get -s` style line for one operation
fn simulate_line(operation: &Operation) -> String {
    match operation {
        Operation::Install { package, version } => format!("{} {} ({})", style("Inst").green(), package, version),
        Operation::Upgrade { package, from, to } | Operation::Downgrade { package, from, to } => {
            format!("{} {} [{}] ({})", style("Inst").green(), package, from, to)
        }
        Operation::Reinstall { package, version } => format!("{} {} [{}]", style("Inst").green(), package, version),
        Operation::Remove { package, version, purge } => {
            let verb = if *purge { "Purg" } else { "Remv" };
            format!("{} {} [{}]", style(verb).red(), package, version)
        }
    }
}
