//! The plan of a [`DepCache`] as an ordered list of operations

use serde::Serialize;

use crate::cache::PkgId;
use crate::depcache::{DepCache, MarkedAction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    Install {
        package: String,
        version: String,
    },
    Upgrade {
        package: String,
        from: String,
        to: String,
    },
    Downgrade {
        package: String,
        from: String,
        to: String,
    },
    Reinstall {
        package: String,
        version: String,
    },
    Remove {
        package: String,
        version: String,
        purge: bool,
    },
}

impl Operation {
    pub fn package(&self) -> &str {
        match self {
            Operation::Install { package, .. }
            | Operation::Upgrade { package, .. }
            | Operation::Downgrade { package, .. }
            | Operation::Reinstall { package, .. }
            | Operation::Remove { package, .. } => package,
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Operation::Remove { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removals first, everything else after, each in package-name order.
    pub fn from_depcache(depcache: &DepCache) -> Self {
        let mut tx = Self::new();
        for pkg in depcache.changes(true) {
            if let Some(operation) = operation_for(depcache, pkg) {
                tx.operations.push(operation);
            }
        }
        tx.move_removals_to_front();
        tx
    }

    fn move_removals_to_front(&mut self) {
        let (mut removals, rest): (Vec<_>, Vec<_>) = self.operations.drain(..).partition(Operation::is_removal);
        removals.extend(rest);
        self.operations = removals;
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn installs(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| matches!(op, Operation::Install { .. }))
    }

    pub fn removals(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_removal())
    }
}

fn operation_for(depcache: &DepCache, pkg: PkgId) -> Option<Operation> {
    let cache = depcache.cache();
    let package = cache.fullname(pkg, true);
    let current = cache.package(pkg).current.map(|v| cache.version(v).version.clone());
    let target = depcache
        .install_version(pkg)
        .map(|v| cache.version(v).version.clone());

    let operation = match depcache.marked_action(pkg) {
        MarkedAction::Keep => return None,
        MarkedAction::Install => Operation::Install { package, version: target? },
        MarkedAction::Upgrade => Operation::Upgrade { package, from: current?, to: target? },
        MarkedAction::Downgrade => Operation::Downgrade { package, from: current?, to: target? },
        MarkedAction::ReInstall => Operation::Reinstall { package, version: target.or(current)? },
        MarkedAction::Delete => Operation::Remove { package, version: current?, purge: false },
        MarkedAction::Purge => Operation::Remove { package, version: current?, purge: true },
    };
    Some(operation)
}
