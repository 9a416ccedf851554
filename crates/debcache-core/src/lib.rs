pub mod cache;
pub mod collector;
pub mod config;
pub mod depcache;
pub mod error;
pub mod index;
pub mod policy;
pub mod progress;
pub mod records;
pub mod resolver;
pub mod sort;
pub mod tagfile;
pub mod transaction;
pub mod util;

pub use cache::{
    CacheBuilder, DepId, DepType, Dependency, FileId, Package, PackageCache, PackageFile, PkgId, PriorityClass,
    Provide, PrvId, Selection, VerId, Version,
};
pub use collector::{Diagnostic, ErrorCollector, Severity};
pub use config::{Config, Pin, ReleaseSelector};
pub use depcache::{ActionGroup, DepCache, MarkedAction, Mode, Snapshot, StateCache, Upgrade};
pub use error::{CacheError, Result};
pub use policy::Policy;
pub use progress::{NoProgress, Phase, ProgressBarSink, ProgressSink};
pub use records::{FileRecordSource, HashType, MemoryRecordSource, RecordField, RecordSource, Records};
pub use resolver::{Problem, ProblemKind, ProblemResolver, ProblemSet};
pub use sort::{Filter, PackageSort};
pub use transaction::{Operation, Transaction};
pub use util::{format_bytes, unit_str, DiskSpace};
