//! Debian version handling
//!
//! Parsing and ordering of Debian package versions (`[epoch:]upstream[-revision]`),
//! the relation operators used in `Depends`-style fields, and constraint matching.

mod comparator;
mod constraint;
mod operator;
mod version;

pub use comparator::{cmp_versions, Comparator};
pub use constraint::VersionConstraint;
pub use operator::Operator;
pub use version::{Version, VersionError};
