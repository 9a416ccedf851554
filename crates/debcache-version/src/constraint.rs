use std::fmt;
use std::str::FromStr;

use crate::comparator::cmp_versions;
use crate::operator::Operator;
use crate::version::VersionError;

/// The parenthesised part of a relation such as `libc6 (>= 2.34)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    pub op: Operator,
    pub version: String,
}

impl VersionConstraint {
    pub fn new(op: Operator, version: impl Into<String>) -> Self {
        Self { op, version: version.into() }
    }

    /// Whether `version` satisfies this constraint
    pub fn satisfied_by(&self, version: &str) -> bool {
        self.op.matches(cmp_versions(version, &self.version))
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    /// Parse `>= 1.0`, `>=1.0` or `(>= 1.0)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('(').trim_end_matches(')').trim();
        let split = s
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
            .unwrap_or(s.len());
        let (op, version) = s.split_at(split);
        let op: Operator = op.parse()?;
        let version = version.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }
        Ok(Self::new(op, version))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let c: VersionConstraint = "(>= 1.0)".parse().unwrap();
        assert_eq!(c, VersionConstraint::new(Operator::GreaterThanOrEqual, "1.0"));
        let c: VersionConstraint = "<<2:1".parse().unwrap();
        assert_eq!(c.op, Operator::LessThan);
        assert_eq!(c.version, "2:1");
    }

    #[test]
    fn test_parse_missing_version() {
        assert_eq!(">=".parse::<VersionConstraint>(), Err(VersionError::Empty));
        assert!("~ 1.0".parse::<VersionConstraint>().is_err());
    }

    #[test]
    fn test_satisfied_by() {
        let c = VersionConstraint::new(Operator::GreaterThanOrEqual, "1.0");
        assert!(c.satisfied_by("1.0"));
        assert!(c.satisfied_by("1.0-3"));
        assert!(!c.satisfied_by("1.0~rc1"));
        let c = VersionConstraint::new(Operator::LessThan, "2.0");
        assert!(c.satisfied_by("1.99"));
        assert!(!c.satisfied_by("2.0"));
    }

    #[test]
    fn test_display() {
        let c = VersionConstraint::new(Operator::Equal, "1.2-1");
        assert_eq!(c.to_string(), "= 1.2-1");
    }
}
