use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::VersionError;

/// Relation operators as written in dependency fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (=)
    Equal,
    /// Strictly less than (<<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Strictly greater than (>>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Not equal (!=)
    NotEqual,
}

impl Operator {
    /// Get the relation-field representation of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::LessThan => "<<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">>",
            Operator::GreaterThanOrEqual => ">=",
            Operator::NotEqual => "!=",
        }
    }

    /// Whether `candidate <op> target` holds, given `candidate.cmp(target)`.
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
            Operator::NotEqual => ordering != Ordering::Equal,
        }
    }

    /// Get all supported operator spellings
    pub fn supported_operators() -> &'static [&'static str] {
        &["<<", "<=", "=", ">=", ">>", "!=", "<", ">"]
    }
}

impl FromStr for Operator {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Equal),
            "<<" => Ok(Operator::LessThan),
            // `<` and `>` are the obsolete spellings of `<=` and `>=`
            "<=" | "<" => Ok(Operator::LessThanOrEqual),
            ">>" => Ok(Operator::GreaterThan),
            ">=" | ">" => Ok(Operator::GreaterThanOrEqual),
            "!=" => Ok(Operator::NotEqual),
            _ => Err(VersionError::UnknownOperator { operator: s.to_string() }),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
