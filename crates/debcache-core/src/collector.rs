//! Caller-owned queue of warnings and errors raised while loading indexes
//! and building the cache.
//!
//! Nothing in this crate keeps a global error state. Functions that can
//! partially succeed take `&mut ErrorCollector` and push entries instead of
//! failing; the caller decides when to turn pending errors into a failure
//! with [`ErrorCollector::raise_pending`].

use std::fmt;

use crate::error::{CacheError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "W: {}", self.message),
            Severity::Error => write!(f, "E: {}", self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct ErrorCollector {
    entries: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(Diagnostic { severity: Severity::Warning, message });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.entries.push(Diagnostic { severity: Severity::Error, message });
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Take every pending entry, warnings included.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    /// Turn pending errors into a single [`CacheError::Backend`].
    ///
    /// Error entries are removed from the queue; warnings stay queryable.
    pub fn raise_pending(&mut self) -> Result<()> {
        if !self.has_errors() {
            return Ok(());
        }

        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|d| d.severity == Severity::Error);
        self.entries = warnings;

        Err(CacheError::Backend {
            messages: errors.into_iter().map(|d| d.message).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_raise() {
        let mut errors = ErrorCollector::new();
        errors.warning("optional source unavailable");
        assert!(errors.raise_pending().is_ok());
        assert_eq!(errors.warnings().count(), 1);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let mut errors = ErrorCollector::new();
        errors.error("first");
        errors.warning("kept");
        errors.error("second");

        match errors.raise_pending() {
            Err(CacheError::Backend { messages }) => assert_eq!(messages, vec!["first", "second"]),
            other => panic!("unexpected result: {:?}", other),
        }

        // warnings survive, errors are consumed
        assert!(!errors.has_errors());
        assert_eq!(errors.pending().count(), 1);
        assert!(errors.raise_pending().is_ok());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic { severity: Severity::Error, message: "boom".into() };
        assert_eq!(d.to_string(), "E: boom");
    }
}
