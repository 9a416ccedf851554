use std::fmt;

use crate::cache::PkgId;

/// Why a package is still broken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemKind {
    /// A conflict where one side is protected
    ProtectedConflict { with: String },
    /// No alternative of a dependency group could be installed
    MissingDependency { dependency: String },
    Conflict { with: String },
    /// The resolver was still changing marks when it ran out of passes
    IterationCap { passes: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub pkg: PkgId,
    /// Display name of the package
    pub package: String,
    pub kind: ProblemKind,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProblemKind::ProtectedConflict { with } => {
                write!(f, " {} : Conflicts with {}, and neither can be changed", self.package, with)
            }
            ProblemKind::MissingDependency { dependency } => {
                write!(f, " {} : {} but it is not going to be installed", self.package, dependency)
            }
            ProblemKind::Conflict { with } => write!(f, " {} : Conflicts with {}", self.package, with),
            ProblemKind::IterationCap { passes } => {
                write!(f, " {} : still broken after {} resolver passes", self.package, passes)
            }
        }
    }
}

/// Problems left after resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

impl ProblemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: Problem) {
        if !self.problems.contains(&problem) {
            self.problems.push(problem);
        }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Packages named by at least one problem, in order of first mention
    pub fn packages(&self) -> Vec<PkgId> {
        let mut seen = Vec::new();
        for problem in &self.problems {
            if !seen.contains(&problem.pkg) {
                seen.push(problem.pkg);
            }
        }
        seen
    }

    pub fn hit_iteration_cap(&self) -> bool {
        self.problems
            .iter()
            .any(|p| matches!(p.kind, ProblemKind::IterationCap { .. }))
    }

    pub fn has_protected_conflict(&self) -> bool {
        self.problems
            .iter()
            .any(|p| matches!(p.kind, ProblemKind::ProtectedConflict { .. }))
    }
}

impl fmt::Display for ProblemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.problems.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}
