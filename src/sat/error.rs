//! Error types shared by the formula model, the I/O helpers and the solver.

use std::time::Duration;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, reading or solving a formula.
#[derive(Debug, Error)]
pub enum Error {
    /// A literal string had no variable name or contained a reserved symbol.
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),

    /// A variable name was looked up that the registry has never seen.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A signed-integer literal referred to an id outside the registry.
    #[error("variable id {0} is not registered")]
    UnregisteredId(i64),

    /// A DIMACS line could not be understood.
    #[error("DIMACS line {line}: {message}")]
    Dimacs {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Infix formula text could not be parsed.
    #[error("formula text, token {position}: {message}")]
    Syntax {
        /// Zero-based token index.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A random formula was requested with more literals per clause than
    /// there are variables.
    #[error("cannot draw {k} distinct variables out of {n}")]
    Generator {
        /// Number of variables.
        n: usize,
        /// Literals per clause.
        k: usize,
    },

    /// The search exceeded its wall-clock budget.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// The branching policy found nothing to branch on.
    #[error("branching policy returned no candidate variable")]
    NoCandidate,

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the search budget running out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
