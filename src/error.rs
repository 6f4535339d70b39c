//! Error types for cflp2si

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading an instance, parsing a solution, or
/// configuring a search run.
///
/// Move-level infeasibility is never reported through this type (§7 of the
/// design notes): the neighborhood explorers encode it as `-1`/`None`
/// returns that are handled locally by re-drawing or advancing the
/// enumeration, not by propagating an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The instance file is malformed or violates a data invariant (e.g. a
    /// demand of 1, which cannot be split between two suppliers).
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// A dump-format or pretty-format solution string could not be parsed.
    #[error("invalid solution format: {0}")]
    InvalidSolution(String),

    /// `--method` named a runner that does not exist.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// `--init-state-strategy` named a strategy that does not exist.
    #[error("unknown initial state strategy: {0}")]
    UnknownInitStrategy(String),

    /// A required CLI argument was missing or malformed.
    #[error("parameter error: {0}")]
    Parameter(String),

    /// Wrapped I/O failure (instance file, init-state file, output file).
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Build an `InvalidInstance` error
    pub fn invalid_instance(msg: impl Into<String>) -> Self {
        Self::InvalidInstance(msg.into())
    }

    /// Build an `InvalidSolution` error
    pub fn invalid_solution(msg: impl Into<String>) -> Self {
        Self::InvalidSolution(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
