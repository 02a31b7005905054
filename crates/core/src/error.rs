use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the core crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure reading or writing settings and logs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Settings file could not be (de)serialized.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Why a filter text could not be turned into a predicate, or why one
/// evaluation of a predicate failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The text is not a valid expression.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The engine failed while preparing the predicate.
    #[error("filter engine failure: {0}")]
    Engine(String),

    /// The predicate raised while matching one item.
    #[error("failed to match item: {0}")]
    Evaluate(String),
}
