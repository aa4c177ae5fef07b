use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the candela workspace.
///
/// This wraps input validation failures, unknown dataset references, numeric
/// computation failures, and bad caller-supplied arguments. Every public
/// operation in the workspace returns either a success payload or one of
/// these variants; nothing escapes as a panic.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandelaError {
    /// The input dataset is malformed (empty, unparsable timestamps, missing
    /// required fields).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The supplied dataset reference does not resolve to a cached snapshot.
    #[error("unknown dataset reference: {id}")]
    UnknownReference {
        /// Textual form of the reference that failed to resolve.
        id: String,
    },

    /// A derived quantity is undefined for this input (frequency median,
    /// return variance, a column with no observed value).
    #[error("computation failed: {0}")]
    Computation(String),

    /// Invalid caller-supplied argument (e.g. a non-positive grid step).
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl CandelaError {
    /// Helper: build a `Validation` error from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Helper: build an `UnknownReference` error from a reference's textual form.
    pub fn unknown_reference(id: impl Into<String>) -> Self {
        Self::UnknownReference { id: id.into() }
    }

    /// Helper: build a `Computation` error from any message.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    /// Helper: build an `InvalidArg` error from any message.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }
}
