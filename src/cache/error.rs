//! Context cache error types.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The analysis host could not start. Every later lookup fails the same way.
    #[error("analysis host unavailable: {0}")]
    HostUnavailable(String),

    /// Building the context for one key failed. Other keys are unaffected.
    #[error("context for [{key}] could not be built: {reason}")]
    Construction { key: String, reason: String },

    #[error("context build cancelled")]
    Cancelled,
}

pub type CacheResult<T> = Result<T, CacheError>;
