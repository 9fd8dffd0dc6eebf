//! Error types for the analysis engine contract.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine host could not start. Nothing will work until it is fixed.
    #[error("engine host failed to initialize: {0}")]
    HostInit(String),

    /// A single reference could not be loaded. Callers usually skip it.
    #[error("failed to load reference '{reference}': {reason}")]
    ReferenceLoad { reference: String, reason: String },

    /// The engine hit something it did not expect while serving one request.
    #[error("engine failure: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HostInit(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
