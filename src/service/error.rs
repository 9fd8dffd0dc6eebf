//! Errors surfaced by the request orchestrator.

use thiserror::Error;

use crate::cache::CacheError;
use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before any engine work.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Cache(CacheError),

    #[error(transparent)]
    Engine(EngineError),

    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The engine host is down; every request fails until restart.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Cache(CacheError::HostUnavailable(_)) | Self::Engine(EngineError::HostInit(_))
        )
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Cancelled => Self::Cancelled,
            other => Self::Cache(other),
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Cancelled => Self::Cancelled,
            other => Self::Engine(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_collapses() {
        assert!(matches!(ServiceError::from(CacheError::Cancelled), ServiceError::Cancelled));
        assert!(matches!(ServiceError::from(EngineError::Cancelled), ServiceError::Cancelled));
    }

    #[test]
    fn host_failures_are_unavailable() {
        assert!(ServiceError::from(CacheError::HostUnavailable("abi".into())).is_unavailable());
        assert!(ServiceError::from(EngineError::HostInit("abi".into())).is_unavailable());
        let construction = CacheError::Construction {
            key: "a.rs".into(),
            reason: "too many failures".into(),
        };
        assert!(!ServiceError::from(construction).is_unavailable());
        assert!(!ServiceError::validation("bad").is_unavailable());
    }

    #[test]
    fn messages() {
        assert_eq!(
            ServiceError::validation("position -1 is negative").to_string(),
            "invalid request: position -1 is negative"
        );
        assert_eq!(
            ServiceError::from(EngineError::internal("boom")).to_string(),
            "engine failure: boom"
        );
    }
}
