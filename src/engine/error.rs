//! Engine error taxonomy.
//!
//! Every operation returns one of these as a structured result; nothing is
//! swallowed silently except the documented no-op cases (duplicate
//! telemetry bucket, missing escalation workflow). `RateLimited` is the
//! one category where the caller is expected to retry, after backing off.

use crate::engine::requests::FieldViolation;
use crate::lifecycle::LifecycleError;
use crate::ratelimit::RateLimitExceeded;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// No actor identity was resolved for the request.
    #[error("no authenticated actor for this operation")]
    Unauthorized,

    /// The actor's role does not grant the requested operation.
    #[error("actor lacks permission for this operation")]
    Forbidden,

    /// The record does not exist — or exists outside the actor's
    /// visibility scope, which is deliberately indistinguishable.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The operation is not valid for the entity's current state.
    #[error("operation '{attempted}' not valid in state '{from}'")]
    InvalidState { from: String, attempted: String },

    /// Malformed or missing input fields, accumulated across the request.
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// Duplicate creation attempt.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Open critical failures block approval and no valid override covers
    /// them.
    #[error("{open_failures} unresolved critical failure(s) block approval")]
    CriticalFailuresBlocking { open_failures: usize },

    /// Request budget exhausted; retry after the window rolls over.
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// An alert update that neither acknowledges nor resolves.
    #[error("update would have no effect")]
    NoOpUpdate,

    /// The regulatory collaborator reported failure; recorded, not retried.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LifecycleError> for EngineError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { from, to } => Self::InvalidState {
                from,
                attempted: to,
            },
        }
    }
}

impl From<RateLimitExceeded> for EngineError {
    fn from(err: RateLimitExceeded) -> Self {
        Self::RateLimited {
            retry_after_secs: err.retry_after_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TripStatus;

    #[test]
    fn lifecycle_errors_map_to_invalid_state() {
        let err: EngineError = crate::lifecycle::ensure_transition(
            TripStatus::Submitted,
            TripStatus::Submitted,
        )
        .unwrap_err()
        .into();
        assert_eq!(
            err,
            EngineError::InvalidState {
                from: "submitted".to_string(),
                attempted: "submitted".to_string(),
            }
        );
    }

    #[test]
    fn rate_limit_carries_retry_hint() {
        let err: EngineError = RateLimitExceeded {
            limit: 100,
            window_secs: 60,
            retry_after_secs: 17,
        }
        .into();
        assert_eq!(
            err,
            EngineError::RateLimited {
                retry_after_secs: 17
            }
        );
    }

    #[test]
    fn messages_do_not_leak_scope_information() {
        let err = EngineError::NotFound { entity: "trip" };
        assert_eq!(err.to_string(), "trip not found");
    }
}
