//! The trip lifecycle state machine.
//!
//! Valid transitions are a fixed table; everything else fails with
//! [`LifecycleError::InvalidTransition`] and leaves the trip untouched.
//! The engine consults this module before performing any side effects, so
//! a refused transition never produces partial writes.

use crate::model::TripStatus;
use thiserror::Error;

/// Errors raised by transition validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LifecycleError {
    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },
}

/// Target states reachable from each source state.
///
/// `Submitted` may be decided directly or parked in `UnderReview` first;
/// both review states accept the same decision outcomes. The post-approval
/// chain is strictly monotonic.
pub fn transitions_from(status: TripStatus) -> &'static [TripStatus] {
    match status {
        TripStatus::Draft => &[TripStatus::Submitted],
        TripStatus::Submitted => &[
            TripStatus::UnderReview,
            TripStatus::Approved,
            TripStatus::Rejected,
        ],
        TripStatus::UnderReview => &[TripStatus::Approved, TripStatus::Rejected],
        TripStatus::Approved => &[TripStatus::InProgress],
        TripStatus::InProgress => &[TripStatus::Completed],
        TripStatus::Completed => &[TripStatus::PostTripCompleted],
        TripStatus::PostTripCompleted => &[TripStatus::FullyCompleted],
        TripStatus::Rejected | TripStatus::FullyCompleted => &[],
    }
}

/// Validate a single transition, returning an error describing the refused
/// move otherwise.
pub fn ensure_transition(from: TripStatus, to: TripStatus) -> Result<(), LifecycleError> {
    if transitions_from(from).contains(&to) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_permitted_in_order() {
        let path = [
            TripStatus::Draft,
            TripStatus::Submitted,
            TripStatus::UnderReview,
            TripStatus::Approved,
            TripStatus::InProgress,
            TripStatus::Completed,
            TripStatus::PostTripCompleted,
            TripStatus::FullyCompleted,
        ];
        for pair in path.windows(2) {
            assert!(ensure_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn submitted_may_be_decided_directly() {
        assert!(ensure_transition(TripStatus::Submitted, TripStatus::Approved).is_ok());
        assert!(ensure_transition(TripStatus::Submitted, TripStatus::Rejected).is_ok());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(transitions_from(TripStatus::Rejected).is_empty());
        assert!(transitions_from(TripStatus::FullyCompleted).is_empty());
    }

    #[test]
    fn double_submission_is_refused() {
        let err = ensure_transition(TripStatus::Submitted, TripStatus::Submitted).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: "submitted".to_string(),
                to: "submitted".to_string(),
            }
        );
    }

    #[test]
    fn post_trip_chain_is_monotonic() {
        assert!(ensure_transition(TripStatus::Completed, TripStatus::InProgress).is_err());
        assert!(ensure_transition(TripStatus::PostTripCompleted, TripStatus::Completed).is_err());
        assert!(ensure_transition(TripStatus::FullyCompleted, TripStatus::Draft).is_err());
    }

    #[test]
    fn skipping_review_states_is_refused() {
        assert!(ensure_transition(TripStatus::Draft, TripStatus::Approved).is_err());
        assert!(ensure_transition(TripStatus::Approved, TripStatus::Completed).is_err());
    }
}
