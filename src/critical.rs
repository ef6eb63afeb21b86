//! Critical failure tracking and the approval override gate.
//!
//! The pure half of the tracker lives here: classifying an item edit into
//! open/resolve/no-change, and deciding whether the current open-failure
//! set permits approval. The conditional writes that make open/resolve
//! atomic per item are the store's responsibility.

use crate::model::{ApprovalOverride, CriticalFailure, FAIL_VALUE};

/// Outcome of applying a value change to an item.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FailureChange {
    /// A new critical failure must be opened.
    Opened,
    /// The open failure for this item must be resolved.
    Resolved,
    /// No failure bookkeeping required.
    Unchanged,
}

/// Classify an item value change.
///
/// Only critical items participate. A transition into the failing sentinel
/// opens a failure; a transition out of it resolves the single open failure
/// for that item. Re-writing the same value either way changes nothing.
pub fn classify_item_change(critical: bool, previous: &str, new: &str) -> FailureChange {
    if !critical {
        return FailureChange::Unchanged;
    }
    let was_failing = previous == FAIL_VALUE;
    let now_failing = new == FAIL_VALUE;
    match (was_failing, now_failing) {
        (false, true) => FailureChange::Opened,
        (true, false) => FailureChange::Resolved,
        _ => FailureChange::Unchanged,
    }
}

/// Result of the approval gate check.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ApprovalGate {
    /// Approval may proceed.
    Clear,
    /// Open failures block approval and no valid override covers them.
    Blocked { open_failures: usize },
}

/// Decide whether the trip may be approved.
///
/// Approval is clear when no failures are open, or when a recorded override
/// still covers every currently open failure. An override issued before a
/// new failure opened does not cover it, so the new failure re-blocks
/// approval until a fresh override is recorded.
pub fn approval_gate(open: &[CriticalFailure], latest: Option<&ApprovalOverride>) -> ApprovalGate {
    if open.is_empty() {
        return ApprovalGate::Clear;
    }
    if let Some(ov) = latest {
        let covered = open.iter().all(|f| ov.covered_failures.contains(&f.id));
        if covered {
            return ApprovalGate::Clear;
        }
    }
    ApprovalGate::Blocked {
        open_failures: open.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn failure() -> CriticalFailure {
        CriticalFailure {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            opened_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        }
    }

    fn override_covering(failures: &[CriticalFailure]) -> ApprovalOverride {
        ApprovalOverride {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            note: "Inspected on site, brake wear within tolerance".to_string(),
            issued_at: Utc::now(),
            covered_failures: failures.iter().map(|f| f.id).collect(),
        }
    }

    #[test]
    fn non_critical_items_never_open_failures() {
        assert_eq!(
            classify_item_change(false, "pass", FAIL_VALUE),
            FailureChange::Unchanged
        );
    }

    #[test]
    fn fail_transition_opens_and_reverting_resolves() {
        assert_eq!(
            classify_item_change(true, "pass", FAIL_VALUE),
            FailureChange::Opened
        );
        assert_eq!(
            classify_item_change(true, FAIL_VALUE, "pass"),
            FailureChange::Resolved
        );
    }

    #[test]
    fn rewriting_same_value_changes_nothing() {
        assert_eq!(
            classify_item_change(true, FAIL_VALUE, FAIL_VALUE),
            FailureChange::Unchanged
        );
        assert_eq!(
            classify_item_change(true, "pass", "ok"),
            FailureChange::Unchanged
        );
    }

    #[test]
    fn gate_is_clear_without_open_failures() {
        assert_eq!(approval_gate(&[], None), ApprovalGate::Clear);
    }

    #[test]
    fn open_failure_blocks_without_override() {
        let open = vec![failure()];
        assert_eq!(
            approval_gate(&open, None),
            ApprovalGate::Blocked { open_failures: 1 }
        );
    }

    #[test]
    fn covering_override_clears_the_gate() {
        let open = vec![failure(), failure()];
        let ov = override_covering(&open);
        assert_eq!(approval_gate(&open, Some(&ov)), ApprovalGate::Clear);
    }

    #[test]
    fn new_failure_invalidates_earlier_override() {
        let mut open = vec![failure()];
        let ov = override_covering(&open);
        open.push(failure());
        assert_eq!(
            approval_gate(&open, Some(&ov)),
            ApprovalGate::Blocked { open_failures: 2 }
        );
    }
}
