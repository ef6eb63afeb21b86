//! Enforcement rules, actions, alerts, and the records surrounding them.

use super::trip::{ItemId, TripId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RuleId = Uuid;
pub type ActionId = Uuid;
pub type AlertId = Uuid;
pub type FailureId = Uuid;
pub type WorkflowId = Uuid;

/// Dispatch type of an enforcement rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    SpeedLimit,
    HoursOfService,
    CriticalAlerts,
}

/// A configured threshold-based policy evaluated against live trips.
///
/// `org_id` of `None` marks a global rule, which only the admin role may
/// define; global rules apply across organizations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnforcementRule {
    pub id: RuleId,
    pub org_id: Option<Uuid>,
    pub kind: RuleKind,
    pub threshold: f64,
    pub unit: String,
    pub action_label: String,
    pub active: bool,
    /// Restricts the rule to trips on a matching route when set.
    pub route_filter: Option<String>,
}

impl EnforcementRule {
    /// Check whether this rule applies to a trip in the given org on the
    /// given route.
    pub fn applies_to(&self, trip_org: Uuid, route: &str) -> bool {
        if let Some(org) = self.org_id {
            if org != trip_org {
                return false;
            }
        }
        match &self.route_filter {
            Some(filter) => filter == route,
            None => true,
        }
    }
}

/// Severity of an enforcement action or alert.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSeverity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl ActionSeverity {
    /// Check if this severity triggers alert escalation.
    pub fn escalates(&self) -> bool {
        matches!(self, Self::Critical | Self::Emergency)
    }
}

/// An action produced by rule evaluation or a manual trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnforcementAction {
    pub id: ActionId,
    pub trip_id: TripId,
    pub rule_id: Option<RuleId>,
    pub severity: ActionSeverity,
    pub automated: bool,
    pub executed_at: DateTime<Utc>,
    pub result: String,
}

/// An alert raised against a trip.
///
/// Acknowledgment and resolution are independent flags; setting either one
/// twice is a no-op, not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub trip_id: TripId,
    pub org_id: Uuid,
    pub severity: ActionSeverity,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl Alert {
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}

/// Ordered notification/timing policy for critical events within an org.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationWorkflow {
    pub id: WorkflowId,
    pub org_id: Uuid,
    /// Minimum alert severity that triggers this workflow.
    pub min_severity: ActionSeverity,
    /// Minutes between successive escalation notifications.
    pub interval_minutes: Vec<u32>,
    pub targets: Vec<String>,
    pub active: bool,
}

impl EscalationWorkflow {
    /// Check whether an alert of the given severity triggers this workflow.
    pub fn matches(&self, severity: ActionSeverity) -> bool {
        self.active && severity >= self.min_severity
    }
}

/// An open or resolved critical item failure on a trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CriticalFailure {
    pub id: FailureId,
    pub trip_id: TripId,
    pub item_id: ItemId,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl CriticalFailure {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// A reviewer-signed override permitting approval over open failures.
///
/// The override captures the failure ids it was issued against; a failure
/// opened afterwards falls outside that set and re-blocks approval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalOverride {
    pub id: Uuid,
    pub trip_id: TripId,
    pub reviewer_id: Uuid,
    pub note: String,
    pub issued_at: DateTime<Utc>,
    pub covered_failures: Vec<FailureId>,
}

/// Maintenance follow-up spawned at post-trip completion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: Uuid,
    pub trip_id: TripId,
    pub item_id: ItemId,
    pub description: String,
    pub scheduled_for: NaiveDate,
    pub open: bool,
}

/// One line of the audit trail appended on every state change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub subject: String,
    pub at: DateTime<Utc>,
    pub detail: String,
}

/// Verdict returned by the regulatory collaborator, persisted verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RegulatoryVerdict {
    Accepted { reference: String },
    Failed { error: String },
}

/// A recorded submission to the regulatory collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegulatorySubmission {
    pub id: Uuid,
    pub trip_id: TripId,
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
    pub verdict: RegulatoryVerdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_rule_applies_only_within_org() {
        let org = Uuid::new_v4();
        let rule = EnforcementRule {
            id: Uuid::new_v4(),
            org_id: Some(org),
            kind: RuleKind::SpeedLimit,
            threshold: 100.0,
            unit: "kph".to_string(),
            action_label: "notify_supervisor".to_string(),
            active: true,
            route_filter: None,
        };
        assert!(rule.applies_to(org, "R1"));
        assert!(!rule.applies_to(Uuid::new_v4(), "R1"));
    }

    #[test]
    fn global_rule_applies_across_orgs() {
        let rule = EnforcementRule {
            id: Uuid::new_v4(),
            org_id: None,
            kind: RuleKind::HoursOfService,
            threshold: 11.0,
            unit: "hours".to_string(),
            action_label: "force_rest".to_string(),
            active: true,
            route_filter: None,
        };
        assert!(rule.applies_to(Uuid::new_v4(), "R1"));
        assert!(rule.applies_to(Uuid::new_v4(), "R2"));
    }

    #[test]
    fn route_filter_restricts_rule() {
        let org = Uuid::new_v4();
        let rule = EnforcementRule {
            id: Uuid::new_v4(),
            org_id: Some(org),
            kind: RuleKind::SpeedLimit,
            threshold: 80.0,
            unit: "kph".to_string(),
            action_label: "notify".to_string(),
            active: true,
            route_filter: Some("mountain-pass".to_string()),
        };
        assert!(rule.applies_to(org, "mountain-pass"));
        assert!(!rule.applies_to(org, "highway-7"));
    }

    #[test]
    fn only_critical_and_emergency_escalate() {
        assert!(!ActionSeverity::Info.escalates());
        assert!(!ActionSeverity::Warning.escalates());
        assert!(ActionSeverity::Critical.escalates());
        assert!(ActionSeverity::Emergency.escalates());
    }

    #[test]
    fn workflow_matches_at_or_above_min_severity() {
        let workflow = EscalationWorkflow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            min_severity: ActionSeverity::Critical,
            interval_minutes: vec![5, 15, 30],
            targets: vec!["ops-oncall".to_string()],
            active: true,
        };
        assert!(workflow.matches(ActionSeverity::Critical));
        assert!(workflow.matches(ActionSeverity::Emergency));
        assert!(!workflow.matches(ActionSeverity::Warning));
    }

    #[test]
    fn inactive_workflow_never_matches() {
        let workflow = EscalationWorkflow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            min_severity: ActionSeverity::Info,
            interval_minutes: vec![10],
            targets: vec![],
            active: false,
        };
        assert!(!workflow.matches(ActionSeverity::Emergency));
    }

    #[test]
    fn verdict_roundtrips_through_json() {
        let verdict = RegulatoryVerdict::Accepted {
            reference: "REF-2041".to_string(),
        };
        let json = serde_json::to_string(&verdict).unwrap();
        let back: RegulatoryVerdict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, verdict);
    }
}
