//! Alert creation, acknowledgment, resolution, and timed escalation.

use super::{Engine, EngineError};
use crate::auth::{can_perform, can_see, Actor, Capability};
use crate::engine::requests::AlertUpdateRequest;
use crate::model::{ActionSeverity, Alert, EnforcementAction, Trip};
use crate::regulatory::RegulatoryApi;
use crate::store::ComplianceStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl<S: ComplianceStore, R: RegulatoryApi> Engine<S, R> {
    /// Acknowledge and/or resolve an alert.
    ///
    /// Both flags are idempotent: acknowledging an already-acknowledged
    /// alert changes nothing. A request setting neither flag fails with
    /// `NoOpUpdate`.
    pub fn update_alert(
        &mut self,
        request: AlertUpdateRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Alert, EngineError> {
        if !request.acknowledge && !request.resolve {
            return Err(EngineError::NoOpUpdate);
        }
        let Some(mut alert) = self.store.alert(request.alert_id)? else {
            return Err(EngineError::NotFound { entity: "alert" });
        };
        if !can_see(actor, alert.org_id) {
            return Err(EngineError::NotFound { entity: "alert" });
        }
        if !can_perform(actor, Capability::ManageAlerts, alert.org_id) {
            return Err(EngineError::Forbidden);
        }

        let mut changed = Vec::new();
        if request.acknowledge && !alert.is_acknowledged() {
            alert.acknowledged_at = Some(now);
            alert.acknowledged_by = Some(actor.id);
            changed.push("acknowledged");
        }
        if request.resolve && !alert.is_resolved() {
            alert.resolved_at = Some(now);
            alert.resolved_by = Some(actor.id);
            changed.push("resolved");
        }
        if !changed.is_empty() {
            self.store.update_alert(&alert)?;
            self.audit(actor, "alert.updated", alert.trip_id, now, changed.join(","))?;
        }
        Ok(alert)
    }

    /// Create an alert against a trip and escalate if its severity calls
    /// for it.
    ///
    /// Escalation looks up the organization's active workflow matching the
    /// severity and records an escalation enforcement action plus an audit
    /// entry. No matching workflow is not an error: the alert stands and
    /// escalation is simply skipped.
    pub(crate) fn raise_alert(
        &mut self,
        trip: &Trip,
        severity: ActionSeverity,
        message: String,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Alert, EngineError> {
        let alert = Alert {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            org_id: trip.org_id,
            severity,
            message,
            created_at: now,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
        };
        self.store.insert_alert(alert.clone())?;
        self.audit(
            actor,
            "alert.created",
            trip.id,
            now,
            format!("severity={:?}", severity),
        )?;

        if severity.escalates() {
            let workflows = self.store.active_workflows(trip.org_id)?;
            if let Some(workflow) = workflows.iter().find(|w| w.matches(severity)) {
                self.store.insert_action(EnforcementAction {
                    id: Uuid::new_v4(),
                    trip_id: trip.id,
                    rule_id: None,
                    severity,
                    automated: true,
                    executed_at: now,
                    result: format!(
                        "escalated alert {} to {}",
                        alert.id,
                        workflow.targets.join(", ")
                    ),
                })?;
                self.audit(
                    actor,
                    "alert.escalated",
                    trip.id,
                    now,
                    format!("workflow={}", workflow.id),
                )?;
            }
        }
        Ok(alert)
    }
}
