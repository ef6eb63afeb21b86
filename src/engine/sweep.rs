//! The enforcement rule sweep.
//!
//! A sweep is a batch, read-mostly pass: it snapshots the active rules and
//! trips in scope, evaluates each rule against each applicable trip, and
//! emits at most one enforcement action per rule per trip. One trip's
//! evaluation error never aborts the batch; it is counted and skipped.

use super::{Engine, EngineError};
use crate::auth::{can_perform, Actor, Capability, Role};
use crate::detection::fatigue_alert_severity;
use crate::model::{
    ActionSeverity, EnforcementAction, EnforcementRule, RuleKind, Trip, ViolationSeverity,
};
use crate::regulatory::RegulatoryApi;
use crate::store::ComplianceStore;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Aggregate counts reported by one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rules_checked: usize,
    pub actions_triggered: usize,
    pub critical_actions: usize,
    /// Trips whose evaluation failed and was skipped.
    pub evaluation_errors: usize,
}

/// Map a violation severity onto the action it triggers.
fn inherited_severity(severity: ViolationSeverity) -> ActionSeverity {
    match severity {
        ViolationSeverity::Minor => ActionSeverity::Info,
        ViolationSeverity::Major => ActionSeverity::Warning,
        ViolationSeverity::Critical => ActionSeverity::Critical,
    }
}

impl<S: ComplianceStore, R: RegulatoryApi> Engine<S, R> {
    /// Evaluate every active rule against every active trip in scope.
    ///
    /// Supervisors sweep their own organization; admins sweep all of them.
    pub fn run_sweep(
        &mut self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, EngineError> {
        if !can_perform(actor, Capability::RunSweep, actor.org_id) {
            return Err(EngineError::Forbidden);
        }
        let scope = if actor.role == Role::Admin {
            None
        } else {
            Some(actor.org_id)
        };

        let rules = self.store.active_rules(scope)?;
        let trips = self.store.active_trips(scope)?;

        let mut report = SweepReport {
            rules_checked: rules.len(),
            ..SweepReport::default()
        };

        for rule in &rules {
            for trip in &trips {
                if !rule.applies_to(trip.org_id, &trip.route) {
                    continue;
                }
                match self.evaluate_rule(rule, trip, now) {
                    Ok(Some((severity, result))) => {
                        self.store.insert_action(EnforcementAction {
                            id: Uuid::new_v4(),
                            trip_id: trip.id,
                            rule_id: Some(rule.id),
                            severity,
                            automated: true,
                            executed_at: now,
                            result,
                        })?;
                        report.actions_triggered += 1;
                        if severity.escalates() {
                            report.critical_actions += 1;
                        }
                    }
                    Ok(None) => {}
                    Err(_) => {
                        report.evaluation_errors += 1;
                    }
                }
            }
        }

        self.audit(
            actor,
            "sweep.completed",
            Uuid::nil(),
            now,
            format!(
                "rules={} actions={} critical={} errors={}",
                report.rules_checked,
                report.actions_triggered,
                report.critical_actions,
                report.evaluation_errors
            ),
        )?;
        Ok(report)
    }

    /// Dispatch one rule against one trip.
    ///
    /// Returns the severity and result text of the action to record, or
    /// `None` when the rule does not trigger.
    fn evaluate_rule(
        &self,
        rule: &EnforcementRule,
        trip: &Trip,
        now: DateTime<Utc>,
    ) -> Result<Option<(ActionSeverity, String)>, EngineError> {
        match rule.kind {
            RuleKind::SpeedLimit => {
                let cutoff = now - Duration::hours(1);
                let Some(violation) = self.store.latest_violation_since(trip.id, cutoff)? else {
                    return Ok(None);
                };
                if violation.recorded_kph > rule.threshold {
                    Ok(Some((
                        inherited_severity(violation.severity),
                        format!(
                            "{}: speed {} {} over threshold {}",
                            rule.action_label, violation.recorded_kph, rule.unit, rule.threshold
                        ),
                    )))
                } else {
                    Ok(None)
                }
            }
            RuleKind::HoursOfService => {
                let Some(sample) = self.store.latest_fatigue(trip.id)? else {
                    return Ok(None);
                };
                if sample.hours_driven > rule.threshold {
                    Ok(Some((
                        fatigue_alert_severity(sample.level),
                        format!(
                            "{}: {:.1} {} driven over threshold {}",
                            rule.action_label, sample.hours_driven, rule.unit, rule.threshold
                        ),
                    )))
                } else {
                    Ok(None)
                }
            }
            RuleKind::CriticalAlerts => {
                let cutoff = now - Duration::minutes(30);
                let count = self
                    .store
                    .unacknowledged_critical_alerts_since(trip.id, cutoff)?;
                if count as f64 >= rule.threshold {
                    Ok(Some((
                        ActionSeverity::Critical,
                        format!(
                            "{}: {} unacknowledged critical alert(s) in the last 30 minutes",
                            rule.action_label, count
                        ),
                    )))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
