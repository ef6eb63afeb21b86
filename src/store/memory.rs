//! In-memory reference implementation of the store seam.
//!
//! Backs the test suite and doubles as executable documentation of the
//! conditional-write contracts. Violation slots are keyed by
//! (trip, bucket) exactly as a unique constraint would key them.

use super::{ComplianceStore, StoreError};
use crate::model::{
    Alert, AlertId, ApprovalOverride, AuditEntry, CriticalFailure, EnforcementAction,
    EnforcementRule, EscalationWorkflow, FatigueSample, ItemId, MaintenanceTask, ModuleItem,
    RegulatorySubmission, Trip, TripId, TripModule, TripStatus, Violation,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// HashMap-backed store.
#[derive(Default)]
pub struct MemoryStore {
    trips: HashMap<TripId, Trip>,
    modules: HashMap<TripId, Vec<TripModule>>,
    items: HashMap<ItemId, ModuleItem>,
    failures: Vec<CriticalFailure>,
    overrides: Vec<ApprovalOverride>,
    violations: HashMap<(TripId, i64), Violation>,
    fatigue: Vec<FatigueSample>,
    alerts: HashMap<AlertId, Alert>,
    rules: Vec<EnforcementRule>,
    workflows: Vec<EscalationWorkflow>,
    actions: Vec<EnforcementAction>,
    maintenance: Vec<MaintenanceTask>,
    audit: Vec<AuditEntry>,
    submissions: Vec<RegulatorySubmission>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total violation count across all trips, for tests.
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

impl ComplianceStore for MemoryStore {
    fn insert_trip(&mut self, trip: Trip) -> Result<(), StoreError> {
        self.trips.insert(trip.id, trip);
        Ok(())
    }

    fn trip(&self, id: TripId) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.get(&id).cloned())
    }

    fn update_trip(&mut self, trip: &Trip) -> Result<(), StoreError> {
        self.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    fn delete_trip(&mut self, id: TripId) -> Result<(), StoreError> {
        self.trips.remove(&id);
        self.modules.remove(&id);
        self.items.retain(|_, item| item.trip_id != id);
        self.failures.retain(|f| f.trip_id != id);
        self.violations.retain(|(trip, _), _| *trip != id);
        self.fatigue.retain(|s| s.trip_id != id);
        self.alerts.retain(|_, a| a.trip_id != id);
        Ok(())
    }

    fn active_trips(&self, org: Option<Uuid>) -> Result<Vec<Trip>, StoreError> {
        Ok(self
            .trips
            .values()
            .filter(|t| {
                matches!(
                    t.status,
                    TripStatus::Approved
                        | TripStatus::InProgress
                        | TripStatus::Completed
                        | TripStatus::PostTripCompleted
                )
            })
            .filter(|t| org.is_none_or(|o| t.org_id == o))
            .cloned()
            .collect())
    }

    fn find_trip(
        &self,
        driver: Uuid,
        date: chrono::NaiveDate,
        route: &str,
    ) -> Result<Option<Trip>, StoreError> {
        Ok(self
            .trips
            .values()
            .find(|t| t.driver_id == driver && t.date == date && t.route == route)
            .cloned())
    }

    fn insert_module(&mut self, module: TripModule) -> Result<(), StoreError> {
        self.modules.entry(module.trip_id).or_default().push(module);
        Ok(())
    }

    fn update_module(&mut self, module: &TripModule) -> Result<(), StoreError> {
        if let Some(modules) = self.modules.get_mut(&module.trip_id) {
            if let Some(slot) = modules.iter_mut().find(|m| m.id == module.id) {
                *slot = module.clone();
            }
        }
        Ok(())
    }

    fn modules_for_trip(&self, trip: TripId) -> Result<Vec<TripModule>, StoreError> {
        let mut modules = self.modules.get(&trip).cloned().unwrap_or_default();
        modules.sort_by_key(|m| m.ordinal);
        Ok(modules)
    }

    fn insert_item(&mut self, item: ModuleItem) -> Result<(), StoreError> {
        self.items.insert(item.id, item);
        Ok(())
    }

    fn item(&self, id: ItemId) -> Result<Option<ModuleItem>, StoreError> {
        Ok(self.items.get(&id).cloned())
    }

    fn update_item(&mut self, item: &ModuleItem) -> Result<(), StoreError> {
        self.items.insert(item.id, item.clone());
        Ok(())
    }

    fn items_for_trip(&self, trip: TripId) -> Result<Vec<ModuleItem>, StoreError> {
        Ok(self
            .items
            .values()
            .filter(|i| i.trip_id == trip)
            .cloned()
            .collect())
    }

    fn open_failure_if_absent(&mut self, failure: CriticalFailure) -> Result<bool, StoreError> {
        let occupied = self
            .failures
            .iter()
            .any(|f| f.item_id == failure.item_id && f.trip_id == failure.trip_id && f.is_open());
        if occupied {
            return Ok(false);
        }
        self.failures.push(failure);
        Ok(true)
    }

    fn resolve_failure_for_item(
        &mut self,
        trip: TripId,
        item: ItemId,
        resolver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self
            .failures
            .iter_mut()
            .find(|f| f.trip_id == trip && f.item_id == item && f.is_open())
        {
            Some(failure) => {
                failure.resolved_at = Some(at);
                failure.resolved_by = Some(resolver);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn open_failures(&self, trip: TripId) -> Result<Vec<CriticalFailure>, StoreError> {
        Ok(self
            .failures
            .iter()
            .filter(|f| f.trip_id == trip && f.is_open())
            .cloned()
            .collect())
    }

    fn record_override(&mut self, ov: ApprovalOverride) -> Result<(), StoreError> {
        self.overrides.push(ov);
        Ok(())
    }

    fn latest_override(&self, trip: TripId) -> Result<Option<ApprovalOverride>, StoreError> {
        Ok(self
            .overrides
            .iter()
            .filter(|o| o.trip_id == trip)
            .max_by_key(|o| o.issued_at)
            .cloned())
    }

    fn insert_violation_if_vacant(&mut self, violation: Violation) -> Result<bool, StoreError> {
        let key = (violation.trip_id, violation.bucket.timestamp());
        if self.violations.contains_key(&key) {
            return Ok(false);
        }
        self.violations.insert(key, violation);
        Ok(true)
    }

    fn latest_violation_since(
        &self,
        trip: TripId,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Violation>, StoreError> {
        Ok(self
            .violations
            .values()
            .filter(|v| v.trip_id == trip && v.occurred_at >= cutoff)
            .max_by_key(|v| v.occurred_at)
            .cloned())
    }

    fn record_fatigue(&mut self, sample: FatigueSample) -> Result<(), StoreError> {
        self.fatigue.push(sample);
        Ok(())
    }

    fn latest_fatigue(&self, trip: TripId) -> Result<Option<FatigueSample>, StoreError> {
        Ok(self
            .fatigue
            .iter()
            .filter(|s| s.trip_id == trip)
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    fn insert_alert(&mut self, alert: Alert) -> Result<(), StoreError> {
        self.alerts.insert(alert.id, alert);
        Ok(())
    }

    fn alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts.get(&id).cloned())
    }

    fn update_alert(&mut self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    fn alerts_for_trip(&self, trip: TripId) -> Result<Vec<Alert>, StoreError> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .values()
            .filter(|a| a.trip_id == trip)
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at);
        Ok(alerts)
    }

    fn unacknowledged_critical_alerts_since(
        &self,
        trip: TripId,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        Ok(self
            .alerts
            .values()
            .filter(|a| {
                a.trip_id == trip
                    && a.severity.escalates()
                    && !a.is_acknowledged()
                    && a.created_at >= cutoff
            })
            .count())
    }

    fn insert_rule(&mut self, rule: EnforcementRule) -> Result<(), StoreError> {
        self.rules.push(rule);
        Ok(())
    }

    fn active_rules(&self, org: Option<Uuid>) -> Result<Vec<EnforcementRule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.active)
            .filter(|r| match (org, r.org_id) {
                (Some(scope), Some(rule_org)) => scope == rule_org,
                _ => true,
            })
            .cloned()
            .collect())
    }

    fn insert_workflow(&mut self, workflow: EscalationWorkflow) -> Result<(), StoreError> {
        self.workflows.push(workflow);
        Ok(())
    }

    fn active_workflows(&self, org: Uuid) -> Result<Vec<EscalationWorkflow>, StoreError> {
        Ok(self
            .workflows
            .iter()
            .filter(|w| w.active && w.org_id == org)
            .cloned()
            .collect())
    }

    fn insert_action(&mut self, action: EnforcementAction) -> Result<(), StoreError> {
        self.actions.push(action);
        Ok(())
    }

    fn actions_for_trip(&self, trip: TripId) -> Result<Vec<EnforcementAction>, StoreError> {
        Ok(self
            .actions
            .iter()
            .filter(|a| a.trip_id == trip)
            .cloned()
            .collect())
    }

    fn insert_maintenance(&mut self, task: MaintenanceTask) -> Result<(), StoreError> {
        self.maintenance.push(task);
        Ok(())
    }

    fn maintenance_for_trip(&self, trip: TripId) -> Result<Vec<MaintenanceTask>, StoreError> {
        Ok(self
            .maintenance
            .iter()
            .filter(|t| t.trip_id == trip)
            .cloned()
            .collect())
    }

    fn append_audit(&mut self, entry: AuditEntry) -> Result<(), StoreError> {
        self.audit.push(entry);
        Ok(())
    }

    fn audit_for_subject(&self, subject: &str) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .audit
            .iter()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect())
    }

    fn record_submission(&mut self, submission: RegulatorySubmission) -> Result<(), StoreError> {
        self.submissions.push(submission);
        Ok(())
    }

    fn submissions_for_trip(&self, trip: TripId) -> Result<Vec<RegulatorySubmission>, StoreError> {
        Ok(self
            .submissions
            .iter()
            .filter(|s| s.trip_id == trip)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViolationSeverity;

    fn violation(trip: TripId, bucket_secs: i64) -> Violation {
        let bucket = DateTime::from_timestamp(bucket_secs, 0).unwrap();
        Violation {
            id: Uuid::new_v4(),
            trip_id: trip,
            recorded_kph: 112.0,
            limit_kph: 100.0,
            overage_kph: 12.0,
            severity: ViolationSeverity::Major,
            points_deducted: 3,
            bucket,
            occurred_at: bucket,
        }
    }

    #[test]
    fn violation_slot_admits_one_record_per_bucket() {
        let mut store = MemoryStore::new();
        let trip = Uuid::new_v4();
        assert!(store.insert_violation_if_vacant(violation(trip, 600)).unwrap());
        assert!(!store.insert_violation_if_vacant(violation(trip, 600)).unwrap());
        assert!(store.insert_violation_if_vacant(violation(trip, 660)).unwrap());
        assert_eq!(store.violation_count(), 2);
    }

    #[test]
    fn different_trips_do_not_share_buckets() {
        let mut store = MemoryStore::new();
        assert!(store
            .insert_violation_if_vacant(violation(Uuid::new_v4(), 600))
            .unwrap());
        assert!(store
            .insert_violation_if_vacant(violation(Uuid::new_v4(), 600))
            .unwrap());
    }

    #[test]
    fn open_failure_guard_rejects_second_open() {
        let mut store = MemoryStore::new();
        let trip = Uuid::new_v4();
        let item = Uuid::new_v4();
        let failure = CriticalFailure {
            id: Uuid::new_v4(),
            trip_id: trip,
            item_id: item,
            opened_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        let mut second = failure.clone();
        second.id = Uuid::new_v4();

        assert!(store.open_failure_if_absent(failure).unwrap());
        assert!(!store.open_failure_if_absent(second).unwrap());
        assert_eq!(store.open_failures(trip).unwrap().len(), 1);
    }

    #[test]
    fn resolving_reopens_the_slot() {
        let mut store = MemoryStore::new();
        let trip = Uuid::new_v4();
        let item = Uuid::new_v4();
        let failure = CriticalFailure {
            id: Uuid::new_v4(),
            trip_id: trip,
            item_id: item,
            opened_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        store.open_failure_if_absent(failure.clone()).unwrap();
        assert!(store
            .resolve_failure_for_item(trip, item, Uuid::new_v4(), Utc::now())
            .unwrap());
        assert!(store.open_failures(trip).unwrap().is_empty());

        let mut reopened = failure;
        reopened.id = Uuid::new_v4();
        assert!(store.open_failure_if_absent(reopened).unwrap());
    }

    #[test]
    fn resolve_without_open_failure_reports_false() {
        let mut store = MemoryStore::new();
        assert!(!store
            .resolve_failure_for_item(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Utc::now())
            .unwrap());
    }

    #[test]
    fn active_rules_include_globals_in_org_scope() {
        let mut store = MemoryStore::new();
        let org = Uuid::new_v4();
        store
            .insert_rule(EnforcementRule {
                id: Uuid::new_v4(),
                org_id: Some(org),
                kind: crate::model::RuleKind::SpeedLimit,
                threshold: 100.0,
                unit: "kph".to_string(),
                action_label: "notify".to_string(),
                active: true,
                route_filter: None,
            })
            .unwrap();
        store
            .insert_rule(EnforcementRule {
                id: Uuid::new_v4(),
                org_id: None,
                kind: crate::model::RuleKind::HoursOfService,
                threshold: 11.0,
                unit: "hours".to_string(),
                action_label: "rest".to_string(),
                active: true,
                route_filter: None,
            })
            .unwrap();
        store
            .insert_rule(EnforcementRule {
                id: Uuid::new_v4(),
                org_id: Some(Uuid::new_v4()),
                kind: crate::model::RuleKind::SpeedLimit,
                threshold: 90.0,
                unit: "kph".to_string(),
                action_label: "notify".to_string(),
                active: true,
                route_filter: None,
            })
            .unwrap();

        assert_eq!(store.active_rules(Some(org)).unwrap().len(), 2);
        assert_eq!(store.active_rules(None).unwrap().len(), 3);
    }

    #[test]
    fn latest_violation_respects_cutoff() {
        let mut store = MemoryStore::new();
        let trip = Uuid::new_v4();
        store.insert_violation_if_vacant(violation(trip, 600)).unwrap();
        store.insert_violation_if_vacant(violation(trip, 1200)).unwrap();

        let cutoff = DateTime::from_timestamp(900, 0).unwrap();
        let latest = store.latest_violation_since(trip, cutoff).unwrap().unwrap();
        assert_eq!(latest.occurred_at.timestamp(), 1200);

        let far_cutoff = DateTime::from_timestamp(2000, 0).unwrap();
        assert!(store.latest_violation_since(trip, far_cutoff).unwrap().is_none());
    }

    #[test]
    fn delete_trip_cascades() {
        let mut store = MemoryStore::new();
        let trip = Uuid::new_v4();
        store.insert_violation_if_vacant(violation(trip, 600)).unwrap();
        store
            .record_fatigue(FatigueSample {
                trip_id: trip,
                hours_driven: 4.0,
                level: crate::model::FatigueLevel::Normal,
                timestamp: Utc::now(),
            })
            .unwrap();
        store.delete_trip(trip).unwrap();
        assert_eq!(store.violation_count(), 0);
        assert!(store.latest_fatigue(trip).unwrap().is_none());
    }
}
