//! The persistence collaborator boundary.
//!
//! The engine never talks to a database directly; it talks to
//! [`ComplianceStore`]. The trait deliberately includes conditional-write
//! methods (`insert_violation_if_vacant`, `open_failure_if_absent`) because
//! deduplication and failure opening must be atomic per key in the backing
//! store — unique-constraint semantics, not client-side locking.

use crate::model::{
    Alert, AlertId, ApprovalOverride, AuditEntry, CriticalFailure, EnforcementAction,
    EnforcementRule, EscalationWorkflow, FatigueSample, ItemId, MaintenanceTask, ModuleItem,
    RegulatorySubmission, Trip, TripId, TripModule, Violation,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::MemoryStore;

/// Errors surfaced by store implementations.
///
/// The engine propagates these without retrying; bounded request timeouts
/// and retry policy live with the backing store and its callers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

/// Persistence operations the engine depends on.
pub trait ComplianceStore {
    // Trips
    fn insert_trip(&mut self, trip: Trip) -> Result<(), StoreError>;
    fn trip(&self, id: TripId) -> Result<Option<Trip>, StoreError>;
    fn update_trip(&mut self, trip: &Trip) -> Result<(), StoreError>;
    /// Cascade-delete a trip with its modules, items, and telemetry.
    /// Callers enforce the draft-only restriction.
    fn delete_trip(&mut self, id: TripId) -> Result<(), StoreError>;
    /// Trips past approval and not yet fully completed. `None` scopes to
    /// all organizations.
    fn active_trips(&self, org: Option<Uuid>) -> Result<Vec<Trip>, StoreError>;
    /// Look up an existing trip for the same driver, date, and route, used
    /// to refuse duplicate creation.
    fn find_trip(
        &self,
        driver: Uuid,
        date: chrono::NaiveDate,
        route: &str,
    ) -> Result<Option<Trip>, StoreError>;

    // Modules and items
    fn insert_module(&mut self, module: TripModule) -> Result<(), StoreError>;
    fn update_module(&mut self, module: &TripModule) -> Result<(), StoreError>;
    fn modules_for_trip(&self, trip: TripId) -> Result<Vec<TripModule>, StoreError>;
    fn insert_item(&mut self, item: ModuleItem) -> Result<(), StoreError>;
    fn item(&self, id: ItemId) -> Result<Option<ModuleItem>, StoreError>;
    fn update_item(&mut self, item: &ModuleItem) -> Result<(), StoreError>;
    fn items_for_trip(&self, trip: TripId) -> Result<Vec<ModuleItem>, StoreError>;

    // Critical failures
    /// Open a failure unless one is already open for the same item.
    /// Returns whether the insert happened.
    fn open_failure_if_absent(&mut self, failure: CriticalFailure) -> Result<bool, StoreError>;
    /// Resolve the single open failure for this item, if any. Returns
    /// whether a failure was resolved.
    fn resolve_failure_for_item(
        &mut self,
        trip: TripId,
        item: ItemId,
        resolver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    fn open_failures(&self, trip: TripId) -> Result<Vec<CriticalFailure>, StoreError>;

    // Approval overrides
    fn record_override(&mut self, ov: ApprovalOverride) -> Result<(), StoreError>;
    fn latest_override(&self, trip: TripId) -> Result<Option<ApprovalOverride>, StoreError>;

    // Violations and fatigue
    /// Insert unless a violation already occupies the (trip, bucket) slot.
    /// Returns whether the insert happened.
    fn insert_violation_if_vacant(&mut self, violation: Violation) -> Result<bool, StoreError>;
    fn latest_violation_since(
        &self,
        trip: TripId,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Violation>, StoreError>;
    fn record_fatigue(&mut self, sample: FatigueSample) -> Result<(), StoreError>;
    fn latest_fatigue(&self, trip: TripId) -> Result<Option<FatigueSample>, StoreError>;

    // Alerts
    fn insert_alert(&mut self, alert: Alert) -> Result<(), StoreError>;
    fn alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError>;
    fn update_alert(&mut self, alert: &Alert) -> Result<(), StoreError>;
    fn alerts_for_trip(&self, trip: TripId) -> Result<Vec<Alert>, StoreError>;
    fn unacknowledged_critical_alerts_since(
        &self,
        trip: TripId,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    // Rules and workflows
    fn insert_rule(&mut self, rule: EnforcementRule) -> Result<(), StoreError>;
    /// Active rules visible in scope: org-local rules plus global ones.
    /// `None` scopes to all organizations.
    fn active_rules(&self, org: Option<Uuid>) -> Result<Vec<EnforcementRule>, StoreError>;
    fn insert_workflow(&mut self, workflow: EscalationWorkflow) -> Result<(), StoreError>;
    fn active_workflows(&self, org: Uuid) -> Result<Vec<EscalationWorkflow>, StoreError>;

    // Actions, maintenance, audit, regulatory
    fn insert_action(&mut self, action: EnforcementAction) -> Result<(), StoreError>;
    fn actions_for_trip(&self, trip: TripId) -> Result<Vec<EnforcementAction>, StoreError>;
    fn insert_maintenance(&mut self, task: MaintenanceTask) -> Result<(), StoreError>;
    fn maintenance_for_trip(&self, trip: TripId) -> Result<Vec<MaintenanceTask>, StoreError>;
    fn append_audit(&mut self, entry: AuditEntry) -> Result<(), StoreError>;
    fn audit_for_subject(&self, subject: &str) -> Result<Vec<AuditEntry>, StoreError>;
    fn record_submission(&mut self, submission: RegulatorySubmission) -> Result<(), StoreError>;
    fn submissions_for_trip(&self, trip: TripId) -> Result<Vec<RegulatorySubmission>, StoreError>;
}
