//! The compliance engine façade.
//!
//! Thin request handlers (out of scope) construct an [`Engine`] around a
//! store and a regulatory collaborator, then invoke one operation per
//! inbound request. Every operation is a short-lived unit of work: it
//! validates the request, checks authorization, consults the lifecycle
//! table, and performs its writes through the store seam. Time is always
//! passed in by the caller.

use crate::auth::{can_always_write, can_perform, can_see, Actor, Capability, Role};
use crate::critical::{approval_gate, classify_item_change, ApprovalGate, FailureChange};
use crate::detection::DetectorConfig;
use crate::lifecycle::ensure_transition;
use crate::model::{
    ApprovalOverride, AuditEntry, CriticalFailure, MaintenanceTask, ModuleItem, ModuleStatus,
    RegulatorySubmission, RegulatoryVerdict, RiskLevel, Trip, TripId, TripModule, TripStatus,
    MODULE_TEMPLATE,
};
use crate::ratelimit::RateLimiter;
use crate::regulatory::{RegulatoryApi, RegulatoryPayload};
use crate::scoring::{aggregate_score, module_risk, risk_level, ModuleScore};
use crate::store::ComplianceStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use uuid::Uuid;

pub mod alerts;
pub mod error;
pub mod ingest;
pub mod requests;
pub mod sweep;

pub use error::EngineError;
pub use ingest::IngestOutcome;
pub use requests::{
    AlertUpdateRequest, FatigueIngestRequest, FieldViolation, ItemUpdateRequest,
    SpeedIngestRequest,
};
pub use sweep::SweepReport;

/// Result of submitting a trip for review.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitOutcome {
    pub status: TripStatus,
    pub aggregate_score: u8,
    pub risk_level: RiskLevel,
    pub has_critical_failures: bool,
}

/// Result of an approval/rejection decision.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionOutcome {
    pub status: TripStatus,
}

/// Result of an item update, reporting any failure bookkeeping.
#[derive(Clone, Debug)]
pub struct ItemUpdateOutcome {
    pub item: ModuleItem,
    pub failure_change: FailureChange,
}

/// The trip compliance and enforcement engine.
pub struct Engine<S: ComplianceStore, R: RegulatoryApi> {
    store: S,
    regulator: R,
    detector: DetectorConfig,
    limiter: RateLimiter,
}

/// Convert an accumulated boundary validation into an engine result.
fn validated(v: Validation<(), NonEmptyVec<FieldViolation>>) -> Result<(), EngineError> {
    match v {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => {
            Err(EngineError::Validation(errors.iter().cloned().collect()))
        }
    }
}

impl<S: ComplianceStore, R: RegulatoryApi> Engine<S, R> {
    pub fn new(store: S, regulator: R) -> Self {
        Self {
            store,
            regulator,
            detector: DetectorConfig::default(),
            limiter: RateLimiter::default(),
        }
    }

    pub fn with_config(
        store: S,
        regulator: R,
        detector: DetectorConfig,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            store,
            regulator,
            detector,
            limiter,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for seeding and inspection in tests and
    /// migration tooling. Engine invariants are not enforced here.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Create a draft trip seeded with the eleven-module template.
    ///
    /// Refuses a duplicate for the same driver, date, and route.
    pub fn create_trip(
        &mut self,
        actor: &Actor,
        date: NaiveDate,
        route: String,
        now: DateTime<Utc>,
    ) -> Result<Trip, EngineError> {
        if !can_perform(actor, Capability::SubmitTrip, actor.org_id) {
            return Err(EngineError::Forbidden);
        }
        if self.store.find_trip(actor.id, date, &route)?.is_some() {
            return Err(EngineError::Conflict(format!(
                "trip already exists for this driver on {date} route '{route}'"
            )));
        }

        let trip = Trip {
            id: Uuid::new_v4(),
            driver_id: actor.id,
            org_id: actor.org_id,
            date,
            route,
            status: TripStatus::Draft,
            aggregate_score: 0,
            risk_level: RiskLevel::Critical,
            critical_override: false,
        };
        self.store.insert_trip(trip.clone())?;

        for (idx, name) in MODULE_TEMPLATE.iter().enumerate() {
            self.store.insert_module(TripModule {
                id: Uuid::new_v4(),
                trip_id: trip.id,
                ordinal: idx as u8 + 1,
                name: (*name).to_string(),
                achieved_points: 0,
                max_points: 0,
                risk_level: RiskLevel::Critical,
                status: ModuleStatus::Incomplete,
            })?;
        }

        self.audit(actor, "trip.created", trip.id, now, trip.route.clone())?;
        Ok(trip)
    }

    /// Delete a trip. Permitted only while the trip is still a draft; the
    /// store cascades to modules, items, and telemetry.
    pub fn delete_trip(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let trip = self.visible_trip(trip_id, actor)?;
        if !can_perform(actor, Capability::SubmitTrip, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        self.ensure_owner_or_reviewer(actor, &trip)?;
        if trip.status != TripStatus::Draft {
            return Err(EngineError::InvalidState {
                from: trip.status.name().to_string(),
                attempted: "delete".to_string(),
            });
        }
        self.store.delete_trip(trip_id)?;
        self.audit(actor, "trip.deleted", trip_id, now, String::new())?;
        Ok(())
    }

    /// Submit a draft trip for review.
    ///
    /// Requires every template module to be present, recomputes the
    /// aggregate score and risk level, and records whether open critical
    /// failures exist. Open failures do not block submission — they block
    /// the later approval.
    pub fn submit_trip(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, EngineError> {
        let mut trip = self.visible_trip(trip_id, actor)?;
        if !can_perform(actor, Capability::SubmitTrip, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        self.ensure_owner_or_reviewer(actor, &trip)?;
        ensure_transition(trip.status, TripStatus::Submitted)?;

        let modules = self.store.modules_for_trip(trip_id)?;
        let missing: Vec<FieldViolation> = MODULE_TEMPLATE
            .iter()
            .filter(|name| !modules.iter().any(|m| m.name == **name))
            .map(|name| FieldViolation::MissingModule {
                name: (*name).to_string(),
            })
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Validation(missing));
        }

        let has_failures = self.recompute(&mut trip)?;
        trip.status = TripStatus::Submitted;
        self.store.update_trip(&trip)?;
        self.audit(
            actor,
            "trip.submitted",
            trip.id,
            now,
            format!(
                "score={} risk={} open_failures={}",
                trip.aggregate_score,
                trip.risk_level.name(),
                has_failures
            ),
        )?;

        Ok(SubmitOutcome {
            status: trip.status,
            aggregate_score: trip.aggregate_score,
            risk_level: trip.risk_level,
            has_critical_failures: has_failures,
        })
    }

    /// Approve or reject a submitted trip.
    ///
    /// Rejection has no further side effects. Approval passes through the
    /// critical-failure gate: it proceeds only with zero open failures or a
    /// valid reviewer override. Supplying `override_note` records a fresh
    /// override covering the currently open failures before the gate runs.
    pub fn decide_trip(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
        approved: bool,
        override_note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, EngineError> {
        let mut trip = self.visible_trip(trip_id, actor)?;
        if !can_perform(actor, Capability::ReviewTrip, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        let target = if approved {
            TripStatus::Approved
        } else {
            TripStatus::Rejected
        };
        ensure_transition(trip.status, target)?;

        if !approved {
            trip.status = TripStatus::Rejected;
            self.store.update_trip(&trip)?;
            self.audit(actor, "trip.rejected", trip.id, now, String::new())?;
            return Ok(DecisionOutcome {
                status: trip.status,
            });
        }

        let open = self.store.open_failures(trip_id)?;
        if let Some(note) = override_note {
            self.store.record_override(ApprovalOverride {
                id: Uuid::new_v4(),
                trip_id,
                reviewer_id: actor.id,
                note,
                issued_at: now,
                covered_failures: open.iter().map(|f| f.id).collect(),
            })?;
        }
        let latest = self.store.latest_override(trip_id)?;
        match approval_gate(&open, latest.as_ref()) {
            ApprovalGate::Clear => {}
            ApprovalGate::Blocked { open_failures } => {
                return Err(EngineError::CriticalFailuresBlocking { open_failures });
            }
        }

        trip.status = TripStatus::Approved;
        trip.critical_override = !open.is_empty();
        self.store.update_trip(&trip)?;
        self.audit(
            actor,
            "trip.approved",
            trip.id,
            now,
            format!("override={}", trip.critical_override),
        )?;
        Ok(DecisionOutcome {
            status: trip.status,
        })
    }

    /// Advance a trip along the post-decision chain.
    ///
    /// Handles `Submitted -> UnderReview` and the monotonic
    /// `Approved -> InProgress -> Completed -> PostTripCompleted ->
    /// FullyCompleted` moves. Submission and decisions have their own
    /// operations and are refused here. Reaching `PostTripCompleted`
    /// spawns maintenance follow-ups for flagged items.
    pub fn advance_trip(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
        target: TripStatus,
        now: DateTime<Utc>,
    ) -> Result<TripStatus, EngineError> {
        let mut trip = self.visible_trip(trip_id, actor)?;
        if matches!(
            target,
            TripStatus::Draft | TripStatus::Submitted | TripStatus::Approved | TripStatus::Rejected
        ) {
            return Err(EngineError::InvalidState {
                from: trip.status.name().to_string(),
                attempted: target.name().to_string(),
            });
        }
        let capability = if target == TripStatus::UnderReview {
            Capability::ReviewTrip
        } else {
            Capability::SubmitTrip
        };
        if !can_perform(actor, capability, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        if capability == Capability::SubmitTrip {
            self.ensure_owner_or_reviewer(actor, &trip)?;
        }
        ensure_transition(trip.status, target)?;

        trip.status = target;
        self.store.update_trip(&trip)?;
        if target == TripStatus::PostTripCompleted {
            self.spawn_maintenance(&trip, now)?;
        }
        self.audit(actor, "trip.advanced", trip.id, now, target.name().to_string())?;
        Ok(trip.status)
    }

    /// Update a module item's recorded value.
    ///
    /// Permitted while the trip is in a mutable state (or by an admin at
    /// any time). Critical items moving into or out of the failing value
    /// open or resolve a critical failure; the store's conditional write
    /// keeps concurrent edits from opening duplicates.
    pub fn update_item(
        &mut self,
        request: ItemUpdateRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ItemUpdateOutcome, EngineError> {
        validated(request.validate())?;

        let Some(mut item) = self.store.item(request.item_id)? else {
            return Err(EngineError::NotFound { entity: "item" });
        };
        let trip = self.visible_trip(item.trip_id, actor)?;
        if !can_perform(actor, Capability::EditTripItems, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        self.ensure_owner_or_reviewer(actor, &trip)?;
        if !trip.status.allows_mutation() && !can_always_write(actor) {
            return Err(EngineError::InvalidState {
                from: trip.status.name().to_string(),
                attempted: "update_item".to_string(),
            });
        }

        let change = classify_item_change(item.critical, &item.value, &request.new_value);
        item.value = request.new_value;
        if request.remarks.is_some() {
            item.remarks = request.remarks;
        }
        self.store.update_item(&item)?;

        let applied = match change {
            FailureChange::Opened => {
                let inserted = self.store.open_failure_if_absent(CriticalFailure {
                    id: Uuid::new_v4(),
                    trip_id: trip.id,
                    item_id: item.id,
                    opened_at: now,
                    resolved_at: None,
                    resolved_by: None,
                })?;
                if inserted {
                    FailureChange::Opened
                } else {
                    FailureChange::Unchanged
                }
            }
            FailureChange::Resolved => {
                let resolved =
                    self.store
                        .resolve_failure_for_item(trip.id, item.id, actor.id, now)?;
                if resolved {
                    FailureChange::Resolved
                } else {
                    FailureChange::Unchanged
                }
            }
            FailureChange::Unchanged => FailureChange::Unchanged,
        };

        self.audit(
            actor,
            "item.updated",
            trip.id,
            now,
            format!("item={} change={:?}", item.label, applied),
        )?;
        Ok(ItemUpdateOutcome {
            item,
            failure_change: applied,
        })
    }

    /// Recompute the trip's aggregate score and risk level in place.
    ///
    /// This is the only path that writes those fields, keeping them
    /// derivable from module scores, open failures, and escalated actions.
    pub fn recalculate_trip(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
    ) -> Result<(u8, RiskLevel), EngineError> {
        let mut trip = self.visible_trip(trip_id, actor)?;
        self.recompute(&mut trip)?;
        self.store.update_trip(&trip)?;
        Ok((trip.aggregate_score, trip.risk_level))
    }

    /// Build and file the regulatory payload for a trip.
    ///
    /// The verdict — success or failure — is persisted on the submission
    /// record. A failed verdict is surfaced as `Upstream` and is not
    /// retried here; retry policy belongs to the caller.
    pub fn submit_to_regulator(
        &mut self,
        trip_id: TripId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<RegulatorySubmission, EngineError> {
        let trip = self.visible_trip(trip_id, actor)?;
        if !can_perform(actor, Capability::SubmitRegulatory, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        if trip.status == TripStatus::Draft {
            return Err(EngineError::InvalidState {
                from: trip.status.name().to_string(),
                attempted: "submit_to_regulator".to_string(),
            });
        }

        let payload = RegulatoryPayload {
            trip_id: trip.id,
            org_id: trip.org_id,
            driver_id: trip.driver_id,
            trip_date: trip.date,
            route: trip.route.clone(),
            aggregate_score: trip.aggregate_score,
            risk_level: trip.risk_level,
            submitted_at: now,
        };
        let verdict = match self.regulator.submit(&payload) {
            Ok(reference) => RegulatoryVerdict::Accepted { reference },
            Err(err) => RegulatoryVerdict::Failed {
                error: err.to_string(),
            },
        };
        let payload_json = serde_json::to_value(&payload)
            .map_err(|e| EngineError::Upstream(format!("payload serialization failed: {e}")))?;
        let submission = RegulatorySubmission {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            payload: payload_json,
            submitted_at: now,
            verdict: verdict.clone(),
        };
        self.store.record_submission(submission.clone())?;
        self.audit(
            actor,
            "regulatory.submitted",
            trip.id,
            now,
            match &verdict {
                RegulatoryVerdict::Accepted { reference } => format!("accepted ref={reference}"),
                RegulatoryVerdict::Failed { error } => format!("failed: {error}"),
            },
        )?;

        match verdict {
            RegulatoryVerdict::Accepted { .. } => Ok(submission),
            RegulatoryVerdict::Failed { error } => Err(EngineError::Upstream(error)),
        }
    }

    // Shared internals

    /// Load a trip, reporting `NotFound` for both missing records and
    /// records outside the actor's visibility scope.
    fn visible_trip(&self, trip_id: TripId, actor: &Actor) -> Result<Trip, EngineError> {
        match self.store.trip(trip_id)? {
            Some(trip) if can_see(actor, trip.org_id) => Ok(trip),
            _ => Err(EngineError::NotFound { entity: "trip" }),
        }
    }

    /// Drivers act only on their own trips; reviewers and admins are not
    /// restricted by ownership.
    fn ensure_owner_or_reviewer(&self, actor: &Actor, trip: &Trip) -> Result<(), EngineError> {
        if actor.role == Role::Driver && trip.driver_id != actor.id {
            return Err(EngineError::Forbidden);
        }
        Ok(())
    }

    fn recompute(&mut self, trip: &mut Trip) -> Result<bool, EngineError> {
        let mut modules = self.store.modules_for_trip(trip.id)?;
        let mut scores = Vec::with_capacity(modules.len());
        for module in &mut modules {
            let score = ModuleScore {
                achieved: module.achieved_points,
                max: module.max_points,
            };
            module.risk_level = module_risk(score);
            self.store.update_module(module)?;
            scores.push(score);
        }
        let open = self.store.open_failures(trip.id)?;
        let escalated = self
            .store
            .actions_for_trip(trip.id)?
            .iter()
            .any(|a| a.severity.escalates());

        trip.aggregate_score = aggregate_score(&scores);
        trip.risk_level = risk_level(trip.aggregate_score, !open.is_empty(), escalated);
        Ok(!open.is_empty())
    }

    fn spawn_maintenance(&mut self, trip: &Trip, now: DateTime<Utc>) -> Result<(), EngineError> {
        let flagged: Vec<ModuleItem> = self
            .store
            .items_for_trip(trip.id)?
            .into_iter()
            .filter(|i| i.requires_maintenance)
            .collect();
        for item in flagged {
            self.store.insert_maintenance(MaintenanceTask {
                id: Uuid::new_v4(),
                trip_id: trip.id,
                item_id: item.id,
                description: format!("Follow-up maintenance: {}", item.label),
                scheduled_for: now.date_naive() + Duration::days(3),
                open: true,
            })?;
        }
        Ok(())
    }

    fn audit(
        &mut self,
        actor: &Actor,
        action: &str,
        trip_id: TripId,
        at: DateTime<Utc>,
        detail: String,
    ) -> Result<(), EngineError> {
        self.store.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            actor_id: actor.id,
            action: action.to_string(),
            subject: trip_id.to_string(),
            at,
            detail,
        })?;
        Ok(())
    }
}
