//! Telemetry ingestion: speed samples and fatigue samples.
//!
//! Ingestion is rate-limited per trip and deduplicated per time bucket.
//! A sample landing in an occupied bucket is a documented silent no-op,
//! not an error: high-frequency samplers simply do not flood the
//! violation log.

use super::{validated, Engine, EngineError};
use crate::auth::{can_perform, Actor, Capability};
use crate::detection::{bucket_of, classify_speed, fatigue_alert_severity};
use crate::engine::requests::{FatigueIngestRequest, SpeedIngestRequest};
use crate::model::{FatigueLevel, FatigueSample, Violation, ViolationSeverity};
use crate::regulatory::RegulatoryApi;
use crate::store::ComplianceStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl<S: ComplianceStore, R: RegulatoryApi> Engine<S, R> {
    /// Ingest one speed/GPS sample.
    ///
    /// Classifies the overage against the posted limit and records at most
    /// one violation per trip per bucket. A critical violation also raises
    /// a critical alert, which may escalate.
    pub fn ingest_speed(
        &mut self,
        request: SpeedIngestRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome, EngineError> {
        validated(request.validate())?;
        let trip = self.visible_trip(request.trip_id, actor)?;
        if !can_perform(actor, Capability::IngestTelemetry, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        self.limiter.check(trip.id, now)?;

        let sample = request.sample;
        let Some(severity) = classify_speed(sample.recorded_kph, request.limit_kph) else {
            return Ok(IngestOutcome {
                violation_created: false,
                alert_created: false,
            });
        };

        let bucket = bucket_of(sample.timestamp, self.detector.bucket_secs);
        let violation = Violation {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            recorded_kph: sample.recorded_kph,
            limit_kph: request.limit_kph,
            overage_kph: sample.recorded_kph - request.limit_kph,
            severity,
            points_deducted: severity.points_deducted(),
            bucket,
            occurred_at: sample.timestamp,
        };
        let created = self.store.insert_violation_if_vacant(violation)?;
        if !created {
            // Bucket already occupied.
            return Ok(IngestOutcome {
                violation_created: false,
                alert_created: false,
            });
        }

        self.audit(
            actor,
            "telemetry.violation",
            trip.id,
            now,
            format!(
                "recorded={} limit={} severity={:?}",
                sample.recorded_kph, request.limit_kph, severity
            ),
        )?;

        let mut alert_created = false;
        if severity == ViolationSeverity::Critical {
            self.raise_alert(
                &trip,
                crate::model::ActionSeverity::Critical,
                format!(
                    "speed {} kph exceeded limit {} kph",
                    sample.recorded_kph, request.limit_kph
                ),
                actor,
                now,
            )?;
            alert_created = true;
        }

        Ok(IngestOutcome {
            violation_created: true,
            alert_created,
        })
    }

    /// Ingest one fatigue/hours-of-service sample.
    ///
    /// The sample is always recorded; warning and critical levels raise an
    /// alert with the mapped severity. Normal-level samples raise nothing.
    pub fn ingest_fatigue(
        &mut self,
        request: FatigueIngestRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome, EngineError> {
        validated(request.validate())?;
        let trip = self.visible_trip(request.trip_id, actor)?;
        if !can_perform(actor, Capability::IngestTelemetry, trip.org_id) {
            return Err(EngineError::Forbidden);
        }
        self.limiter.check(trip.id, now)?;

        self.store.record_fatigue(FatigueSample {
            trip_id: trip.id,
            hours_driven: request.hours_driven,
            level: request.level,
            timestamp: request.timestamp,
        })?;

        let mut alert_created = false;
        if request.level != FatigueLevel::Normal {
            let severity = fatigue_alert_severity(request.level);
            self.raise_alert(
                &trip,
                severity,
                format!(
                    "fatigue level {:?} after {:.1} hours driven",
                    request.level, request.hours_driven
                ),
                actor,
                now,
            )?;
            alert_created = true;
        }

        Ok(IngestOutcome {
            violation_created: false,
            alert_created,
        })
    }
}

/// Result of one telemetry ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestOutcome {
    pub violation_created: bool,
    pub alert_created: bool,
}
