//! Typed request bodies, validated at the boundary.
//!
//! Each operation takes an explicit request struct instead of a loose
//! field bag. Validation uses Stillwater's `Validation` to accumulate ALL
//! field problems in one pass, so a caller fixing a malformed request sees
//! every problem at once instead of one per round trip.

use crate::model::{AlertId, FatigueLevel, ItemId, SpeedSample, TripId};
use chrono::{DateTime, Utc};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// One field-level problem with a request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldViolation {
    #[error("required field '{field}' is missing or empty")]
    MissingField { field: &'static str },

    #[error("field '{field}' out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },

    #[error("required inspection module '{name}' is missing")]
    MissingModule { name: String },
}

fn check(ok: bool, violation: FieldViolation) -> Validation<(), NonEmptyVec<FieldViolation>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

/// Request to update a module item's recorded value.
#[derive(Clone, Debug)]
pub struct ItemUpdateRequest {
    pub item_id: ItemId,
    pub new_value: String,
    pub remarks: Option<String>,
}

impl ItemUpdateRequest {
    pub fn validate(&self) -> Validation<(), NonEmptyVec<FieldViolation>> {
        let checks = vec![check(
            !self.new_value.trim().is_empty(),
            FieldViolation::MissingField { field: "new_value" },
        )];
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Request to ingest one speed/GPS sample against a posted limit.
#[derive(Clone, Debug)]
pub struct SpeedIngestRequest {
    pub trip_id: TripId,
    pub sample: SpeedSample,
    pub limit_kph: f64,
}

impl SpeedIngestRequest {
    pub fn validate(&self) -> Validation<(), NonEmptyVec<FieldViolation>> {
        let s = &self.sample;
        let checks = vec![
            check(
                s.recorded_kph.is_finite() && s.recorded_kph >= 0.0,
                FieldViolation::OutOfRange {
                    field: "recorded_kph",
                    detail: format!("{} is not a plausible speed", s.recorded_kph),
                },
            ),
            check(
                self.limit_kph.is_finite() && self.limit_kph > 0.0,
                FieldViolation::OutOfRange {
                    field: "limit_kph",
                    detail: format!("{} is not a plausible limit", self.limit_kph),
                },
            ),
            check(
                (-90.0..=90.0).contains(&s.latitude),
                FieldViolation::OutOfRange {
                    field: "latitude",
                    detail: format!("{} outside [-90, 90]", s.latitude),
                },
            ),
            check(
                (-180.0..=180.0).contains(&s.longitude),
                FieldViolation::OutOfRange {
                    field: "longitude",
                    detail: format!("{} outside [-180, 180]", s.longitude),
                },
            ),
        ];
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Request to ingest one fatigue/hours-of-service sample.
#[derive(Clone, Debug)]
pub struct FatigueIngestRequest {
    pub trip_id: TripId,
    pub hours_driven: f64,
    pub level: FatigueLevel,
    pub timestamp: DateTime<Utc>,
}

impl FatigueIngestRequest {
    pub fn validate(&self) -> Validation<(), NonEmptyVec<FieldViolation>> {
        let checks = vec![check(
            self.hours_driven.is_finite() && (0.0..=24.0).contains(&self.hours_driven),
            FieldViolation::OutOfRange {
                field: "hours_driven",
                detail: format!("{} outside [0, 24]", self.hours_driven),
            },
        )];
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Request to acknowledge and/or resolve an alert.
///
/// Setting neither flag is rejected by the engine as `NoOpUpdate`.
#[derive(Clone, Copy, Debug)]
pub struct AlertUpdateRequest {
    pub alert_id: AlertId,
    pub acknowledge: bool,
    pub resolve: bool,
}
