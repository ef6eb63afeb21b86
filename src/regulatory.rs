//! The regulatory submission collaborator seam.
//!
//! The real regulator lives outside this crate. The engine builds the
//! payload, calls the injected [`RegulatoryApi`], and persists whichever
//! verdict comes back. It never retries on its own; retry policy belongs
//! to the caller.

use crate::model::{RiskLevel, TripId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Snapshot of a trip submitted for regulatory filing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegulatoryPayload {
    pub trip_id: TripId,
    pub org_id: Uuid,
    pub driver_id: Uuid,
    pub trip_date: NaiveDate,
    pub route: String,
    pub aggregate_score: u8,
    pub risk_level: RiskLevel,
    pub submitted_at: DateTime<Utc>,
}

/// Failure reported by the regulatory collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegulatoryError {
    /// The regulator received the payload and rejected it.
    #[error("regulator rejected submission: {0}")]
    Rejected(String),

    /// The regulator could not be reached.
    #[error("regulator unreachable: {0}")]
    Unreachable(String),
}

/// Injected regulatory collaborator.
///
/// Implementations return the regulator's reference number on success.
/// Test implementations can script verdicts, so the engine's
/// error-recording path is exercised deterministically.
pub trait RegulatoryApi {
    fn submit(&self, payload: &RegulatoryPayload) -> Result<String, RegulatoryError>;
}
