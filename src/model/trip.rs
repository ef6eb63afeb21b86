//! Trip, inspection module, and item entities.
//!
//! A trip is one end-to-end inspection/journey record. Its status only
//! changes through the lifecycle state machine; its aggregate score and
//! risk level are only written by the recomputation path in the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier aliases. All entities are keyed by UUIDs minted at creation.
pub type TripId = Uuid;
pub type ModuleId = Uuid;
pub type ItemId = Uuid;

/// Sentinel value a critical item records when it fails inspection.
pub const FAIL_VALUE: &str = "fail";

/// Lifecycle states of a trip.
///
/// The happy path runs `Draft` through `FullyCompleted`; `Rejected` is the
/// only other terminal state. Module and item data may only be edited while
/// the trip is in `Draft` or `UnderReview` (admins excepted).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    InProgress,
    Completed,
    PostTripCompleted,
    FullyCompleted,
}

impl TripStatus {
    /// Get the status name for display/auditing.
    pub fn name(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::PostTripCompleted => "post_trip_completed",
            Self::FullyCompleted => "fully_completed",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FullyCompleted | Self::Rejected)
    }

    /// Check if module/item data may be mutated in this state.
    ///
    /// Only `Draft` and `UnderReview` permit edits; the admin role bypasses
    /// this check at the authorization layer.
    pub fn allows_mutation(&self) -> bool {
        matches!(self, Self::Draft | Self::UnderReview)
    }
}

/// Banded risk classification derived from score and open failures.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn name(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One end-to-end fleet inspection/journey record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub driver_id: Uuid,
    pub org_id: Uuid,
    pub date: NaiveDate,
    pub route: String,
    pub status: TripStatus,
    /// Aggregate percentage score in [0, 100], written only on recomputation.
    pub aggregate_score: u8,
    pub risk_level: RiskLevel,
    /// Set when approval was granted over open critical failures.
    pub critical_override: bool,
}

/// Completion status of one inspection module.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Incomplete,
    Complete,
    Failed,
}

/// One step of the inspection template.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripModule {
    pub id: ModuleId,
    pub trip_id: TripId,
    /// Position of this step within the inspection, 1-based.
    pub ordinal: u8,
    pub name: String,
    pub achieved_points: u32,
    pub max_points: u32,
    pub risk_level: RiskLevel,
    pub status: ModuleStatus,
}

/// Input field type of a module item.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Checkbox,
    Text,
    Number,
    Select,
}

/// A single inspectable item within a module.
///
/// Writing [`FAIL_VALUE`] to a `critical` item opens a critical failure;
/// writing anything else resolves the open failure for that item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: ItemId,
    pub module_id: ModuleId,
    pub trip_id: TripId,
    pub label: String,
    pub field_type: FieldType,
    pub critical: bool,
    pub weight: u32,
    pub value: String,
    pub remarks: Option<String>,
    /// Flagged items spawn maintenance follow-ups at post-trip completion.
    pub requires_maintenance: bool,
}

impl ModuleItem {
    /// Check if the recorded value is the failing sentinel.
    pub fn is_failing(&self) -> bool {
        self.value == FAIL_VALUE
    }
}

/// Static inspection template consumed by trip initialization.
///
/// Each new trip is seeded with these eleven modules in order. Ad hoc
/// modules may still be added afterwards.
pub const MODULE_TEMPLATE: [&str; 11] = [
    "Health & Fitness",
    "Documentation",
    "Vehicle Exterior",
    "Tires & Wheels",
    "Engine Compartment",
    "Brakes",
    "Lights & Signals",
    "Coupling & Trailer",
    "Cab & Safety Equipment",
    "Cargo Securement",
    "Emergency Equipment",
];
