//! Telemetry samples and their classified records.

use super::trip::TripId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ViolationId = Uuid;

/// A raw GPS/speed sample as delivered by the tracking unit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpeedSample {
    pub recorded_kph: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Severity band of a speed violation, derived from overage magnitude.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Minor,
    Major,
    Critical,
}

impl ViolationSeverity {
    /// Points deducted from the trip for a violation of this severity.
    pub fn points_deducted(&self) -> u8 {
        match self {
            Self::Minor => 1,
            Self::Major => 3,
            Self::Critical => 5,
        }
    }
}

/// A recorded, classified speed violation.
///
/// At most one violation exists per trip per time bucket; the `bucket`
/// field is the sample timestamp truncated to the detector's bucket width.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    pub id: ViolationId,
    pub trip_id: TripId,
    pub recorded_kph: f64,
    pub limit_kph: f64,
    pub overage_kph: f64,
    pub severity: ViolationSeverity,
    pub points_deducted: u8,
    pub bucket: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Fatigue alert level computed by the monitoring unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    Normal,
    Warning,
    Critical,
}

/// A fatigue/hours-of-service sample for a driver on a trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FatigueSample {
    pub trip_id: TripId,
    pub hours_driven: f64,
    pub level: FatigueLevel,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_points_match_bands() {
        assert_eq!(ViolationSeverity::Minor.points_deducted(), 1);
        assert_eq!(ViolationSeverity::Major.points_deducted(), 3);
        assert_eq!(ViolationSeverity::Critical.points_deducted(), 5);
    }

    #[test]
    fn severity_orders_by_magnitude() {
        assert!(ViolationSeverity::Minor < ViolationSeverity::Major);
        assert!(ViolationSeverity::Major < ViolationSeverity::Critical);
    }

    #[test]
    fn fatigue_level_roundtrips() {
        let json = serde_json::to_string(&FatigueLevel::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        let back: FatigueLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FatigueLevel::Warning);
    }
}
