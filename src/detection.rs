//! Telemetry classification: speed overage bands, fatigue mapping, and the
//! deduplication bucket.
//!
//! All functions here are pure; the engine pairs them with the store's
//! conditional insert to get at-most-one violation per trip per bucket.

use crate::model::{ActionSeverity, FatigueLevel, ViolationSeverity};
use chrono::{DateTime, Utc};

/// Detector configuration.
///
/// The bucket width defaults to one minute, matching wall-clock-truncated
/// deduplication. This is a coarse heuristic, not a hard guarantee: two
/// genuine violations in quick succession collapse into one record, and
/// clock drift across samplers can still produce near-duplicates in
/// adjacent buckets.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    pub bucket_secs: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { bucket_secs: 60 }
    }
}

/// Classify a speed sample against a limit.
///
/// Returns `None` when the recorded speed does not exceed the limit.
/// Overage bands: `<= 10` minor, `<= 20` major, above that critical.
///
/// # Example
///
/// ```rust
/// use fleetguard::detection::classify_speed;
/// use fleetguard::model::ViolationSeverity;
///
/// assert_eq!(classify_speed(100.0, 100.0), None);
/// assert_eq!(classify_speed(108.0, 100.0), Some(ViolationSeverity::Minor));
/// assert_eq!(classify_speed(135.0, 100.0), Some(ViolationSeverity::Critical));
/// ```
pub fn classify_speed(recorded_kph: f64, limit_kph: f64) -> Option<ViolationSeverity> {
    let overage = recorded_kph - limit_kph;
    if overage <= 0.0 {
        None
    } else if overage <= 10.0 {
        Some(ViolationSeverity::Minor)
    } else if overage <= 20.0 {
        Some(ViolationSeverity::Major)
    } else {
        Some(ViolationSeverity::Critical)
    }
}

/// Map a fatigue alert level to the severity of the alert it raises.
pub fn fatigue_alert_severity(level: FatigueLevel) -> ActionSeverity {
    match level {
        FatigueLevel::Normal => ActionSeverity::Info,
        FatigueLevel::Warning => ActionSeverity::Warning,
        FatigueLevel::Critical => ActionSeverity::Critical,
    }
}

/// Truncate a timestamp to its deduplication bucket boundary.
///
/// Buckets are aligned to wall-clock multiples of the width, not sliding
/// windows: with the default 60 s width, `12:03:59` and `12:03:01` share a
/// bucket while `12:04:00` starts a new one.
pub fn bucket_of(timestamp: DateTime<Utc>, bucket_secs: u32) -> DateTime<Utc> {
    let width = i64::from(bucket_secs.max(1));
    let secs = timestamp.timestamp().div_euclid(width) * width;
    DateTime::from_timestamp(secs, 0).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn at_or_under_limit_is_no_violation() {
        assert_eq!(classify_speed(95.0, 100.0), None);
        assert_eq!(classify_speed(100.0, 100.0), None);
    }

    #[test]
    fn band_edges_classify_correctly() {
        assert_eq!(classify_speed(110.0, 100.0), Some(ViolationSeverity::Minor));
        assert_eq!(
            classify_speed(110.1, 100.0),
            Some(ViolationSeverity::Major)
        );
        assert_eq!(classify_speed(120.0, 100.0), Some(ViolationSeverity::Major));
        assert_eq!(
            classify_speed(120.1, 100.0),
            Some(ViolationSeverity::Critical)
        );
    }

    #[test]
    fn heavy_overage_is_critical_with_max_points() {
        let severity = classify_speed(135.0, 100.0).unwrap();
        assert_eq!(severity, ViolationSeverity::Critical);
        assert_eq!(severity.points_deducted(), 5);
    }

    #[test]
    fn fatigue_levels_map_to_alert_severities() {
        assert_eq!(
            fatigue_alert_severity(FatigueLevel::Normal),
            ActionSeverity::Info
        );
        assert_eq!(
            fatigue_alert_severity(FatigueLevel::Warning),
            ActionSeverity::Warning
        );
        assert_eq!(
            fatigue_alert_severity(FatigueLevel::Critical),
            ActionSeverity::Critical
        );
    }

    #[test]
    fn same_minute_samples_share_a_bucket() {
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 59).unwrap();
        assert_eq!(bucket_of(a, 60), bucket_of(b, 60));
    }

    #[test]
    fn next_minute_starts_a_new_bucket() {
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 12, 4, 0).unwrap();
        assert_ne!(bucket_of(a, 60), bucket_of(b, 60));
    }

    #[test]
    fn bucket_width_is_configurable() {
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 10).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 40).unwrap();
        assert_eq!(bucket_of(a, 60), bucket_of(b, 60));
        assert_ne!(bucket_of(a, 30), bucket_of(b, 30));
    }

    #[test]
    fn zero_width_falls_back_to_one_second() {
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 10).unwrap();
        assert_eq!(bucket_of(a, 0), a);
    }
}
