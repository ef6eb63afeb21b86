//! Weighted trip score aggregation and risk banding.
//!
//! Both functions here are pure and referentially transparent: identical
//! inputs always yield identical output, which is what makes score
//! recomputation on submission safely idempotent.

use crate::model::RiskLevel;
use serde::{Deserialize, Serialize};

/// Achieved and maximum points for one inspection module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleScore {
    pub achieved: u32,
    pub max: u32,
}

/// Aggregate module scores into a percentage in [0, 100].
///
/// Computed as `round(100 * sum(achieved) / sum(max))`. A total max of
/// zero yields 0 rather than dividing by zero.
///
/// # Example
///
/// ```rust
/// use fleetguard::scoring::{aggregate_score, ModuleScore};
///
/// let scores = [
///     ModuleScore { achieved: 80, max: 90 },
///     ModuleScore { achieved: 90, max: 90 },
/// ];
/// assert_eq!(aggregate_score(&scores), 94);
/// assert_eq!(aggregate_score(&[]), 0);
/// ```
pub fn aggregate_score(scores: &[ModuleScore]) -> u8 {
    let achieved: u64 = scores.iter().map(|s| u64::from(s.achieved)).sum();
    let max: u64 = scores.iter().map(|s| u64::from(s.max)).sum();
    if max == 0 {
        return 0;
    }
    let pct = (100.0 * achieved as f64 / max as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Derive the risk level from an aggregate score and the trip's open
/// failure/action state.
///
/// Score bands: `>= 90` low, `75..=89` medium, `50..=74` high, `< 50`
/// critical. Any open critical failure or critical/emergency enforcement
/// action forces `Critical` regardless of score.
///
/// # Example
///
/// ```rust
/// use fleetguard::model::RiskLevel;
/// use fleetguard::scoring::risk_level;
///
/// assert_eq!(risk_level(94, false, false), RiskLevel::Low);
/// assert_eq!(risk_level(94, true, false), RiskLevel::Critical);
/// assert_eq!(risk_level(60, false, false), RiskLevel::High);
/// ```
pub fn risk_level(score: u8, open_critical_failures: bool, escalated_actions: bool) -> RiskLevel {
    if open_critical_failures || escalated_actions {
        return RiskLevel::Critical;
    }
    match score {
        90..=100 => RiskLevel::Low,
        75..=89 => RiskLevel::Medium,
        50..=74 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

/// Derive a per-module risk level from its own score fraction.
///
/// Uses the same bands as the aggregate, against the module's achieved/max
/// ratio. A module with zero max points reads as critical risk.
pub fn module_risk(score: ModuleScore) -> RiskLevel {
    risk_level(aggregate_score(&[score]), false, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_module_aggregate_rounds_to_94() {
        let scores = [
            ModuleScore {
                achieved: 80,
                max: 90,
            },
            ModuleScore {
                achieved: 90,
                max: 90,
            },
        ];
        // round(100 * 170 / 180)
        assert_eq!(aggregate_score(&scores), 94);
        assert_eq!(risk_level(94, false, false), RiskLevel::Low);
    }

    #[test]
    fn zero_max_points_yields_zero_not_panic() {
        let scores = [
            ModuleScore { achieved: 0, max: 0 },
            ModuleScore { achieved: 5, max: 0 },
        ];
        assert_eq!(aggregate_score(&scores), 0);
        assert_eq!(aggregate_score(&[]), 0);
    }

    #[test]
    fn perfect_scores_reach_exactly_100() {
        let scores = [ModuleScore {
            achieved: 90,
            max: 90,
        }];
        assert_eq!(aggregate_score(&scores), 100);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let scores = [
            ModuleScore {
                achieved: 33,
                max: 50,
            },
            ModuleScore {
                achieved: 41,
                max: 60,
            },
        ];
        assert_eq!(aggregate_score(&scores), aggregate_score(&scores));
    }

    #[test]
    fn band_edges_classify_correctly() {
        assert_eq!(risk_level(90, false, false), RiskLevel::Low);
        assert_eq!(risk_level(89, false, false), RiskLevel::Medium);
        assert_eq!(risk_level(75, false, false), RiskLevel::Medium);
        assert_eq!(risk_level(74, false, false), RiskLevel::High);
        assert_eq!(risk_level(50, false, false), RiskLevel::High);
        assert_eq!(risk_level(49, false, false), RiskLevel::Critical);
    }

    #[test]
    fn open_failures_force_critical_risk() {
        assert_eq!(risk_level(100, true, false), RiskLevel::Critical);
        assert_eq!(risk_level(100, false, true), RiskLevel::Critical);
    }

    #[test]
    fn module_risk_uses_same_bands() {
        assert_eq!(
            module_risk(ModuleScore {
                achieved: 9,
                max: 10
            }),
            RiskLevel::Low
        );
        assert_eq!(
            module_risk(ModuleScore { achieved: 0, max: 0 }),
            RiskLevel::Critical
        );
    }
}
