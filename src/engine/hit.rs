//! Threshold-hit evaluation
//!
//! "Cannot evaluate" always degrades to "not hit" here. Callers that need to
//! tell the two apart check [`projected_average`] for `NaN`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance applied to the projected-average comparison
pub const HIT_TOLERANCE: f64 = 1e-9;

/// Days used to annualize the running total in [`HitMode::Year`]
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Policy for the "hit right now" badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitMode {
    /// Average-to-date compared directly against the threshold
    #[default]
    Point,
    /// Running total compared against a full year at the threshold
    Year,
}

impl HitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitMode::Point => "point",
            HitMode::Year => "year",
        }
    }
}

impl fmt::Display for HitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(HitMode::Point),
            "year" => Ok(HitMode::Year),
            other => Err(format!("Unknown hit mode: {}", other)),
        }
    }
}

/// Average at `target_days` if `current_balance` is held every remaining day
///
/// Returns `NaN` when `target_days` is zero or any input is non-finite.
pub fn projected_average(
    avg_to_date: f64,
    elapsed_days: u32,
    current_balance: f64,
    target_days: u32,
) -> f64 {
    if target_days == 0 || !avg_to_date.is_finite() || !current_balance.is_finite() {
        return f64::NAN;
    }
    let remain = target_days.saturating_sub(elapsed_days) as f64;
    (avg_to_date * elapsed_days as f64 + current_balance * remain) / target_days as f64
}

/// Whether holding `current_balance` until `target_days` meets `threshold`
pub fn is_meeting_at_target(
    avg_to_date: f64,
    elapsed_days: u32,
    current_balance: f64,
    target_days: u32,
    threshold: f64,
) -> bool {
    if !threshold.is_finite() {
        return false;
    }
    let avg_at_target = projected_average(avg_to_date, elapsed_days, current_balance, target_days);
    // NaN compares false
    avg_at_target >= threshold - HIT_TOLERANCE
}

/// Whether the threshold is met right now under the selected display mode
pub fn is_hit_by_mode(avg_to_date: f64, elapsed_days: u32, threshold: f64, mode: HitMode) -> bool {
    if !avg_to_date.is_finite() || !threshold.is_finite() {
        return false;
    }
    match mode {
        HitMode::Year => avg_to_date * elapsed_days as f64 >= threshold * DAYS_PER_YEAR,
        // A day-zero average carries no information
        HitMode::Point => elapsed_days > 0 && avg_to_date >= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_projected_average_blends_history_and_balance() {
        let avg = projected_average(8000.0, 100, 12000.0, 365);
        assert_abs_diff_eq!(avg, 3_980_000.0 / 365.0, epsilon = 1e-9);
        assert_abs_diff_eq!(avg, 10904.11, epsilon = 0.01);
    }

    #[test]
    fn test_meeting_at_target_scenario() {
        assert!(is_meeting_at_target(8000.0, 100, 12000.0, 365, 10_000.0));
        assert!(!is_meeting_at_target(8000.0, 100, 12000.0, 365, 500_000.0));
    }

    #[test]
    fn test_target_before_elapsed_uses_history_only() {
        // remain clamps to zero
        let avg = projected_average(9000.0, 200, 1_000_000.0, 100);
        assert_abs_diff_eq!(avg, 18000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let threshold = 10_000.0;
        assert!(is_meeting_at_target(threshold - 5e-10, 10, threshold - 5e-10, 20, threshold));
        assert!(!is_meeting_at_target(threshold - 1e-6, 10, threshold - 1e-6, 20, threshold));
    }

    #[test]
    fn test_cannot_evaluate_is_not_hit() {
        assert!(!is_meeting_at_target(8000.0, 100, 12000.0, 0, 10_000.0));
        assert!(!is_meeting_at_target(f64::NAN, 100, 12000.0, 365, 10_000.0));
        assert!(!is_meeting_at_target(8000.0, 100, f64::INFINITY, 365, 10_000.0));
        assert!(!is_meeting_at_target(8000.0, 100, 12000.0, 365, f64::NAN));
        assert!(projected_average(8000.0, 100, 12000.0, 0).is_nan());
    }

    #[test]
    fn test_point_mode() {
        assert!(is_hit_by_mode(10_000.0, 10, 10_000.0, HitMode::Point));
        assert!(!is_hit_by_mode(9_999.0, 10, 10_000.0, HitMode::Point));
        assert!(!is_hit_by_mode(50_000.0, 0, 10_000.0, HitMode::Point));
    }

    #[test]
    fn test_year_mode_annualizes_running_total() {
        // 365 * 10000 = 3,650,000 needed
        assert!(is_hit_by_mode(36_500.0, 100, 10_000.0, HitMode::Year));
        assert!(!is_hit_by_mode(36_499.0, 100, 10_000.0, HitMode::Year));
        // Point mode would say hit, year mode does not
        assert!(!is_hit_by_mode(20_000.0, 100, 10_000.0, HitMode::Year));
        assert!(!is_hit_by_mode(f64::NAN, 100, 10_000.0, HitMode::Year));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Year".parse::<HitMode>().unwrap(), HitMode::Year);
        assert_eq!(" point ".parse::<HitMode>().unwrap(), HitMode::Point);
        assert!("monthly".parse::<HitMode>().is_err());
    }
}
