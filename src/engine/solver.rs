//! Closed-form solvers for the balance or day count needed to reach a threshold
//!
//! Results use three tiers:
//! - finite: the computed answer
//! - `f64::INFINITY`: evaluable, but no finite answer exists
//! - `f64::NAN`: inputs cannot be evaluated

use log::trace;

/// Band inside which a held balance is treated as equal to the threshold
pub const BALANCE_EQUALITY_EPSILON: f64 = 1e-12;

/// Minimum constant balance to hold from `elapsed_days` to `target_days`
/// so the average at `target_days` equals `threshold`
///
/// `M = (threshold·T − avg·D) / (T − D)`
///
/// The result is not clamped: a negative value means the threshold is
/// already exceeded by the history alone.
pub fn required_balance_for_target(
    avg_to_date: f64,
    elapsed_days: u32,
    target_days: u32,
    threshold: f64,
) -> f64 {
    if target_days == 0 || !avg_to_date.is_finite() || !threshold.is_finite() {
        return f64::NAN;
    }
    if target_days < elapsed_days {
        return f64::NAN;
    }
    if target_days == elapsed_days {
        // No remaining days to compensate with
        return if avg_to_date >= threshold { 0.0 } else { f64::INFINITY };
    }

    let t = target_days as f64;
    let d = elapsed_days as f64;
    (threshold * t - avg_to_date * d) / (t - d)
}

/// Minimum additional days holding `balance` so the blended average over
/// `elapsed_days + N` days meets `threshold`
///
/// Solves `N·(M − threshold) ≥ D·(threshold − avg)`. The returned count is
/// real-valued; round up for display.
pub fn days_needed_with_balance(
    avg_to_date: f64,
    elapsed_days: u32,
    balance: f64,
    threshold: f64,
) -> f64 {
    if balance == f64::INFINITY {
        return 0.0;
    }
    if !avg_to_date.is_finite() || !balance.is_finite() || !threshold.is_finite() {
        return f64::NAN;
    }

    let shortfall = elapsed_days as f64 * (threshold - avg_to_date);
    let margin = balance - threshold;

    let days = if margin.abs() <= BALANCE_EQUALITY_EPSILON {
        // Holding exactly the threshold cannot move the average
        if shortfall <= 0.0 { 0.0 } else { f64::INFINITY }
    } else if margin > 0.0 {
        (shortfall / margin).max(0.0)
    } else if shortfall <= 0.0 {
        0.0
    } else {
        f64::INFINITY
    };

    trace!(
        "days_needed: avg={} D={} M={} threshold={} -> {}",
        avg_to_date, elapsed_days, balance, threshold, days
    );
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hit::is_meeting_at_target;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_required_balance_closed_form() {
        // (10000·365 − 8000·100) / 265
        let m = required_balance_for_target(8000.0, 100, 365, 10_000.0);
        assert_relative_eq!(m, 2_850_000.0 / 265.0, max_relative = 1e-12);
    }

    #[test]
    fn test_required_balance_no_remaining_days() {
        assert_eq!(required_balance_for_target(10_000.0, 100, 100, 10_000.0), 0.0);
        assert_eq!(required_balance_for_target(12_000.0, 100, 100, 10_000.0), 0.0);
        assert_eq!(required_balance_for_target(9_999.0, 100, 100, 10_000.0), f64::INFINITY);
    }

    #[test]
    fn test_required_balance_passes_negative_through() {
        // History alone already carries the average well past the threshold
        let m = required_balance_for_target(100_000.0, 300, 364, 10_000.0);
        assert!(m < 0.0);
    }

    #[test]
    fn test_required_balance_invalid_inputs() {
        assert!(required_balance_for_target(8000.0, 0, 0, 10_000.0).is_nan());
        assert!(required_balance_for_target(f64::NAN, 100, 365, 10_000.0).is_nan());
        assert!(required_balance_for_target(8000.0, 100, 365, f64::INFINITY).is_nan());
        assert!(required_balance_for_target(8000.0, 200, 100, 10_000.0).is_nan());
    }

    #[test]
    fn test_required_balance_round_trip() {
        let cases = [
            (8000.0, 100, 365, 10_000.0),
            (123_456.78, 37, 200, 500_000.0),
            (0.0, 0, 364, 10_000.0),
            (20_000.0, 300, 364, 10_000.0),
        ];
        for (avg, d, t, threshold) in cases {
            let m = required_balance_for_target(avg, d, t, threshold);
            assert!(m.is_finite());
            assert!(
                is_meeting_at_target(avg, d, m, t, threshold),
                "round trip failed for avg={} d={} t={} m={}",
                avg, d, t, m
            );
        }
    }

    #[test]
    fn test_days_needed_balance_equal_to_threshold() {
        // Average below threshold cannot move
        assert_eq!(days_needed_with_balance(5_000.0, 50, 10_000.0, 10_000.0), f64::INFINITY);
        // Already met
        assert_eq!(days_needed_with_balance(12_000.0, 50, 10_000.0, 10_000.0), 0.0);
        // Within the equality band
        assert_eq!(
            days_needed_with_balance(5_000.0, 50, 10_000.0 + 1e-13, 10_000.0),
            f64::INFINITY
        );
    }

    #[test]
    fn test_days_needed_balance_above_threshold() {
        let (avg, d, m, threshold) = (8000.0, 100, 12_000.0, 10_000.0);
        let n = days_needed_with_balance(avg, d, m, threshold);
        assert_abs_diff_eq!(n, 100.0, epsilon = 1e-9);

        let blended = (avg * d as f64 + m * n) / (d as f64 + n);
        assert_abs_diff_eq!(blended, threshold, epsilon = 1e-9);
    }

    #[test]
    fn test_days_needed_balance_above_threshold_already_met() {
        // Negative raw solution floors at zero
        assert_eq!(days_needed_with_balance(15_000.0, 100, 12_000.0, 10_000.0), 0.0);
    }

    #[test]
    fn test_days_needed_balance_below_threshold() {
        assert_eq!(days_needed_with_balance(5_000.0, 50, 5_000.0, 10_000.0), f64::INFINITY);
        assert_eq!(days_needed_with_balance(11_000.0, 50, 5_000.0, 10_000.0), 0.0);
    }

    #[test]
    fn test_days_needed_infinite_balance() {
        assert_eq!(days_needed_with_balance(0.0, 100, f64::INFINITY, 500_000.0), 0.0);
    }

    #[test]
    fn test_days_needed_invalid_inputs() {
        assert!(days_needed_with_balance(f64::NAN, 50, 12_000.0, 10_000.0).is_nan());
        assert!(days_needed_with_balance(8_000.0, 50, f64::NAN, 10_000.0).is_nan());
        assert!(days_needed_with_balance(8_000.0, 50, f64::NEG_INFINITY, 10_000.0).is_nan());
        assert!(days_needed_with_balance(8_000.0, 50, 12_000.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_days_needed_day_zero() {
        // No history: any balance at or above threshold works immediately
        assert_eq!(days_needed_with_balance(0.0, 0, 12_000.0, 10_000.0), 0.0);
    }
}
