//! Single-record evaluation
//!
//! The user's target date drives the projected average. The "balance needed"
//! and "attainable on" figures are always measured against Dec 31 of the
//! observation year and against the current balance respectively.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::{
    RecordStatus, LABEL_HIT, LABEL_INCOMPLETE, LABEL_INSUFFICIENT_DATA, LABEL_NOT_HIT,
    LABEL_NO_INCREASE, LABEL_UNREACHABLE,
};
use crate::account::{AccountInput, Target, Tier};
use crate::engine::{
    calendar, days_needed_with_balance, is_hit_by_mode, is_meeting_at_target,
    projected_average, required_balance_for_target, HitMode,
};
use crate::error::InputError;
use crate::format::{fmt_currency, fmt_date, fmt_days, UNDEFINED_TEXT};

/// Outcome of evaluating one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleReport {
    pub status: RecordStatus,
    pub tier: Tier,
    pub threshold: f64,
    pub hit_mode: HitMode,

    pub elapsed_days: Option<u32>,
    pub target_days: Option<u32>,
    pub year_end_days: Option<u32>,

    /// Threshold met right now under `hit_mode`
    pub hit_now: bool,

    /// Threshold met at the target date holding the current balance
    pub hit_at_target: bool,

    /// Average at the target date holding the current balance
    pub projected_average: f64,

    /// Constant balance needed from now to meet the threshold by Dec 31
    pub year_end_required_balance: f64,

    /// Extra days at the current balance until the threshold is met
    pub required_extra_days: f64,

    /// Date the threshold is met at the current balance
    pub attainment_date: Option<NaiveDate>,
}

/// Display strings for a [`SingleReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleDisplay {
    pub badge: String,
    pub projected_average: String,
    pub year_end_balance: String,
    pub attainment: String,
}

impl SingleReport {
    /// Report for a record that could not be evaluated
    pub fn incomplete(tier: Tier, hit_mode: HitMode, error: &InputError) -> Self {
        Self {
            status: RecordStatus::Incomplete(error.to_string()),
            tier,
            threshold: tier.threshold(),
            hit_mode,
            elapsed_days: None,
            target_days: None,
            year_end_days: None,
            hit_now: false,
            hit_at_target: false,
            projected_average: f64::NAN,
            year_end_required_balance: f64::NAN,
            required_extra_days: f64::NAN,
            attainment_date: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn display(&self) -> SingleDisplay {
        if !self.is_complete() {
            return SingleDisplay {
                badge: LABEL_INCOMPLETE.to_string(),
                projected_average: UNDEFINED_TEXT.to_string(),
                year_end_balance: UNDEFINED_TEXT.to_string(),
                attainment: LABEL_INSUFFICIENT_DATA.to_string(),
            };
        }

        SingleDisplay {
            badge: if self.hit_now { LABEL_HIT } else { LABEL_NOT_HIT }.to_string(),
            projected_average: fmt_currency(self.projected_average),
            year_end_balance: balance_text(self.year_end_required_balance),
            attainment: attainment_text(self.attainment_date, self.required_extra_days),
        }
    }
}

/// Required-balance text: `M ≤ 0` means nothing more is needed
pub fn balance_text(required: f64) -> String {
    if required.is_finite() && required <= 0.0 {
        LABEL_NO_INCREASE.to_string()
    } else {
        fmt_currency(required)
    }
}

/// Attainment text from an optional date and the solver's day count
pub fn attainment_text(date: Option<NaiveDate>, extra_days: f64) -> String {
    match date {
        Some(date) => fmt_date(date),
        None if extra_days.is_nan() => LABEL_INSUFFICIENT_DATA.to_string(),
        None if extra_days == f64::INFINITY => LABEL_UNREACHABLE.to_string(),
        None => fmt_days(extra_days),
    }
}

/// Evaluate one account against its tier
pub fn evaluate_single(input: &AccountInput) -> SingleReport {
    let (observation, target) = match input.validate() {
        Ok(records) => records,
        Err(e) => {
            debug!("Record incomplete: {}", e);
            return SingleReport::incomplete(input.tier, input.hit_mode, &e);
        }
    };

    let threshold = input.tier.threshold();
    let avg = observation.avg_to_date;
    let elapsed = observation.elapsed_days;
    let balance = observation.current_balance;

    let year_end = observation
        .stats_date
        .map(Target::year_end)
        .unwrap_or(target);

    let required_extra_days = days_needed_with_balance(avg, elapsed, balance, threshold);
    let attainment_date = observation
        .stats_date
        .and_then(|date| calendar::date_after_days(date, required_extra_days));

    let report = SingleReport {
        status: RecordStatus::Complete,
        tier: input.tier,
        threshold,
        hit_mode: input.hit_mode,
        elapsed_days: Some(elapsed),
        target_days: Some(target.target_days),
        year_end_days: Some(year_end.target_days),
        hit_now: is_hit_by_mode(avg, elapsed, threshold, input.hit_mode),
        hit_at_target: is_meeting_at_target(avg, elapsed, balance, target.target_days, threshold),
        projected_average: projected_average(avg, elapsed, balance, target.target_days),
        year_end_required_balance: required_balance_for_target(
            avg,
            elapsed,
            year_end.target_days,
            threshold,
        ),
        required_extra_days,
        attainment_date,
    };

    debug!(
        "Evaluated tier {} D={} T={}: hit_now={} projected={:.2} year_end_M={:.2} N={:.2}",
        report.tier,
        elapsed,
        target.target_days,
        report.hit_now,
        report.projected_average,
        report.year_end_required_balance,
        report.required_extra_days,
    );
    report
}
