//! Batch evaluation: the single-record pipeline applied per CSV row
//!
//! Rows are independent. An incomplete row never affects its neighbours,
//! and the result always lists rows in input order.

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use super::single::{evaluate_single, SingleReport};
use super::RecordStatus;
use crate::account::{Batch, BatchLayout, BatchRecord, DatedRow, DayCountRow, Tier};
use crate::config::ReportConfig;
use crate::engine::{
    days_needed_with_balance, is_hit_by_mode, is_meeting_at_target, projected_average,
    required_balance_for_target, HitMode,
};

/// One dated-layout row with its evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedBatchRow {
    pub row: usize,
    pub name: String,
    pub id: String,
    /// Tier the row asked for; `None` when the row could not be parsed
    pub tier: Option<Tier>,
    pub report: SingleReport,
}

/// One tier evaluated for a day-count row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierOutcome {
    pub tier: Tier,
    pub threshold: f64,
    pub hit_now: bool,
    pub hit_at_target: bool,
    pub projected_average: f64,
    pub required_balance: f64,
    pub required_extra_days: f64,
}

/// One day-count-layout row, evaluated against every fixed tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCountBatchRow {
    pub row: usize,
    pub name: String,
    pub id: String,
    pub status: RecordStatus,
    pub elapsed_days: Option<u32>,
    pub total_days: Option<u32>,
    /// Empty when the row is incomplete
    pub tiers: Vec<TierOutcome>,
}

impl DayCountBatchRow {
    pub fn outcome(&self, tier: Tier) -> Option<&TierOutcome> {
        self.tiers.iter().find(|o| o.tier == tier)
    }
}

/// Row counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
    /// Dated rows: hit now. Day-count rows: meeting at least one tier at the target.
    pub hit: usize,
}

/// A fully evaluated batch, replacing any earlier result as a whole
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", content = "rows", rename_all = "snake_case")]
pub enum BatchReport {
    Dated(Vec<DatedBatchRow>),
    DayCount(Vec<DayCountBatchRow>),
}

impl BatchReport {
    pub fn layout(&self) -> BatchLayout {
        match self {
            BatchReport::Dated(_) => BatchLayout::Dated,
            BatchReport::DayCount(_) => BatchLayout::DayCount,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let (total, complete, hit) = match self {
            BatchReport::Dated(rows) => (
                rows.len(),
                rows.iter().filter(|r| r.report.is_complete()).count(),
                rows.iter().filter(|r| r.report.hit_now).count(),
            ),
            BatchReport::DayCount(rows) => (
                rows.len(),
                rows.iter().filter(|r| r.status.is_complete()).count(),
                rows.iter()
                    .filter(|r| r.tiers.iter().any(|o| o.hit_at_target))
                    .count(),
            ),
        };
        BatchSummary {
            total,
            complete,
            incomplete: total - complete,
            hit,
        }
    }
}

/// Evaluate every row of a loaded batch
pub fn evaluate_batch(batch: &Batch, config: &ReportConfig) -> BatchReport {
    let report = match batch {
        Batch::Dated(records) => BatchReport::Dated(
            records
                .par_iter()
                .map(|record| evaluate_dated_row(record, config))
                .collect(),
        ),
        Batch::DayCount(records) => BatchReport::DayCount(
            records
                .par_iter()
                .map(|record| evaluate_day_count_row(record, config.hit_mode))
                .collect(),
        ),
    };

    let summary = report.summary();
    info!(
        "Batch evaluated ({:?}): {} rows, {} complete, {} incomplete, {} hit",
        report.layout(),
        summary.total,
        summary.complete,
        summary.incomplete,
        summary.hit,
    );
    report
}

fn evaluate_dated_row(record: &BatchRecord<DatedRow>, config: &ReportConfig) -> DatedBatchRow {
    let (tier, report) = match &record.parsed {
        Ok(fields) => {
            let input = fields.to_input(config.default_tier, config.hit_mode);
            (Some(input.tier), evaluate_single(&input))
        }
        Err(e) => (None, SingleReport::incomplete(config.default_tier, config.hit_mode, e)),
    };
    DatedBatchRow {
        row: record.row,
        name: record.name.clone(),
        id: record.id.clone(),
        tier,
        report,
    }
}

/// Evaluate one day-count row against both fixed tiers
pub fn evaluate_day_count_row(record: &BatchRecord<DayCountRow>, hit_mode: HitMode) -> DayCountBatchRow {
    let mut row = DayCountBatchRow {
        row: record.row,
        name: record.name.clone(),
        id: record.id.clone(),
        status: RecordStatus::Complete,
        elapsed_days: None,
        total_days: None,
        tiers: Vec::new(),
    };

    let validated = record
        .parsed
        .as_ref()
        .map_err(Clone::clone)
        .and_then(DayCountRow::validate);
    let (observation, target) = match validated {
        Ok(records) => records,
        Err(e) => {
            debug!("Row {} incomplete: {}", record.row, e);
            row.status = RecordStatus::Incomplete(e.to_string());
            return row;
        }
    };

    let avg = observation.avg_to_date;
    let elapsed = observation.elapsed_days;
    let balance = observation.current_balance;
    let total = target.target_days;

    row.elapsed_days = Some(elapsed);
    row.total_days = Some(total);
    row.tiers = Tier::FIXED
        .iter()
        .map(|&tier| {
            let threshold = tier.threshold();
            TierOutcome {
                tier,
                threshold,
                hit_now: is_hit_by_mode(avg, elapsed, threshold, hit_mode),
                hit_at_target: is_meeting_at_target(avg, elapsed, balance, total, threshold),
                projected_average: projected_average(avg, elapsed, balance, total),
                required_balance: required_balance_for_target(avg, elapsed, total, threshold),
                required_extra_days: days_needed_with_balance(avg, elapsed, balance, threshold),
            }
        })
        .collect();
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::load_batch_from_reader;
    use crate::error::InputError;
    use approx::assert_abs_diff_eq;

    const DATED_CSV: &str = "name,id,avg_to_date,current_balance,stats_date,target_date,level\n\
        Alice,A1,8000,12000,2025-04-11,2025-12-31,basic\n\
        Bob,B2,8000,12000,,2025-12-31,basic\n\
        Carol,C3,600000,600000,2025-06-30,2025-09-30,mid\n\
        Dan,D4,8000,12000,2025-04-11,2025-03-01,basic\n\
        Eve,E5,8000,12000,2025-04-11,2025-12-31,\n";

    #[test]
    fn test_dated_batch_isolates_bad_rows() {
        let batch = load_batch_from_reader(DATED_CSV.as_bytes()).unwrap();
        let report = evaluate_batch(&batch, &ReportConfig::default());
        let BatchReport::Dated(rows) = &report else { panic!("expected dated report") };

        assert_eq!(rows.len(), 5);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol", "Dan", "Eve"]);

        assert!(rows[0].report.is_complete());
        // Empty stats_date
        assert!(!rows[1].report.is_complete());
        assert_eq!(rows[1].report.display().badge, "数据不完整");
        // Following row unaffected
        assert!(rows[2].report.is_complete());
        assert!(rows[2].report.hit_now);
        assert_eq!(rows[2].report.tier, Tier::Mid);
        // Target before stats
        assert!(!rows[3].report.is_complete());
        // Empty level falls back to the configured tier
        assert_eq!(rows[4].report.tier, Tier::Basic);

        assert_eq!(
            report.summary(),
            BatchSummary { total: 5, complete: 3, incomplete: 2, hit: 1 }
        );
    }

    #[test]
    fn test_unparsable_row_has_no_tier() {
        let csv = "name,id,avg_to_date,current_balance,stats_date,target_date,level\n\
                   Kim,K1,abc,12000,2025-04-11,2025-12-31,mid\n\
                   Lee,L2,8000,12000,2025-04-11,2025-03-01,mid\n";
        let batch = load_batch_from_reader(csv.as_bytes()).unwrap();
        let BatchReport::Dated(rows) = evaluate_batch(&batch, &ReportConfig::default()) else {
            panic!("expected dated report")
        };

        assert!(!rows[0].report.is_complete());
        assert_eq!(rows[0].tier, None);
        // Parsed but invalid: the requested tier is still known
        assert!(!rows[1].report.is_complete());
        assert_eq!(rows[1].tier, Some(Tier::Mid));
    }

    #[test]
    fn test_dated_batch_uses_configured_mode_and_tier() {
        let batch = load_batch_from_reader(DATED_CSV.as_bytes()).unwrap();
        let config = ReportConfig {
            hit_mode: HitMode::Year,
            default_tier: Tier::Mid,
            ..Default::default()
        };
        let BatchReport::Dated(rows) = evaluate_batch(&batch, &config) else {
            panic!("expected dated report")
        };
        assert_eq!(rows[4].report.tier, Tier::Mid);
        assert_eq!(rows[4].tier, Some(Tier::Mid));
        // 600000 · 180 < 500000 · 365
        assert!(!rows[2].report.hit_now);
    }

    #[test]
    fn test_day_count_row_evaluates_both_tiers() {
        let record = BatchRecord {
            row: 1,
            name: "Hal".to_string(),
            id: "H8".to_string(),
            parsed: Ok(DayCountRow {
                avg_to_date: 8000.0,
                elapsed_days: 100,
                current_balance: 12_000.0,
                total_days: 365,
            }),
        };
        let row = evaluate_day_count_row(&record, HitMode::Point);
        assert!(row.status.is_complete());
        assert_eq!(row.tiers.len(), 2);

        let basic = row.outcome(Tier::Basic).unwrap();
        assert!(basic.hit_at_target);
        assert_abs_diff_eq!(basic.projected_average, 3_980_000.0 / 365.0, epsilon = 1e-9);
        assert_abs_diff_eq!(basic.required_extra_days, 100.0, epsilon = 1e-9);

        let mid = row.outcome(Tier::Mid).unwrap();
        assert!(!mid.hit_at_target);
        assert_eq!(mid.required_extra_days, f64::INFINITY);
        assert_abs_diff_eq!(
            mid.required_balance,
            (500_000.0 * 365.0 - 800_000.0) / 265.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_day_count_row_incomplete() {
        let record = BatchRecord {
            row: 2,
            name: "Ivy".to_string(),
            id: "I9".to_string(),
            parsed: Err(InputError::MissingField("total_days")),
        };
        let row = evaluate_day_count_row(&record, HitMode::Point);
        assert!(!row.status.is_complete());
        assert!(row.tiers.is_empty());
    }

    #[test]
    fn test_day_count_batch_summary() {
        let csv = "name,id,avg_to_date,elapsed_days,current_balance,total_days\n\
                   Hal,H8,8000,100,12000,365\n\
                   Ivy,I9,8000,100,12000,50\n\
                   Jon,J10,5000,50,5000,365\n";
        let batch = load_batch_from_reader(csv.as_bytes()).unwrap();
        let report = evaluate_batch(&batch, &ReportConfig::default());

        assert_eq!(report.layout(), BatchLayout::DayCount);
        assert_eq!(
            report.summary(),
            BatchSummary { total: 3, complete: 2, incomplete: 1, hit: 1 }
        );

        let BatchReport::DayCount(rows) = report else { panic!("expected day-count report") };
        let jon = rows[2].outcome(Tier::Basic).unwrap();
        assert_eq!(jon.required_extra_days, f64::INFINITY);
    }
}
