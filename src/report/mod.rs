//! Single-record and batch orchestration over the engine, plus rendering

mod single;
mod batch;
pub mod render;

pub use single::{attainment_text, balance_text, evaluate_single, SingleDisplay, SingleReport};
pub use batch::{
    evaluate_batch, evaluate_day_count_row, BatchReport, BatchSummary, DatedBatchRow,
    DayCountBatchRow, TierOutcome,
};

use serde::Serialize;

pub const LABEL_COMPLETE: &str = "完整";
pub const LABEL_HIT: &str = "达标";
pub const LABEL_NOT_HIT: &str = "未达标";
pub const LABEL_INCOMPLETE: &str = "数据不完整";
pub const LABEL_NO_INCREASE: &str = "0（无需增加）";
pub const LABEL_UNREACHABLE: &str = "当前余额下无法达标";
pub const LABEL_INSUFFICIENT_DATA: &str = "数据不足";

/// Whether a record was evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RecordStatus {
    Complete,
    /// Invalid or missing input; the reason is for logs and JSON output
    Incomplete(String),
}

impl RecordStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, RecordStatus::Complete)
    }
}
