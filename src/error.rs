//! Error types for input validation and batch loading

use thiserror::Error;

/// A single record could not be evaluated
///
/// These never abort a batch; the affected row is reported as incomplete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid day count in {field}: {value:?}")]
    InvalidDayCount { field: &'static str, value: String },

    #[error("unknown level: {0:?}")]
    UnknownTier(String),

    #[error("threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),

    #[error("target precedes statistics ({target} < {stats})")]
    TargetBeforeStats { stats: String, target: String },

    #[error("target must fall in the statistics year ({0})")]
    TargetOutsideYear(String),

    #[error("total days must be positive")]
    ZeroTargetDays,
}

/// The batch file as a whole could not be processed
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("header is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("header matches no known batch layout: {0}")]
    UnknownLayout(String),
}
