//! Deposit Average - average daily balance threshold calculator
//!
//! This library provides:
//! - Threshold-hit evaluation at a target day and under two display modes
//! - Closed-form solvers for the balance or extra days needed to reach a tier
//! - Calendar day counting from Jan 1 of the observation year
//! - Single-record and CSV batch evaluation with HTML/text/JSON rendering

pub mod account;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod report;

// Re-export commonly used types
pub use account::{AccountInput, Observation, Target, Tier};
pub use config::{OutputFormat, ReportConfig};
pub use engine::HitMode;
pub use error::{BatchError, InputError};
pub use report::{evaluate_batch, evaluate_single, BatchReport, SingleReport};
