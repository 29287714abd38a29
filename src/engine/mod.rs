//! Deposit-average engine: pure threshold math over day counts
//!
//! Nothing in here knows about form fields, CSV columns, or display text.

pub mod calendar;
mod hit;
mod solver;

pub use hit::{
    is_hit_by_mode, is_meeting_at_target, projected_average, HitMode, DAYS_PER_YEAR,
    HIT_TOLERANCE,
};
pub use solver::{days_needed_with_balance, required_balance_for_target, BALANCE_EQUALITY_EPSILON};
