//! Account records, threshold tiers, and batch loading

mod data;
pub mod loader;

pub use data::{AccountInput, Observation, Target, Tier, BASIC_THRESHOLD, MID_THRESHOLD};
pub use loader::{load_batch, load_batch_from_reader, Batch, BatchLayout, BatchRecord, DatedRow, DayCountRow};
