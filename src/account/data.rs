//! Account observation records and threshold tiers

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{calendar, HitMode};
use crate::error::InputError;

/// Required average for the basic account tier
pub const BASIC_THRESHOLD: f64 = 10_000.0;

/// Required average for the mid account tier
pub const MID_THRESHOLD: f64 = 500_000.0;

/// Account tier selecting the required average balance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Basic,
    Mid,
    /// Threshold supplied directly (batch input)
    Custom(f64),
}

impl Tier {
    /// The two fixed tiers, in display order
    pub const FIXED: [Tier; 2] = [Tier::Basic, Tier::Mid];

    /// Required average balance for this tier
    pub fn threshold(&self) -> f64 {
        match self {
            Tier::Basic => BASIC_THRESHOLD,
            Tier::Mid => MID_THRESHOLD,
            Tier::Custom(value) => *value,
        }
    }

    /// Short label used in tables
    pub fn label(&self) -> String {
        match self {
            Tier::Basic => "basic".to_string(),
            Tier::Mid => "mid".to_string(),
            Tier::Custom(value) => format!("{}", value),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Tier {
    type Err = InputError;

    /// Accepts `basic`, `mid`, or a positive number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        match text.to_ascii_lowercase().as_str() {
            "basic" => return Ok(Tier::Basic),
            "mid" => return Ok(Tier::Mid),
            _ => {}
        }
        let value: f64 = text
            .replace(',', "")
            .parse()
            .map_err(|_| InputError::UnknownTier(text.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(InputError::NonPositiveThreshold(value));
        }
        Ok(Tier::Custom(value))
    }
}

/// Known state of an account at the statistics date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Average daily balance over the elapsed days
    pub avg_to_date: f64,

    /// Days already counted in the average (Jan 1 = 0)
    pub elapsed_days: u32,

    /// Balance held at the statistics date
    pub current_balance: f64,

    /// Date the average was taken
    pub stats_date: Option<NaiveDate>,
}

impl Observation {
    /// Observation dated by calendar, deriving elapsed days from the date
    pub fn on_date(avg_to_date: f64, current_balance: f64, stats_date: NaiveDate) -> Self {
        Self {
            avg_to_date,
            elapsed_days: calendar::day_offset(stats_date),
            current_balance,
            stats_date: Some(stats_date),
        }
    }

    /// Observation given directly in day counts (no calendar date)
    pub fn from_day_count(avg_to_date: f64, elapsed_days: u32, current_balance: f64) -> Self {
        Self {
            avg_to_date,
            elapsed_days,
            current_balance,
            stats_date: None,
        }
    }
}

/// Day at which compliance is projected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub target_date: Option<NaiveDate>,

    /// Days from cycle start through the target date
    pub target_days: u32,
}

impl Target {
    pub fn on_date(target_date: NaiveDate) -> Self {
        Self {
            target_date: Some(target_date),
            target_days: calendar::day_offset(target_date),
        }
    }

    pub fn from_day_count(target_days: u32) -> Self {
        Self {
            target_date: None,
            target_days,
        }
    }

    /// Dec 31 of the observation year
    pub fn year_end(stats_date: NaiveDate) -> Self {
        Self::on_date(calendar::year_end(stats_date))
    }
}

/// Raw single-record input; `None` marks an empty field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInput {
    pub avg_to_date: Option<f64>,
    pub current_balance: Option<f64>,
    pub stats_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub hit_mode: HitMode,
}

impl AccountInput {
    /// Check every field and derive the day counts
    pub fn validate(&self) -> Result<(Observation, Target), InputError> {
        let avg_to_date = require_finite("avg_to_date", self.avg_to_date)?;
        let current_balance = require_finite("current_balance", self.current_balance)?;
        let stats_date = self.stats_date.ok_or(InputError::MissingField("stats_date"))?;
        let target_date = self.target_date.ok_or(InputError::MissingField("target_date"))?;

        if target_date < stats_date {
            return Err(InputError::TargetBeforeStats {
                stats: stats_date.to_string(),
                target: target_date.to_string(),
            });
        }
        if target_date.year() != stats_date.year() {
            return Err(InputError::TargetOutsideYear(target_date.to_string()));
        }

        let threshold = self.tier.threshold();
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(InputError::NonPositiveThreshold(threshold));
        }

        Ok((
            Observation::on_date(avg_to_date, current_balance, stats_date),
            Target::on_date(target_date),
        ))
    }
}

fn require_finite(field: &'static str, value: Option<f64>) -> Result<f64, InputError> {
    match value {
        None => Err(InputError::MissingField(field)),
        Some(v) if !v.is_finite() => Err(InputError::NonFinite(field)),
        Some(v) => Ok(v),
    }
}
