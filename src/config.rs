//! Report configuration with environment defaults
//!
//! Environment variables:
//!   DEPOSIT_HIT_MODE  point | year      (default point)
//!   DEPOSIT_TIER      basic | mid | N   (default basic)
//!   DEPOSIT_OUTPUT    text | json | html (default text)
//!
//! Absent or unparsable values fall back to the default.

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::account::Tier;
use crate::engine::HitMode;

/// How reports are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        })
    }
}

/// Settings shared by single and batch evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Policy for the "hit now" badge
    pub hit_mode: HitMode,

    /// Tier used when a record does not name one
    pub default_tier: Tier,

    pub format: OutputFormat,
}

impl ReportConfig {
    /// Defaults overridden by `DEPOSIT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            hit_mode: parse_or("DEPOSIT_HIT_MODE", &lookup, defaults.hit_mode),
            default_tier: parse_or("DEPOSIT_TIER", &lookup, defaults.default_tier),
            format: parse_or("DEPOSIT_OUTPUT", &lookup, defaults.format),
        }
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            default
        }),
    }
}
