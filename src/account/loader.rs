//! Load batch records from CSV
//!
//! Two header layouts are recognised:
//! - dated: `name,id,avg_to_date,current_balance,stats_date,target_date,level`
//! - day-count: `name,id,avg_to_date,elapsed_days,current_balance,total_days`
//!
//! Problems inside a row are kept on that row as an [`InputError`]; only
//! I/O, CSV syntax, and header problems fail the whole load.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{AccountInput, Observation, Target, Tier};
use crate::engine::{calendar, HitMode};
use crate::error::{BatchError, InputError};

const DATED_COLUMNS: [&str; 7] = [
    "name", "id", "avg_to_date", "current_balance", "stats_date", "target_date", "level",
];

const DAY_COUNT_COLUMNS: [&str; 6] = [
    "name", "id", "avg_to_date", "elapsed_days", "current_balance", "total_days",
];

/// Which CSV layout a batch file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLayout {
    /// Calendar dates plus a tier per row
    Dated,
    /// Raw day counts, evaluated against both fixed tiers
    DayCount,
}

impl BatchLayout {
    /// Detect the layout from a header row
    ///
    /// A layout matches when all of its columns are present; extra columns
    /// are ignored. When neither matches, the error names the first column
    /// missing from the layout the header most resembles.
    pub fn detect(headers: &[String]) -> Result<Self, BatchError> {
        let has = |name: &str| headers.iter().any(|h| h == name);
        let missing = |layout: BatchLayout| {
            layout.required_columns().iter().copied().find(|&column| !has(column))
        };

        let dated_missing = missing(BatchLayout::Dated);
        let day_count_missing = missing(BatchLayout::DayCount);
        match (dated_missing, day_count_missing) {
            (None, _) => return Ok(BatchLayout::Dated),
            (_, None) => return Ok(BatchLayout::DayCount),
            _ => {}
        }

        if has("elapsed_days") || has("total_days") {
            Err(BatchError::MissingColumn(day_count_missing.unwrap_or("total_days")))
        } else if has("stats_date") || has("target_date") || has("level") {
            Err(BatchError::MissingColumn(dated_missing.unwrap_or("stats_date")))
        } else {
            Err(BatchError::UnknownLayout(headers.join(",")))
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            BatchLayout::Dated => &DATED_COLUMNS,
            BatchLayout::DayCount => &DAY_COUNT_COLUMNS,
        }
    }
}

/// One CSV row with its identifying columns and parsed payload
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord<T> {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub name: String,
    pub id: String,
    pub parsed: Result<T, InputError>,
}

/// Fields of a dated-layout row; `None` marks an empty cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedRow {
    pub avg_to_date: Option<f64>,
    pub current_balance: Option<f64>,
    pub stats_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub level: Option<Tier>,
}

impl DatedRow {
    /// Build the single-record input, falling back to `default_tier` for an empty level
    pub fn to_input(&self, default_tier: Tier, hit_mode: HitMode) -> AccountInput {
        AccountInput {
            avg_to_date: self.avg_to_date,
            current_balance: self.current_balance,
            stats_date: self.stats_date,
            target_date: self.target_date,
            tier: self.level.unwrap_or(default_tier),
            hit_mode,
        }
    }
}

/// Fields of a day-count-layout row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCountRow {
    pub avg_to_date: f64,
    pub elapsed_days: u32,
    pub current_balance: f64,
    pub total_days: u32,
}

impl DayCountRow {
    /// Check day ordering and build the engine records
    pub fn validate(&self) -> Result<(Observation, Target), InputError> {
        if self.total_days == 0 {
            return Err(InputError::ZeroTargetDays);
        }
        if self.total_days < self.elapsed_days {
            return Err(InputError::TargetBeforeStats {
                stats: self.elapsed_days.to_string(),
                target: self.total_days.to_string(),
            });
        }
        Ok((
            Observation::from_day_count(self.avg_to_date, self.elapsed_days, self.current_balance),
            Target::from_day_count(self.total_days),
        ))
    }
}

/// Records of a loaded batch file, in file order
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Dated(Vec<BatchRecord<DatedRow>>),
    DayCount(Vec<BatchRecord<DayCountRow>>),
}

impl Batch {
    pub fn layout(&self) -> BatchLayout {
        match self {
            Batch::Dated(_) => BatchLayout::Dated,
            Batch::DayCount(_) => BatchLayout::DayCount,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Dated(rows) => rows.len(),
            Batch::DayCount(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load a batch from a CSV file
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<Batch, BatchError> {
    let file = File::open(path.as_ref())?;
    debug!("Loading batch from {}", path.as_ref().display());
    load_batch_from_reader(file)
}

/// Load a batch from any reader (e.g., uploaded bytes, string buffer)
pub fn load_batch_from_reader<R: Read>(reader: R) -> Result<Batch, BatchError> {
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();
    let layout = BatchLayout::detect(&headers)?;
    let columns = ColumnIndex::new(&headers);

    let mut raw = Vec::new();
    for result in csv_reader.records() {
        raw.push(result?);
    }

    let batch = match layout {
        BatchLayout::Dated => Batch::Dated(
            raw.iter()
                .enumerate()
                .map(|(i, record)| columns.record(i + 1, record, parse_dated))
                .collect(),
        ),
        BatchLayout::DayCount => Batch::DayCount(
            raw.iter()
                .enumerate()
                .map(|(i, record)| columns.record(i + 1, record, parse_day_count))
                .collect(),
        ),
    };

    debug!("Loaded {} {:?} rows", batch.len(), layout);
    Ok(batch)
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}

/// Header name to column position
struct ColumnIndex<'a> {
    headers: &'a [String],
}

impl<'a> ColumnIndex<'a> {
    fn new(headers: &'a [String]) -> Self {
        Self { headers }
    }

    /// Cell text for a column; missing trailing cells read as empty
    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }

    fn record<T>(
        &self,
        row: usize,
        record: &StringRecord,
        parse: fn(&Self, &StringRecord) -> Result<T, InputError>,
    ) -> BatchRecord<T> {
        let parsed = parse(self, record);
        if let Err(e) = &parsed {
            warn!("Row {} incomplete: {}", row, e);
        }
        BatchRecord {
            row,
            name: self.cell(record, "name").to_string(),
            id: self.cell(record, "id").to_string(),
            parsed,
        }
    }
}

fn parse_dated(columns: &ColumnIndex, record: &StringRecord) -> Result<DatedRow, InputError> {
    let level = columns.cell(record, "level");
    Ok(DatedRow {
        avg_to_date: parse_amount("avg_to_date", columns.cell(record, "avg_to_date"))?,
        current_balance: parse_amount("current_balance", columns.cell(record, "current_balance"))?,
        stats_date: parse_date_cell("stats_date", columns.cell(record, "stats_date"))?,
        target_date: parse_date_cell("target_date", columns.cell(record, "target_date"))?,
        level: if level.is_empty() { None } else { Some(level.parse()?) },
    })
}

fn parse_day_count(columns: &ColumnIndex, record: &StringRecord) -> Result<DayCountRow, InputError> {
    let required = |field: &'static str| -> Result<f64, InputError> {
        parse_amount(field, columns.cell(record, field))?.ok_or(InputError::MissingField(field))
    };
    Ok(DayCountRow {
        avg_to_date: required("avg_to_date")?,
        elapsed_days: parse_day_count_cell("elapsed_days", columns.cell(record, "elapsed_days"))?,
        current_balance: required("current_balance")?,
        total_days: parse_day_count_cell("total_days", columns.cell(record, "total_days"))?,
    })
}

/// Parse a money amount; empty text is `None`, thousands separators are allowed
pub fn parse_amount(field: &'static str, text: &str) -> Result<Option<f64>, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let value: f64 = text
        .replace(',', "")
        .parse()
        .map_err(|_| InputError::InvalidNumber { field, value: text.to_string() })?;
    if !value.is_finite() {
        return Err(InputError::NonFinite(field));
    }
    Ok(Some(value))
}

fn parse_date_cell(field: &'static str, text: &str) -> Result<Option<NaiveDate>, InputError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    calendar::parse_date(text)
        .map(Some)
        .ok_or_else(|| InputError::InvalidDate { field, value: text.to_string() })
}

/// Parse a non-negative whole day count (`100` or `100.0`)
fn parse_day_count_cell(field: &'static str, text: &str) -> Result<u32, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::MissingField(field));
    }
    if let Ok(days) = text.parse::<u32>() {
        return Ok(days);
    }
    let invalid = || InputError::InvalidDayCount { field, value: text.to_string() };
    let value: f64 = text.parse().map_err(|_| invalid())?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Err(invalid())
    }
}
