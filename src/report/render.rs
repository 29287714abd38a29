//! Report rendering: HTML tables, plain text, and JSON
//!
//! Every render call builds its output from scratch from a finished report.

use comfy_table::{presets::ASCII_MARKDOWN, Table};
use serde::Serialize;
use std::fmt::Write;

use super::{
    balance_text, BatchReport, BatchSummary, DatedBatchRow, DayCountBatchRow, SingleDisplay,
    SingleReport, TierOutcome, LABEL_COMPLETE, LABEL_HIT, LABEL_INCOMPLETE, LABEL_NOT_HIT,
};
use crate::account::Tier;
use crate::format::{fmt_currency, fmt_days, UNDEFINED_TEXT};

/// Columns per fixed tier in the day-count table
const TIER_COLUMNS: usize = 5;

const DATED_HEADERS: [&str; 7] = [
    "姓名", "编号", "等级", "状态", "目标日预计日均", "年末所需余额", "可达标日期",
];

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Escape text for an HTML text node or attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn push_row(html: &mut String, cells: &[String], tag: &str) {
    html.push_str("<tr>");
    for cell in cells {
        let _ = write!(html, "<{tag}>{}</{tag}>", escape_html(cell), tag = tag);
    }
    html.push_str("</tr>\n");
}

/// Render a batch report as an HTML table
pub fn render_html(report: &BatchReport) -> String {
    match report {
        BatchReport::Dated(rows) => render_dated_table(rows),
        BatchReport::DayCount(rows) => render_day_count_table(rows),
    }
}

pub fn render_dated_table(rows: &[DatedBatchRow]) -> String {
    let mut html = String::from("<table class=\"batch-result\">\n<thead>\n");
    push_row(&mut html, &DATED_HEADERS.map(String::from), "th");
    html.push_str("</thead>\n<tbody>\n");
    for row in rows {
        push_row(&mut html, &dated_cells(row), "td");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

pub fn render_day_count_table(rows: &[DayCountBatchRow]) -> String {
    let mut html = String::from("<table class=\"batch-result\">\n<thead>\n");
    push_row(&mut html, &day_count_headers(), "th");
    html.push_str("</thead>\n<tbody>\n");
    for row in rows {
        push_row(&mut html, &day_count_cells(row), "td");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn dated_cells(row: &DatedBatchRow) -> Vec<String> {
    let display = row.report.display();
    vec![
        row.name.clone(),
        row.id.clone(),
        row.tier.map_or_else(|| UNDEFINED_TEXT.to_string(), |tier| tier.label()),
        display.badge,
        display.projected_average,
        display.year_end_balance,
        display.attainment,
    ]
}

fn day_count_headers() -> Vec<String> {
    let mut headers = vec!["姓名".to_string(), "编号".to_string(), "状态".to_string()];
    for tier in Tier::FIXED {
        let label = tier.label();
        headers.push(format!("{} 当前达标", label));
        headers.push(format!("{} 目标日达标", label));
        headers.push(format!("{} 预计日均", label));
        headers.push(format!("{} 所需余额", label));
        headers.push(format!("{} 所需天数", label));
    }
    headers
}

fn day_count_cells(row: &DayCountBatchRow) -> Vec<String> {
    let mut cells = vec![row.name.clone(), row.id.clone()];
    if !row.status.is_complete() {
        cells.push(LABEL_INCOMPLETE.to_string());
        cells.extend(
            std::iter::repeat(UNDEFINED_TEXT.to_string()).take(Tier::FIXED.len() * TIER_COLUMNS),
        );
        return cells;
    }

    cells.push(LABEL_COMPLETE.to_string());
    for tier in Tier::FIXED {
        match row.outcome(tier) {
            Some(outcome) => cells.extend(outcome_cells(outcome)),
            None => cells.extend(std::iter::repeat(UNDEFINED_TEXT.to_string()).take(TIER_COLUMNS)),
        }
    }
    cells
}

fn outcome_cells(outcome: &TierOutcome) -> [String; TIER_COLUMNS] {
    [
        hit_label(outcome.hit_now).to_string(),
        hit_label(outcome.hit_at_target).to_string(),
        fmt_currency(outcome.projected_average),
        balance_text(outcome.required_balance),
        fmt_days(outcome.required_extra_days),
    ]
}

fn hit_label(hit: bool) -> &'static str {
    if hit { LABEL_HIT } else { LABEL_NOT_HIT }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Multi-line text for one account
pub fn render_single_text(report: &SingleReport) -> String {
    let display = report.display();
    let mut text = String::new();
    let _ = writeln!(text, "等级:           {} ({})", report.tier, fmt_currency(report.threshold));
    let _ = writeln!(text, "模式:           {}", report.hit_mode);
    let _ = writeln!(text, "状态:           {}", display.badge);
    if let super::RecordStatus::Incomplete(reason) = &report.status {
        let _ = writeln!(text, "原因:           {}", reason);
    }
    let _ = writeln!(text, "目标日预计日均: {}", display.projected_average);
    let _ = writeln!(text, "年末所需余额:   {}", display.year_end_balance);
    let _ = writeln!(text, "可达标日期:     {}", display.attainment);
    text
}

/// Aligned table followed by a one-line summary
pub fn render_batch_text(report: &BatchReport) -> String {
    let (headers, rows): (Vec<String>, Vec<Vec<String>>) = match report {
        BatchReport::Dated(rows) => (
            DATED_HEADERS.map(String::from).to_vec(),
            rows.iter().map(dated_cells).collect(),
        ),
        BatchReport::DayCount(rows) => (
            day_count_headers(),
            rows.iter().map(day_count_cells).collect(),
        ),
    };

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_header(headers);
    for cells in rows {
        table.add_row(cells);
    }

    let mut text = String::new();
    let _ = writeln!(text, "{}", table);

    let summary = report.summary();
    let _ = writeln!(
        text,
        "\n共 {} 行: 完整 {}, 数据不完整 {}, 达标 {}",
        summary.total, summary.complete, summary.incomplete, summary.hit
    );
    text
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SingleJson<'a> {
    report: &'a SingleReport,
    display: SingleDisplay,
}

#[derive(Serialize)]
struct BatchJson<'a> {
    summary: BatchSummary,
    report: &'a BatchReport,
    /// Rendered cells per row, in table order
    display: Vec<Vec<String>>,
}

/// JSON for one account; non-finite numbers appear as `null`, use `display` for sentinels
pub fn render_single_json(report: &SingleReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SingleJson {
        report,
        display: report.display(),
    })
}

pub fn render_batch_json(report: &BatchReport) -> serde_json::Result<String> {
    let display = match report {
        BatchReport::Dated(rows) => rows.iter().map(dated_cells).collect(),
        BatchReport::DayCount(rows) => rows.iter().map(day_count_cells).collect(),
    };
    serde_json::to_string_pretty(&BatchJson {
        summary: report.summary(),
        report,
        display,
    })
}
