//! Fixed-locale number formatting (zh-CN, CNY)
//!
//! `+∞` renders as `∞` and `NaN` as `—` everywhere, so callers can pass
//! engine results straight through.

use chrono::NaiveDate;

pub const INFINITY_TEXT: &str = "∞";
pub const UNDEFINED_TEXT: &str = "—";
pub const CURRENCY_SYMBOL: &str = "¥";

/// Currency amount with thousands grouping and 2 fraction digits
pub fn fmt_currency(value: f64) -> String {
    match sentinel(value) {
        Some(text) => text.to_string(),
        None => {
            let body = group_fixed(value.abs(), 2);
            if is_negative(value, 2) {
                format!("-{}{}", CURRENCY_SYMBOL, body)
            } else {
                format!("{}{}", CURRENCY_SYMBOL, body)
            }
        }
    }
}

/// Plain number with thousands grouping and 2 fraction digits
pub fn fmt_number(value: f64) -> String {
    fmt_number_digits(value, 2)
}

/// Plain number with thousands grouping and `digits` fraction digits
pub fn fmt_number_digits(value: f64, digits: usize) -> String {
    match sentinel(value) {
        Some(text) => text.to_string(),
        None => {
            let body = group_fixed(value.abs(), digits);
            if is_negative(value, digits) {
                format!("-{}", body)
            } else {
                body
            }
        }
    }
}

/// Day count rounded up to whole days
pub fn fmt_days(value: f64) -> String {
    if value.is_finite() {
        fmt_number_digits(value.ceil(), 0)
    } else {
        fmt_number_digits(value, 0)
    }
}

pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn sentinel(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some(UNDEFINED_TEXT)
    } else if value == f64::INFINITY {
        Some(INFINITY_TEXT)
    } else if value == f64::NEG_INFINITY {
        Some("-∞")
    } else {
        None
    }
}

/// A value that rounds to zero prints without a sign
fn is_negative(value: f64, digits: usize) -> bool {
    value < 0.0 && format!("{:.*}", digits, value.abs()).chars().any(|c| c != '0' && c != '.')
}

fn group_fixed(value: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, value);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}
