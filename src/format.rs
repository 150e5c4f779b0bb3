//! Yen, number, and date formatting for document text.

use time::{Date, Month};

/// Format an amount as Japanese yen: `¥` prefix, thousands separators, no
/// decimal places (integer yen is the smallest unit). Halves round away
/// from zero, matching the locale currency formatter the figures are
/// compared against.
pub fn format_yen(v: f64) -> String {
    if !v.is_finite() {
        return format!("¥{}", v);
    }
    let rounded = v.round();
    if rounded < 0.0 {
        format!("-¥{}", group_thousands(&format!("{:.0}", -rounded)))
    } else {
        format!("¥{}", group_thousands(&format!("{:.0}", rounded)))
    }
}

/// Bare grouped number for table cells: thousands separators, fractional
/// part kept up to three digits with trailing zeros trimmed.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let s = format!("{:.3}", v);
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (s.as_str(), ""),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let grouped = group_thousands(digits);
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// `YYYY年M月D日` for the A4 layouts. Empty input stays empty; anything
/// that does not parse as an ISO date passes through unchanged.
pub fn format_date_ja(iso: &str) -> String {
    match parse_iso_date(iso) {
        Some(d) => format!("{}年{}月{}日", d.year(), u8::from(d.month()), d.day()),
        None => iso.to_string(),
    }
}

/// `YYYY.M.D` for the receipt layout.
pub fn format_date_receipt(iso: &str) -> String {
    match parse_iso_date(iso) {
        Some(d) => format!("{}.{}.{}", d.year(), u8::from(d.month()), d.day()),
        None => iso.to_string(),
    }
}

/// Parse `YYYY-MM-DD`. Returns None for anything else, including dates
/// that do not exist on the calendar.
pub fn parse_iso_date(s: &str) -> Option<Date> {
    let mut parts = s.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn group_thousands(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    let mut cnt = 0;
    for i in (0..chars.len()).rev() {
        if cnt == 3 {
            out.push(',');
            cnt = 0;
        }
        out.push(chars[i]);
        cnt += 1;
    }
    out.chars().rev().collect()
}
