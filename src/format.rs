//! Label formatting for level values.
//!
//! Host format strings use .NET-style tokens (`#,0.00`, `dd/MM/yyyy`). Only
//! the subset slicers actually receive is supported; anything unrecognised is
//! copied through as literal text.

use chrono::{NaiveDateTime, Timelike};

use crate::value::PrimitiveValue;

const DEFAULT_DATE: &str = "%-m/%-d/%Y";
const DEFAULT_DATE_TIME: &str = "%-m/%-d/%Y %-I:%M:%S %p";

/// Format a value for display and for path identity.
pub fn format_value(value: &PrimitiveValue, format: Option<&str>) -> String {
    match value {
        PrimitiveValue::Null => String::new(),
        PrimitiveValue::Text(s) => s.clone(),
        PrimitiveValue::Boolean(true) => "True".to_string(),
        PrimitiveValue::Boolean(false) => "False".to_string(),
        PrimitiveValue::Number(n) => format_number(*n, format),
        PrimitiveValue::Date(d) => format_date(d, format),
    }
}

// ============================================================================
// NUMBERS
// ============================================================================

/// Format a number with a pattern like `0`, `0.00`, `#,0.0`, `0%` or `$#,0`.
pub fn format_number(n: f64, format: Option<&str>) -> String {
    let pattern = match format {
        Some(f) if !f.is_empty() && !f.eq_ignore_ascii_case("general") && f != "G" => f,
        _ => return general_number(n),
    };

    let is_digit_char = |c: char| matches!(c, '#' | '0' | ',' | '.');
    let (start, end) = match (pattern.find(is_digit_char), pattern.rfind(is_digit_char)) {
        (Some(s), Some(e)) => (s, e + 1),
        _ => return general_number(n),
    };
    let prefix = &pattern[..start];
    let body = &pattern[start..end];
    let suffix = &pattern[end..];

    let scaled = if suffix.contains('%') { n * 100.0 } else { n };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let grouped = int_part.contains(',');
    let fixed = frac_part.chars().filter(|c| *c == '0').count();
    let optional = frac_part.chars().filter(|c| *c == '#').count();

    let mut digits = format!("{:.*}", fixed + optional, scaled.abs());
    if optional > 0 {
        let keep = digits.find('.').map(|dot| dot + 1 + fixed);
        if let Some(keep) = keep {
            while digits.len() > keep && digits.ends_with('0') {
                digits.pop();
            }
        }
        if digits.ends_with('.') {
            digits.pop();
        }
    }

    let (int_digits, frac_digits) = match digits.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (digits, None),
    };
    let int_digits = if grouped {
        group_thousands(&int_digits)
    } else {
        int_digits
    };

    let mut out = String::new();
    if scaled < 0.0 && scaled.abs() >= 0.5 * 10f64.powi(-((fixed + optional) as i32)) {
        out.push('-');
    }
    out.push_str(prefix);
    out.push_str(&int_digits);
    if let Some(frac) = frac_digits {
        out.push('.');
        out.push_str(&frac);
    }
    out.push_str(suffix);
    out
}

fn general_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// DATES
// ============================================================================

/// Format a date with a host pattern, falling back to `M/d/yyyy`.
pub fn format_date(d: &NaiveDateTime, format: Option<&str>) -> String {
    let strftime = match format {
        None | Some("") => {
            if d.hour() == 0 && d.minute() == 0 && d.second() == 0 {
                DEFAULT_DATE.to_string()
            } else {
                DEFAULT_DATE_TIME.to_string()
            }
        }
        Some("d") => DEFAULT_DATE.to_string(),
        Some("D") => "%A, %B %-d, %Y".to_string(),
        Some("t") => "%-I:%M %p".to_string(),
        Some("T") => "%-I:%M:%S %p".to_string(),
        Some("g") => "%-m/%-d/%Y %-I:%M %p".to_string(),
        Some("G") => DEFAULT_DATE_TIME.to_string(),
        Some(pattern) => to_strftime(pattern),
    };
    d.format(&strftime).to_string()
}

/// Translate a custom date pattern into a strftime string.
fn to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' || c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != c {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                push_literal(&mut out, next);
            }
            i += 2;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token = match (c, run) {
            ('y', 1..=2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', 2) => Some("%d"),
            ('d', 3) => Some("%a"),
            ('d', _) => Some("%A"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('t', _) => Some("%p"),
            _ => None,
        };

        match token {
            Some(t) => out.push_str(t),
            None => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
            }
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
