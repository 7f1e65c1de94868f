//! Display formatting for upstream scalar values.
//!
//! Upstream sends prices and mileage as numbers on some records and as
//! strings on others. Both render to one display string, and formatting an
//! already-formatted value returns it unchanged.

use serde_json::{Number, Value};

/// Renders a scalar as text: strings as-is, numbers and booleans via their
/// JSON form. `null`, arrays and objects render as `""`.
#[must_use]
pub fn value_to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// `25000` → `"$25,000"`, `"25000"` → `"$25000"`, `"$25,000"` → unchanged,
/// empty/zero/null → `""`.
#[must_use]
pub fn format_price(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => {
            grouped_whole(n).map_or_else(String::new, |digits| format!("${digits}"))
        }
        Some(Value::String(s)) if s.is_empty() => String::new(),
        Some(Value::String(s)) => {
            if !s.contains('$') && is_all_digits(s) {
                format!("${s}")
            } else {
                s.clone()
            }
        }
        _ => String::new(),
    }
}

/// `45000` → `"45,000 miles"`, `"45000"` → `"45000 miles"`, anything
/// already mentioning miles → unchanged, empty/zero/null → `""`.
#[must_use]
pub fn format_mileage(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => {
            grouped_whole(n).map_or_else(String::new, |digits| format!("{digits} miles"))
        }
        Some(Value::String(s)) if s.is_empty() => String::new(),
        Some(Value::String(s)) => {
            if !s.to_ascii_lowercase().contains("miles") && is_all_digits(s) {
                format!("{s} miles")
            } else {
                s.clone()
            }
        }
        _ => String::new(),
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Rounds to a whole number and inserts thousands separators. Zero is
/// treated as "no value" and yields `None`.
#[allow(clippy::cast_possible_truncation)]
fn grouped_whole(n: &Number) -> Option<String> {
    let whole: i128 = if let Some(i) = n.as_i64() {
        i128::from(i)
    } else if let Some(u) = n.as_u64() {
        i128::from(u)
    } else {
        let f = n.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        f.round() as i128
    };

    if whole == 0 {
        return None;
    }

    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    Some(grouped)
}
