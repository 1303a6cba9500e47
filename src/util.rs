//! Utility module, a grab-bag of functionality

use metric::FieldValue;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^[0-9]+\.[0-9]*$").unwrap();
    static ref HUMAN_SIZE: Regex = Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s*([BKMGTPEZY])$").unwrap();
}

/// Size suffixes understood by `human2bytes`, smallest first. Each step is a
/// factor of 1024.
pub const SIZE_SYMBOLS: [char; 9] = ['B', 'K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

/// Replace every character that is not alphanumeric, a hyphen or an
/// underscore with an underscore.
pub fn convert_to_alnum(s: &str) -> String {
    NON_ALNUM.replace_all(s, "_").into_owned()
}

/// Convert a human readable size such as `1.5T` or `512M` into bytes.
///
/// Returns `None` when the string is not a number followed by one of
/// `SIZE_SYMBOLS`. Sizes that do not fit in an `i64` saturate.
pub fn human2bytes(s: &str) -> Option<i64> {
    let upper = s.trim().to_uppercase();
    let caps = HUMAN_SIZE.captures(&upper)?;
    let num: f64 = caps[1].parse().ok()?;
    let letter = caps[2].chars().next()?;
    let power = SIZE_SYMBOLS.iter().position(|c| *c == letter)?;
    let bytes = num * 1024f64.powi(power as i32);
    if bytes >= i64::max_value() as f64 {
        Some(i64::max_value())
    } else {
        Some(bytes as i64)
    }
}

/// Interpret a raw value scraped from a command-line report.
///
/// Plain digit strings become integers, `digits.digits` become floats,
/// human readable sizes become integer bytes and anything else is kept as
/// normalized text.
pub fn parse_scalar(raw: &str) -> FieldValue {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = raw.parse::<i64>() {
            return FieldValue::Integer(i);
        }
    }
    if DECIMAL.is_match(raw) {
        if let Ok(f) = raw.parse::<f64>() {
            return FieldValue::Float(f);
        }
    }
    if let Some(bytes) = human2bytes(raw) {
        return FieldValue::Integer(bytes);
    }
    FieldValue::Text(convert_to_alnum(raw))
}
