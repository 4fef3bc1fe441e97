//! Recipient phone normalization and validation.
//!
//! Numbers are canonicalized to an E.164-like `+<country><number>` form. A
//! bare 10-digit number is treated as domestic and gets [`DEFAULT_COUNTRY_CODE`].
//! Validity is stricter than normalization: only domestic mobile numbers
//! (first significant digit 6-9) are accepted.

use serde::Serialize;

/// Country code assumed for 10-digit numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Number of digits in a domestic mobile number.
const DOMESTIC_LEN: usize = 10;

/// Number of digits in a domestic number carrying the country code.
const INTERNATIONAL_LEN: usize = DOMESTIC_LEN + DEFAULT_COUNTRY_CODE.len();

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn is_mobile_lead(c: Option<char>) -> bool {
    matches!(c, Some('6'..='9'))
}

/// Canonicalize a raw phone number.
///
/// - 10 digits: prefixed with `+91`.
/// - 12 digits starting with `91`: prefixed with `+`.
/// - anything else: best effort `+<digits>`, never a doubled `+`. A raw
///   value that already starts with `+` is still stripped to its digits.
pub fn normalize(raw: &str) -> String {
    let cleaned = digits(raw);
    if cleaned.len() == DOMESTIC_LEN {
        return format!("+{DEFAULT_COUNTRY_CODE}{cleaned}");
    }
    format!("+{cleaned}")
}

/// Whether `raw` is a dialable domestic mobile number.
pub fn is_valid(raw: &str) -> bool {
    let cleaned = digits(raw);
    match cleaned.len() {
        DOMESTIC_LEN => is_mobile_lead(cleaned.chars().next()),
        INTERNATIONAL_LEN => {
            cleaned.starts_with(DEFAULT_COUNTRY_CODE)
                && is_mobile_lead(cleaned[DEFAULT_COUNTRY_CODE.len()..].chars().next())
        }
        _ => false,
    }
}

/// A notification recipient derived from a stored phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub raw: String,
    pub normalized: String,
    pub is_valid: bool,
}

impl Recipient {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
            is_valid: is_valid(raw),
        }
    }
}
