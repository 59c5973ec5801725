//! Stateless checks on single JSON values.
//! Each check assumes the value is present; absence is handled by the caller.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{FieldRule, ValidationError};

/// Length of a record or patient identifier
pub const IDENTIFIER_LENGTH: usize = 32;

/// The value must be a string of at least one character
pub fn non_empty_string<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    let text = value
        .as_str()
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::InvalidString))?;

    if text.is_empty() {
        return Err(ValidationError::invalid(field, FieldRule::EmptyString));
    }

    Ok(text)
}

/// The value must be a JSON number that is not negative
pub fn non_negative_number(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let number = value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::InvalidNumber))?;

    if number < 0.0 {
        return Err(ValidationError::invalid(field, FieldRule::NegativeNumber));
    }

    Ok(number)
}

/// The value must be a strictly positive integer: a JSON integer or a string of digits
/// without a leading zero
pub fn positive_bound(field: &str, value: &Value) -> Result<u32, ValidationError> {
    let bound = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => parse_positive_digits(text),
        _ => None,
    };

    bound
        .filter(|n| *n >= 1)
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::NonPositiveInteger))
}

fn parse_positive_digits(text: &str) -> Option<u32> {
    let mut chars = text.chars();
    let first = chars.next()?;

    if !('1'..='9').contains(&first) || !chars.all(|c| c.is_ascii_digit()) {
        return None;
    }

    text.parse().ok()
}

/// The value must be a JSON integer greater than or equal to zero
pub fn non_negative_integer(field: &str, value: &Value) -> Result<u64, ValidationError> {
    value
        .as_u64()
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::NegativeInteger))
}

/// Whether the text has the identifier shape used by the storage layer
pub fn is_identifier(text: &str) -> bool {
    text.len() == IDENTIFIER_LENGTH && text.chars().all(|c| c.is_ascii_hexdigit())
}

/// The value must be a well-formed identifier
pub fn identifier<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .filter(|text| is_identifier(text))
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::MalformedIdentifier))
}

/// The value must be an RFC 3339 date-time string
pub fn datetime(field: &str, value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|time| time.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::invalid(field, FieldRule::InvalidDatetime))
}
