//! Validation of candidate physical activity records.
//!
//! Validators report at most one [`ValidationError`]. Missing fields are collected across a
//! whole pass and reported together; an invalid value is remembered (first one wins) and only
//! reported when nothing is missing. A few structural failures end the pass at once and are
//! returned directly with `?`.

use serde_json::Value;
use thiserror::Error;

pub mod primitives;
pub mod levels;
pub mod heart_rate_zones;
pub mod time_window;
pub mod physical_activity;

pub use heart_rate_zones::validate_heart_rate_zones;
pub use levels::validate_levels;
pub use physical_activity::validate_physical_activity;
pub use time_window::{validate_time_window, TimeWindow};

/// The rule a present field broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    InvalidString,
    EmptyString,
    InvalidNumber,
    NegativeNumber,
    /// Zone min/max must be integers of at least one
    NonPositiveInteger,
    NegativeInteger,
    MalformedIdentifier,
    InvalidDatetime,
    EndBeforeStart,
    DurationMismatch,
    LevelsIncomplete,
    UnknownLevelName,
    InvalidLevels,
    InvalidZoneSet,
    /// The field is a comma-joined list of every offending zone value
    InvalidZoneValues,
}

impl FieldRule {
    /// User-facing description of the violation for the given field
    pub fn describe(&self, field: &str) -> String {
        match self {
            FieldRule::InvalidString => format!("{} must be a string!", field),
            FieldRule::EmptyString => format!("{} must have at least one character!", field),
            FieldRule::InvalidNumber => format!("{} must be a valid number!", field),
            FieldRule::NegativeNumber => format!("{} can't be negative!", field),
            FieldRule::NonPositiveInteger => format!("{} must be an integer greater than zero!", field),
            FieldRule::NegativeInteger => format!("{} must be an integer greater than or equal to zero!", field),
            FieldRule::MalformedIdentifier => {
                format!("{} is not in valid identifier format (32 hexadecimal characters)!", field)
            },
            FieldRule::InvalidDatetime => format!("{} is not in valid ISO 8601 date-time format!", field),
            FieldRule::EndBeforeStart => "end_time cannot be older than start_time!".to_string(),
            FieldRule::DurationMismatch => {
                "duration value does not match values passed in start_time and end_time parameters!".to_string()
            },
            FieldRule::LevelsIncomplete => {
                "The levels array must have values for the following levels: sedentary, light, fair, very.".to_string()
            },
            FieldRule::UnknownLevelName => {
                "The names of the allowed levels are: sedentary, light, fair, very.".to_string()
            },
            FieldRule::InvalidLevels => format!("{} must be an array of level objects!", field),
            FieldRule::InvalidZoneSet => {
                format!("{} must be an object with out_of_range, fat_burn, cardio and peak zones!", field)
            },
            FieldRule::InvalidZoneValues => format!(
                "{}: min and max must be integers greater than zero and duration an integer greater than or equal to zero!",
                field
            ),
        }
    }
}

/// A rejected candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more fields are absent, listed in declaration order
    #[error("Physical activity validation: {} required!", .fields.join(", "))]
    RequiredFields { fields: Vec<String> },
    /// A present field broke a rule
    #[error("{}", .rule.describe(.field))]
    InvalidField { field: String, rule: FieldRule },
}

impl ValidationError {
    pub fn required(fields: Vec<String>) -> Self {
        ValidationError::RequiredFields { fields }
    }

    pub fn invalid(field: impl Into<String>, rule: FieldRule) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            rule,
        }
    }

    /// Short summary shown to the caller
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::RequiredFields { .. } => "Required fields were not provided...",
            ValidationError::InvalidField { .. } => "One or more request fields are invalid...",
        }
    }

    /// Detailed description shown to the caller
    pub fn description(&self) -> String {
        self.to_string()
    }
}

/// Accumulator for one validation pass
#[derive(Debug, Default)]
pub struct Validation {
    missing: Vec<String>,
    deferred: Option<ValidationError>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a missing field
    pub fn missing(&mut self, field: impl Into<String>) {
        self.missing.push(field.into());
    }

    /// Record several missing fields, keeping their order
    pub fn extend_missing(&mut self, fields: impl IntoIterator<Item = String>) {
        self.missing.extend(fields);
    }

    /// Return the value if present, otherwise record the field as missing
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a Value>) -> Option<&'a Value> {
        if value.is_none() {
            self.missing(field);
        }
        value
    }

    /// Remember an invalid value. Only the first one is kept.
    pub fn defer(&mut self, error: ValidationError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    /// Keep the checked value, deferring the error if the check failed
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.defer(error);
                None
            },
        }
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Nothing is missing and nothing was invalid
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.deferred.is_none()
    }

    /// The error this pass reports: missing fields win over a deferred invalid value
    pub fn into_error(self) -> ValidationError {
        match self.deferred {
            Some(error) if self.missing.is_empty() => error,
            _ => ValidationError::required(self.missing),
        }
    }

    /// End the pass on an immediate failure. An invalid value found earlier in the
    /// pass is still reported first.
    pub fn first_invalid_or(self, error: ValidationError) -> ValidationError {
        self.deferred.unwrap_or(error)
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}
