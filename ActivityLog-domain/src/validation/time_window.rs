//! Start time, end time, declared duration and owner of an activity.

use chrono::{DateTime, Utc};

use crate::entities::physical_activity::ActivityCandidate;
use super::primitives::{datetime, identifier, non_negative_number};
use super::{FieldRule, Validation, ValidationError};

/// The validated time window of a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds, equal to `end_time - start_time`
    pub duration: u64,
    pub patient_id: String,
}

/// Validate the time window and owner of a candidate.
///
/// Missing fields are reported together. Once both times parse, an end before the start or
/// a duration that does not match them fails at once.
pub fn validate_time_window(candidate: &ActivityCandidate) -> Result<TimeWindow, ValidationError> {
    let mut validation = Validation::new();

    let start_time = validation
        .require("start_time", candidate.start_time.as_ref())
        .and_then(|value| validation.check(datetime("start_time", value)));
    let end_time = validation
        .require("end_time", candidate.end_time.as_ref())
        .and_then(|value| validation.check(datetime("end_time", value)));
    let duration = validation
        .require("duration", candidate.duration.as_ref())
        .and_then(|value| validation.check(non_negative_number("duration", value)));
    let patient_id = validation
        .require("patient_id", candidate.patient_id.as_ref())
        .and_then(|value| validation.check(identifier("patient_id", value)));

    let mut elapsed = None;
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            return Err(ValidationError::invalid("end_time", FieldRule::EndBeforeStart));
        }

        let millis = (end - start).num_milliseconds();
        if let Some(declared) = duration {
            if declared != millis as f64 {
                return Err(ValidationError::invalid("duration", FieldRule::DurationMismatch));
            }
        }
        elapsed = u64::try_from(millis).ok();
    }

    match (start_time, end_time, elapsed, patient_id) {
        (Some(start_time), Some(end_time), Some(duration), Some(patient_id)) if validation.is_clean() => Ok(TimeWindow {
            start_time,
            end_time,
            duration,
            patient_id: patient_id.to_string(),
        }),
        _ => Err(validation.into_error()),
    }
}
