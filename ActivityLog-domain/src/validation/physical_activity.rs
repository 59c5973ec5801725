//! Validation of a whole candidate physical activity.

use serde_json::Value;
use tracing::debug;

use crate::entities::physical_activity::{ActivityCandidate, NewPhysicalActivity};
use super::heart_rate_zones::collect_heart_rate_zones;
use super::levels::collect_levels;
use super::primitives::{non_empty_string, non_negative_number};
use super::time_window::validate_time_window;
use super::{FieldRule, Validation, ValidationError};

/// Validate a candidate and produce the record to store.
///
/// Missing fields from the time window and from the record itself are reported together.
/// Otherwise the first invalid field, in declaration order, is reported. Validation has no
/// side effects, so validating the same candidate twice gives the same result.
pub fn validate_physical_activity(candidate: &ActivityCandidate) -> Result<NewPhysicalActivity, ValidationError> {
    let mut validation = Validation::new();

    let window = match validate_time_window(candidate) {
        Ok(window) => Some(window),
        Err(ValidationError::RequiredFields { fields }) => {
            validation.extend_missing(fields);
            None
        },
        Err(error) => return Err(error),
    };

    let name = validation
        .require("name", candidate.name.as_ref())
        .and_then(|value| validation.check(non_empty_string("name", value)));
    let calories = validation
        .require("calories", candidate.calories.as_ref())
        .and_then(|value| validation.check(non_negative_number("calories", value)));
    let steps = optional_number(&mut validation, "steps", candidate.steps.as_ref());
    let distance = optional_number(&mut validation, "distance", candidate.distance.as_ref());

    let levels = match candidate.levels.as_ref() {
        None => None,
        Some(Value::Array(entries)) if entries.is_empty() => None,
        Some(Value::Array(entries)) => match collect_levels(entries, &mut validation) {
            Ok(levels) => Some(levels),
            Err(error) => return Err(validation.first_invalid_or(error)),
        },
        Some(_) => {
            return Err(validation.first_invalid_or(ValidationError::invalid("levels", FieldRule::InvalidLevels)));
        },
    };

    let heart_rate_average = optional_number(&mut validation, "heart_rate_average", candidate.heart_rate_average.as_ref());
    let heart_rate_zones = candidate
        .heart_rate_zones
        .as_ref()
        .map(|value| collect_heart_rate_zones(value, &mut validation));

    match (window, name, calories) {
        (Some(window), Some(name), Some(calories)) if validation.is_clean() => {
            debug!("Physical activity candidate for patient {} is valid", window.patient_id);

            Ok(NewPhysicalActivity {
                patient_id: window.patient_id,
                name: name.trim().to_string(),
                start_time: window.start_time,
                end_time: window.end_time,
                duration: window.duration,
                calories,
                steps,
                distance,
                levels,
                heart_rate_average,
                heart_rate_zones: heart_rate_zones.flatten(),
            })
        },
        _ => Err(validation.into_error()),
    }
}

fn optional_number(validation: &mut Validation, field: &str, value: Option<&Value>) -> Option<f64> {
    value.and_then(|value| validation.check(non_negative_number(field, value)))
}
