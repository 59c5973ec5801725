//! Heart rate zone set: four named zones, each with min, max and duration.

use serde_json::Value;

use crate::entities::physical_activity::{HeartRateZones, ZoneBound};
use super::primitives::{non_negative_integer, positive_bound};
use super::{FieldRule, Validation, ValidationError};

const FIELD: &str = "heart_rate_zones";

/// Order in which absent zones and zone values are reported as missing
const REQUIRED_ORDER: [&str; 4] = ["fat_burn", "cardio", "peak", "out_of_range"];

/// Order in which invalid zone values are listed
const INVALID_ORDER: [&str; 4] = ["out_of_range", "fat_burn", "cardio", "peak"];

/// Validate a heart rate zone set on its own
pub fn validate_heart_rate_zones(value: &Value) -> Result<HeartRateZones, ValidationError> {
    let mut validation = Validation::new();
    match collect_heart_rate_zones(value, &mut validation) {
        Some(zones) if validation.is_clean() => Ok(zones),
        _ => Err(validation.into_error()),
    }
}

/// Check a heart rate zone set as part of a larger pass.
///
/// Absent zones and zone values go to the accumulator. Every malformed value is gathered
/// into one deferred violation. Returns the zones only if all of them are well formed.
pub fn collect_heart_rate_zones(value: &Value, validation: &mut Validation) -> Option<HeartRateZones> {
    let Some(zones) = value.as_object() else {
        validation.defer(ValidationError::invalid(FIELD, FieldRule::InvalidZoneSet));
        return None;
    };

    let mut invalid: Vec<String> = Vec::new();
    let mut parsed: [Option<ZoneBound>; 4] = [None; 4];

    for (slot, zone) in REQUIRED_ORDER.iter().enumerate() {
        let path = format!("{}.{}", FIELD, zone);
        match zones.get(*zone).filter(|v| !v.is_null()) {
            None => validation.missing(path),
            Some(bound) => parsed[slot] = collect_bound(&path, bound, validation, &mut invalid),
        }
    }

    if !invalid.is_empty() {
        invalid.sort_by_key(|path| invalid_rank(path));
        validation.defer(ValidationError::invalid(invalid.join(", "), FieldRule::InvalidZoneValues));
        return None;
    }

    let [Some(fat_burn), Some(cardio), Some(peak), Some(out_of_range)] = parsed else {
        return None;
    };

    Some(HeartRateZones {
        out_of_range,
        fat_burn,
        cardio,
        peak,
    })
}

fn collect_bound(
    path: &str,
    bound: &Value,
    validation: &mut Validation,
    invalid: &mut Vec<String>,
) -> Option<ZoneBound> {
    let mut member = |key: &str| {
        let field = format!("{}.{}", path, key);
        let value = bound.get(key).filter(|v| !v.is_null());
        if value.is_none() {
            validation.missing(field.clone());
        }
        value.map(|v| (field, v))
    };

    let min = member("min");
    let max = member("max");
    let duration = member("duration");

    let mut checked = |result: Result<u64, ValidationError>, field: String| match result {
        Ok(n) => Some(n),
        Err(_) => {
            invalid.push(field);
            None
        },
    };

    let min = min.and_then(|(f, v)| checked(positive_bound(&f, v).map(u64::from), f));
    let max = max.and_then(|(f, v)| checked(positive_bound(&f, v).map(u64::from), f));
    let duration = duration.and_then(|(f, v)| checked(non_negative_integer(&f, v), f));

    Some(ZoneBound {
        min: u32::try_from(min?).ok()?,
        max: u32::try_from(max?).ok()?,
        duration: duration?,
    })
}

/// Position of a zone value path in the invalid listing
fn invalid_rank(path: &str) -> usize {
    INVALID_ORDER
        .iter()
        .position(|zone| path.starts_with(&format!("{}.{}.", FIELD, zone)))
        .unwrap_or(INVALID_ORDER.len())
}
