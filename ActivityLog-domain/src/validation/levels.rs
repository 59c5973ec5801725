//! Level breakdown: the time spent in each of the four canonical intensity buckets.

use std::collections::HashSet;

use serde_json::Value;

use crate::entities::physical_activity::{ActivityLevel, LevelName};
use super::primitives::non_negative_number;
use super::{FieldRule, Validation, ValidationError};

const FIELD: &str = "levels";

/// Validate a level breakdown on its own.
pub fn validate_levels(entries: &[Value]) -> Result<Vec<ActivityLevel>, ValidationError> {
    let mut validation = Validation::new();
    let levels = collect_levels(entries, &mut validation)?;
    validation.finish()?;

    Ok(levels)
}

/// Check a level breakdown as part of a larger pass.
///
/// Missing names and durations go to the accumulator as `levels[i].name` /
/// `levels[i].duration`. An empty breakdown, an unknown level name, a bad duration or
/// a breakdown that does not cover every canonical level are returned at once.
pub fn collect_levels(entries: &[Value], validation: &mut Validation) -> Result<Vec<ActivityLevel>, ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::invalid(FIELD, FieldRule::LevelsIncomplete));
    }

    let mut names = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match present(entry, "name") {
            None => {
                validation.missing(format!("{}[{}].name", FIELD, index));
                names.push(None);
            },
            Some(name) => {
                let level = name
                    .as_str()
                    .and_then(LevelName::parse)
                    .ok_or_else(|| ValidationError::invalid(format!("{}[{}].name", FIELD, index), FieldRule::UnknownLevelName))?;
                names.push(Some(level));
            },
        }
    }

    let mut levels = Vec::with_capacity(entries.len());
    for (index, (entry, name)) in entries.iter().zip(&names).enumerate() {
        let Some(name) = name else {
            continue;
        };

        let field = format!("{}[{}].duration", FIELD, index);
        match present(entry, "duration") {
            None => validation.missing(field),
            Some(duration) => levels.push(ActivityLevel {
                name: *name,
                duration: non_negative_number(&field, duration)?,
            }),
        }
    }

    let covered: HashSet<LevelName> = names.iter().flatten().copied().collect();
    if covered.len() < LevelName::ALL.len() {
        return Err(ValidationError::invalid(FIELD, FieldRule::LevelsIncomplete));
    }

    Ok(levels)
}

/// A non-null member of a level entry. Entries that are not objects have no members.
fn present<'a>(entry: &'a Value, key: &str) -> Option<&'a Value> {
    entry.get(key).filter(|value| !value.is_null())
}
