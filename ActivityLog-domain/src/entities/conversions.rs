use crate::entities::physical_activity::{
    ActivityLevel, ActivityQuery, HeartRateZones, LevelName, NewPhysicalActivity, PhysicalActivity, ZoneBound,
};
use activity_log_data::models::physical_activity as data;

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert a validated activity to the data layer create request
pub fn convert_to_data_create_request(activity: &NewPhysicalActivity) -> data::CreatePhysicalActivityRequest {
    data::CreatePhysicalActivityRequest {
        patient_id: activity.patient_id.clone(),
        name: activity.name.clone(),
        start_time: activity.start_time,
        end_time: activity.end_time,
        duration: activity.duration,
        calories: activity.calories,
        steps: activity.steps,
        distance: activity.distance,
        levels: activity.levels.as_ref().map(|levels| {
            levels
                .iter()
                .map(|level| data::ActivityLevel {
                    name: level.name.as_str().to_string(),
                    duration: level.duration,
                })
                .collect()
        }),
        heart_rate_average: activity.heart_rate_average,
        heart_rate_zones: activity.heart_rate_zones.as_ref().map(convert_to_data_zones),
    }
}

fn convert_to_data_zones(zones: &HeartRateZones) -> data::HeartRateZones {
    let bound = |zone: &ZoneBound| data::ZoneBound {
        min: zone.min,
        max: zone.max,
        duration: zone.duration,
    };

    data::HeartRateZones {
        out_of_range: bound(&zones.out_of_range),
        fat_burn: bound(&zones.fat_burn),
        cardio: bound(&zones.cardio),
        peak: bound(&zones.peak),
    }
}

fn convert_to_domain_zones(zones: data::HeartRateZones) -> HeartRateZones {
    let bound = |zone: data::ZoneBound| ZoneBound {
        min: zone.min,
        max: zone.max,
        duration: zone.duration,
    };

    HeartRateZones {
        out_of_range: bound(zones.out_of_range),
        fat_burn: bound(zones.fat_burn),
        cardio: bound(zones.cardio),
        peak: bound(zones.peak),
    }
}

/// Convert a stored activity to the domain entity.
/// Fails if a stored level name is not one of the canonical levels.
pub fn convert_to_domain_activity(activity: data::PhysicalActivity) -> Result<PhysicalActivity, String> {
    let levels = match activity.levels {
        Some(levels) => Some(
            levels
                .into_iter()
                .map(|level| {
                    LevelName::parse(&level.name)
                        .map(|name| ActivityLevel {
                            name,
                            duration: level.duration,
                        })
                        .ok_or_else(|| format!("Stored activity {} has unknown level '{}'", activity.id, level.name))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    Ok(PhysicalActivity {
        id: activity.id,
        patient_id: activity.patient_id,
        name: activity.name,
        start_time: activity.start_time,
        end_time: activity.end_time,
        duration: activity.duration,
        calories: activity.calories,
        steps: activity.steps,
        distance: activity.distance,
        levels,
        heart_rate_average: activity.heart_rate_average,
        heart_rate_zones: activity.heart_rate_zones.map(convert_to_domain_zones),
    })
}

/// Convert a domain query to the data layer filter
pub fn convert_to_data_filter(query: &ActivityQuery) -> data::ActivityFilter {
    data::ActivityFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
        offset: query.offset,
        sort_desc: query.sort_desc,
    }
}
