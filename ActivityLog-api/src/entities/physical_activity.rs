use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use activity_log_domain::entities::{
    ActivityLevel, ActivityMultiStatus, ActivityQuery, HeartRateZones, PhysicalActivity, ZoneBound,
};

use super::common::PublicErrorResponse;

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: usize = 100;

/// Time spent at one intensity level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicActivityLevel {
    /// One of sedentary, light, fair or very
    #[schema(example = "very")]
    pub name: String,
    /// Milliseconds spent at this level
    #[schema(example = 998000)]
    pub duration: f64,
}

/// Bounds and time spent in one heart rate zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicZoneBound {
    #[schema(example = 91)]
    pub min: u32,
    #[schema(example = 127)]
    pub max: u32,
    /// Milliseconds spent in the zone
    #[schema(example = 0)]
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicHeartRateZones {
    pub out_of_range: PublicZoneBound,
    pub fat_burn: PublicZoneBound,
    pub cardio: PublicZoneBound,
    pub peak: PublicZoneBound,
}

/// A stored physical activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicPhysicalActivity {
    /// Identifier assigned on creation (32 hexadecimal characters)
    #[schema(example = "5c0d2b7ae2fc4b4c9f4e8a1d3b6c7e90")]
    pub id: String,
    #[schema(example = "5a62be07d6f33400146c9b615a62be07")]
    pub patient_id: String,
    #[schema(example = "Walk")]
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds between start_time and end_time
    #[schema(example = 1178000)]
    pub duration: u64,
    #[schema(example = 109)]
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<PublicActivityLevel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_zones: Option<PublicHeartRateZones>,
}

/// Request body for one physical activity. Send an array of these to register a batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhysicalActivityRequest {
    /// ISO 8601 date-time
    #[schema(example = "2018-12-14T12:52:59Z")]
    pub start_time: String,
    /// ISO 8601 date-time, not before start_time
    #[schema(example = "2018-12-14T13:12:37Z")]
    pub end_time: String,
    /// Milliseconds, must equal end_time minus start_time
    #[schema(example = 1178000)]
    pub duration: u64,
    /// Replaced by the patient in the path
    pub patient_id: Option<String>,
    #[schema(example = "Walk")]
    pub name: String,
    #[schema(example = 109)]
    pub calories: f64,
    pub steps: Option<f64>,
    pub distance: Option<f64>,
    /// Must cover sedentary, light, fair and very when not empty
    pub levels: Option<Vec<PublicActivityLevel>>,
    pub heart_rate_average: Option<f64>,
    pub heart_rate_zones: Option<PublicHeartRateZones>,
}

/// A stored batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicStatusSuccess {
    #[schema(example = 201)]
    pub code: u16,
    pub item: PublicPhysicalActivity,
}

/// A rejected batch item, echoed back as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicStatusError {
    #[schema(example = 409)]
    pub code: u16,
    pub message: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub item: Value,
}

/// Per-item report for a batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicMultiStatus {
    pub success: Vec<PublicStatusSuccess>,
    pub error: Vec<PublicStatusError>,
}

/// Query parameters for reading a patient's activities
#[derive(Debug, Default, Clone, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ActivityQueryParams {
    /// Only activities starting at or after this ISO 8601 date-time
    pub start_date: Option<String>,
    /// Only activities starting at or before this ISO 8601 date-time
    pub end_date: Option<String>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 100))]
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<usize>,
    /// Number of activities to skip
    pub offset: Option<usize>,
    /// asc or desc by start_time (default: desc)
    #[validate(custom = "validate_sort")]
    pub sort: Option<String>,
}

fn validate_sort(sort: &str) -> Result<(), validator::ValidationError> {
    match sort {
        "asc" | "desc" => Ok(()),
        _ => Err(validator::ValidationError::new("sort")),
    }
}

impl ActivityQueryParams {
    /// Check the parameters and turn them into a domain query
    pub fn to_query(&self) -> Result<ActivityQuery, PublicErrorResponse> {
        if let Err(errors) = self.validate() {
            let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
            fields.sort_unstable();
            return Err(PublicErrorResponse::bad_request(format!(
                "{}: invalid query parameter value!",
                fields.join(", ")
            )));
        }

        Ok(ActivityQuery {
            start_date: parse_date("start_date", self.start_date.as_deref())?,
            end_date: parse_date("end_date", self.end_date.as_deref())?,
            limit: Some(self.limit.unwrap_or(DEFAULT_LIMIT)),
            offset: self.offset,
            sort_desc: self.sort.as_deref().map(|sort| sort == "desc"),
        })
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, PublicErrorResponse> {
    value
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|_| {
                    PublicErrorResponse::bad_request(format!("{} is not in valid ISO 8601 date-time format!", field))
                })
        })
        .transpose()
}

impl From<ZoneBound> for PublicZoneBound {
    fn from(bound: ZoneBound) -> Self {
        Self { min: bound.min, max: bound.max, duration: bound.duration }
    }
}

impl From<HeartRateZones> for PublicHeartRateZones {
    fn from(zones: HeartRateZones) -> Self {
        Self {
            out_of_range: zones.out_of_range.into(),
            fat_burn: zones.fat_burn.into(),
            cardio: zones.cardio.into(),
            peak: zones.peak.into(),
        }
    }
}

impl From<ActivityLevel> for PublicActivityLevel {
    fn from(level: ActivityLevel) -> Self {
        Self { name: level.name.as_str().to_string(), duration: level.duration }
    }
}

impl From<PhysicalActivity> for PublicPhysicalActivity {
    fn from(activity: PhysicalActivity) -> Self {
        Self {
            id: activity.id,
            patient_id: activity.patient_id,
            name: activity.name,
            start_time: activity.start_time,
            end_time: activity.end_time,
            duration: activity.duration,
            calories: activity.calories,
            steps: activity.steps,
            distance: activity.distance,
            levels: activity.levels.map(|levels| levels.into_iter().map(Into::into).collect()),
            heart_rate_average: activity.heart_rate_average,
            heart_rate_zones: activity.heart_rate_zones.map(Into::into),
        }
    }
}

impl From<ActivityMultiStatus> for PublicMultiStatus {
    fn from(report: ActivityMultiStatus) -> Self {
        Self {
            success: report
                .success
                .into_iter()
                .map(|status| PublicStatusSuccess { code: status.code, item: status.item.into() })
                .collect(),
            error: report
                .error
                .into_iter()
                .map(|status| PublicStatusError {
                    code: status.code,
                    message: status.message,
                    description: status.description,
                    item: status.item,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_log_domain::entities::{ItemOutcome, LevelName, MultiStatus, StatusError};
    use serde_json::json;

    #[test]
    fn test_default_query() {
        let query = ActivityQueryParams::default().to_query().unwrap();

        assert_eq!(query.limit, Some(DEFAULT_LIMIT));
        assert_eq!(query.offset, None);
        assert_eq!(query.sort_desc, None);
        assert_eq!(query.start_date, None);
    }

    #[test]
    fn test_query_dates_and_sort() {
        let params = ActivityQueryParams {
            start_date: Some("2018-12-01T00:00:00Z".to_string()),
            end_date: Some("2018-12-31T23:59:59+02:00".to_string()),
            limit: Some(10),
            offset: Some(20),
            sort: Some("asc".to_string()),
        };
        let query = params.to_query().unwrap();

        assert_eq!(query.start_date.unwrap().to_rfc3339(), "2018-12-01T00:00:00+00:00");
        assert_eq!(query.end_date.unwrap().to_rfc3339(), "2018-12-31T21:59:59+00:00");
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(20));
        assert_eq!(query.sort_desc, Some(false));
    }

    #[test]
    fn test_out_of_range_limit_and_unknown_sort_are_rejected() {
        let params = ActivityQueryParams {
            limit: Some(0),
            sort: Some("sideways".to_string()),
            ..Default::default()
        };
        let err = params.to_query().unwrap_err();

        assert_eq!(err.code, 400);
        assert_eq!(err.description, "limit, sort: invalid query parameter value!");

        let params = ActivityQueryParams { limit: Some(101), ..Default::default() };
        assert!(params.to_query().is_err());
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let params = ActivityQueryParams { end_date: Some("yesterday".to_string()), ..Default::default() };

        assert_eq!(
            params.to_query().unwrap_err().description,
            "end_date is not in valid ISO 8601 date-time format!"
        );
    }

    #[test]
    fn test_multi_status_echoes_rejected_item() {
        let mut report: ActivityMultiStatus = MultiStatus::new();
        report.push(ItemOutcome::Error(StatusError {
            code: 400,
            message: "Required fields were not provided...".to_string(),
            description: "Physical activity validation: name required!".to_string(),
            item: json!({ "calories": 12 }),
        }));

        let public = PublicMultiStatus::from(report);
        assert!(public.success.is_empty());
        assert_eq!(public.error[0].code, 400);
        assert_eq!(public.error[0].item, json!({ "calories": 12 }));
    }

    #[test]
    fn test_level_names_are_lowercase() {
        let level = PublicActivityLevel::from(ActivityLevel { name: LevelName::Sedentary, duration: 0.0 });
        assert_eq!(level.name, "sedentary");
    }
}
