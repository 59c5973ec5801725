use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A physical activity as submitted, before validation.
///
/// Every field is kept as raw JSON so the validators can tell a missing value from one
/// of the wrong type. A JSON `null` deserializes to `None` and counts as missing.
/// Only a JSON object deserializes into a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ActivityCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_average: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_zones: Option<Value>,
}

impl ActivityCandidate {
    /// Replace the owning patient, as done when the patient comes from the request path
    pub fn with_patient_id(mut self, patient_id: &str) -> Self {
        self.patient_id = Some(Value::String(patient_id.to_string()));
        self
    }
}

impl From<Map<String, Value>> for ActivityCandidate {
    fn from(mut members: Map<String, Value>) -> Self {
        let mut take = |key: &str| members.remove(key).filter(|value| !value.is_null());

        ActivityCandidate {
            start_time: take("start_time"),
            end_time: take("end_time"),
            duration: take("duration"),
            patient_id: take("patient_id"),
            name: take("name"),
            calories: take("calories"),
            steps: take("steps"),
            distance: take("distance"),
            levels: take("levels"),
            heart_rate_average: take("heart_rate_average"),
            heart_rate_zones: take("heart_rate_zones"),
        }
    }
}

/// A batch item. Anything but an object has no members, so every field is missing.
impl From<&Value> for ActivityCandidate {
    fn from(item: &Value) -> Self {
        match item {
            Value::Object(members) => members.clone().into(),
            _ => ActivityCandidate::default(),
        }
    }
}

/// One candidate or an ordered batch of items.
///
/// A JSON object is a single candidate and a JSON array is a batch. Batch items are kept
/// as submitted so that each one is validated, and echoed back, on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActivitySubmission {
    Batch(Vec<Value>),
    Single(ActivityCandidate),
}

impl<'de> Deserialize<'de> for ActivitySubmission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(ActivitySubmission::Batch(items)),
            Value::Object(members) => Ok(ActivitySubmission::Single(members.into())),
            _ => Err(de::Error::custom(
                "expected a physical activity object or an array of physical activities",
            )),
        }
    }
}

impl ActivitySubmission {
    /// Apply the owning patient to every candidate of the submission
    pub fn with_patient_id(self, patient_id: &str) -> Self {
        match self {
            ActivitySubmission::Single(candidate) => {
                ActivitySubmission::Single(candidate.with_patient_id(patient_id))
            },
            ActivitySubmission::Batch(items) => ActivitySubmission::Batch(
                items
                    .into_iter()
                    .map(|mut item| {
                        if let Value::Object(members) = &mut item {
                            members.insert("patient_id".to_string(), Value::String(patient_id.to_string()));
                        }
                        item
                    })
                    .collect(),
            ),
        }
    }
}

/// The four canonical intensity buckets of a level breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelName {
    Sedentary,
    Light,
    Fair,
    Very,
}

impl LevelName {
    /// All canonical levels, in their conventional order
    pub const ALL: [LevelName; 4] = [
        LevelName::Sedentary,
        LevelName::Light,
        LevelName::Fair,
        LevelName::Very,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelName::Sedentary => "sedentary",
            LevelName::Light => "light",
            LevelName::Fair => "fair",
            LevelName::Very => "very",
        }
    }

    /// Parse a canonical level name. Matching is exact.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == name)
    }
}

impl fmt::Display for LevelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket of a validated level breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLevel {
    pub name: LevelName,
    /// Time spent at this intensity, in milliseconds
    pub duration: f64,
}

/// Lower bound, upper bound and time spent in one heart rate zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBound {
    pub min: u32,
    pub max: u32,
    pub duration: u64,
}

/// The four named heart rate zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub out_of_range: ZoneBound,
    pub fat_burn: ZoneBound,
    pub cardio: ZoneBound,
    pub peak: ZoneBound,
}

/// A candidate that passed validation, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPhysicalActivity {
    pub patient_id: String,
    /// Trimmed activity name
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds between `start_time` and `end_time`
    pub duration: u64,
    pub calories: f64,
    pub steps: Option<f64>,
    pub distance: Option<f64>,
    pub levels: Option<Vec<ActivityLevel>>,
    pub heart_rate_average: Option<f64>,
    pub heart_rate_zones: Option<HeartRateZones>,
}

/// A stored physical activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalActivity {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: u64,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<ActivityLevel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_zones: Option<HeartRateZones>,
}

/// Date window, ordering and pagination for reading a patient's activities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityQuery {
    /// Only activities starting at or after this instant
    pub start_date: Option<DateTime<Utc>>,
    /// Only activities starting at or before this instant
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Newest first unless set to false
    pub sort_desc: Option<bool>,
}
