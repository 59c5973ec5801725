use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Storage model for a physical activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalActivity {
    /// Unique identifier assigned on creation
    pub id: String,

    /// Identifier of the patient who owns the activity
    pub patient_id: String,

    /// Free-text activity name
    pub name: String,

    /// When the activity started
    pub start_time: DateTime<Utc>,

    /// When the activity ended
    pub end_time: DateTime<Utc>,

    /// Declared duration in milliseconds
    pub duration: u64,

    /// Calories burned
    pub calories: f64,

    /// Optional step count
    pub steps: Option<f64>,

    /// Optional distance
    pub distance: Option<f64>,

    /// Optional per-intensity duration breakdown
    pub levels: Option<Vec<ActivityLevel>>,

    /// Optional average heart rate
    pub heart_rate_average: Option<f64>,

    /// Optional heart rate zone set
    pub heart_rate_zones: Option<HeartRateZones>,
}

/// Input data for creating a new physical activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePhysicalActivityRequest {
    pub patient_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: u64,
    pub calories: f64,
    pub steps: Option<f64>,
    pub distance: Option<f64>,
    pub levels: Option<Vec<ActivityLevel>>,
    pub heart_rate_average: Option<f64>,
    pub heart_rate_zones: Option<HeartRateZones>,
}

impl CreatePhysicalActivityRequest {
    /// Attach an identifier, producing the stored form
    pub fn into_activity(self, id: String) -> PhysicalActivity {
        PhysicalActivity {
            id,
            patient_id: self.patient_id,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            calories: self.calories,
            steps: self.steps,
            distance: self.distance,
            levels: self.levels,
            heart_rate_average: self.heart_rate_average,
            heart_rate_zones: self.heart_rate_zones,
        }
    }
}

/// One bucket of the intensity breakdown. The name is kept as text in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLevel {
    pub name: String,
    pub duration: f64,
}

/// The four heart rate zones of an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub out_of_range: ZoneBound,
    pub fat_burn: ZoneBound,
    pub cardio: ZoneBound,
    pub peak: ZoneBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBound {
    pub min: u32,
    pub max: u32,
    pub duration: u64,
}

/// Filtering, sorting and pagination applied when listing a patient's activities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    /// Only activities starting at or after this instant
    pub start_date: Option<DateTime<Utc>>,

    /// Only activities starting at or before this instant
    pub end_date: Option<DateTime<Utc>>,

    pub limit: Option<usize>,

    pub offset: Option<usize>,

    /// Newest first unless set to false
    pub sort_desc: Option<bool>,
}

impl ActivityFilter {
    /// Check whether an activity falls within the date window
    pub fn matches(&self, activity: &PhysicalActivity) -> bool {
        if let Some(start) = self.start_date {
            if activity.start_time < start {
                return false;
            }
        }

        if let Some(end) = self.end_date {
            if activity.start_time > end {
                return false;
            }
        }

        true
    }

    /// Filter, sort and paginate a set of activities.
    /// Returns the requested page and the number of matches before pagination.
    pub fn apply(&self, activities: impl IntoIterator<Item = PhysicalActivity>) -> (Vec<PhysicalActivity>, usize) {
        let sort_desc = self.sort_desc.unwrap_or(true);

        let mut matching: Vec<PhysicalActivity> = activities
            .into_iter()
            .filter(|activity| self.matches(activity))
            .collect();

        matching.sort_by(|a, b| {
            let cmp = a.start_time.cmp(&b.start_time);
            if sort_desc {
                cmp.reverse()
            } else {
                cmp
            }
        });

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        (page, total)
    }
}
