// Storage models
pub mod physical_activity;

pub use physical_activity::{
    ActivityFilter, ActivityLevel, CreatePhysicalActivityRequest, HeartRateZones, PhysicalActivity, ZoneBound,
};
