// Domain entities and value objects
pub mod physical_activity;
pub mod outcome;
pub mod conversions;

// Re-export common types for easier imports
pub use physical_activity::{
    ActivityCandidate, ActivityLevel, ActivityQuery, ActivitySubmission, HeartRateZones, LevelName,
    NewPhysicalActivity, PhysicalActivity, ZoneBound,
};
pub use outcome::{ActivityMultiStatus, ItemOutcome, MultiStatus, StatusError, StatusSuccess, SubmissionOutcome};
