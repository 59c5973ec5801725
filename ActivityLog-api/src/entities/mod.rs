// Public API entities
// These are the types documented in the OpenAPI schema and returned to clients.

pub mod common;
pub mod physical_activity;

pub use common::PublicErrorResponse;
pub use physical_activity::{
    ActivityQueryParams, PhysicalActivityRequest, PublicActivityLevel, PublicHeartRateZones, PublicMultiStatus,
    PublicPhysicalActivity, PublicStatusError, PublicStatusSuccess, PublicZoneBound,
};
