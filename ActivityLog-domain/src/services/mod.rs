pub mod physical_activity;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use physical_activity::{
    create_default_physical_activity_service, PhysicalActivityService, PhysicalActivityServiceError,
    PhysicalActivityServiceTrait,
};
