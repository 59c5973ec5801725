// Repository module structure
pub mod errors;
mod physical_activity;
mod in_memory;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use physical_activity::{generate_activity_id, PhysicalActivityRepository, PhysicalActivityRepositoryTrait};

// Re-export test modules for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use physical_activity::tests;
