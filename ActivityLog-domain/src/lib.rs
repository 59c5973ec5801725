// ActivityLog Domain
// This crate contains the business logic for the ActivityLog application

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Validation rules for candidate activity records
pub mod validation;

// Health checks and system status
pub mod health;

// Re-export the database module from the data layer for convenience
pub use activity_log_data::database;

// Testing utilities - available to this crate's tests and with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
