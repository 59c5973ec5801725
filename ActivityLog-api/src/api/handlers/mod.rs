pub mod health;
pub mod physical_activity;

// Re-export handlers for easier imports
pub use physical_activity::{
    create_physical_activities, delete_physical_activity, get_physical_activity, list_physical_activities,
};
pub use health::health_check;
