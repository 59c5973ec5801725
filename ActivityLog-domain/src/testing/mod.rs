// Fixtures and test doubles for the domain layer
// Compiled for this crate's tests and with the "mock" feature

// Re-export useful test mocks from the data layer
pub use activity_log_data::repository::tests::MockPhysicalActivityRepository;

use std::collections::HashMap;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::entities::physical_activity::ActivityCandidate;
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};
use crate::services::physical_activity::PhysicalActivityService;

/// Patient used by the fixtures
pub const PATIENT_ID: &str = "5a62be07d6f33400146c9b615a62be07";

/// A level breakdown covering all four canonical levels
pub fn complete_levels() -> Value {
    json!([
        { "name": "sedentary", "duration": 0 },
        { "name": "light", "duration": 120000 },
        { "name": "fair", "duration": 60000 },
        { "name": "very", "duration": 998000 }
    ])
}

/// A heart rate zone set with every zone fully populated
pub fn complete_zones() -> Value {
    json!({
        "out_of_range": { "min": 30, "max": 91, "duration": 0 },
        "fat_burn": { "min": 91, "max": 127, "duration": 0 },
        "cardio": { "min": 127, "max": 154, "duration": 0 },
        "peak": { "min": 154, "max": 220, "duration": 0 }
    })
}

/// A candidate that passes validation, with every optional field populated
pub fn valid_candidate() -> ActivityCandidate {
    candidate_starting_at("2018-12-14T12:52:59Z", "2018-12-14T13:12:37Z")
}

/// A valid candidate for the given time window, with a matching duration
pub fn candidate_starting_at(start_time: &str, end_time: &str) -> ActivityCandidate {
    let duration = match (
        chrono::DateTime::parse_from_rfc3339(start_time),
        chrono::DateTime::parse_from_rfc3339(end_time),
    ) {
        (Ok(start), Ok(end)) => (end - start).num_milliseconds(),
        _ => 0,
    };

    ActivityCandidate {
        start_time: Some(json!(start_time)),
        end_time: Some(json!(end_time)),
        duration: Some(json!(duration)),
        patient_id: Some(json!(PATIENT_ID)),
        name: Some(json!("Walk")),
        calories: Some(json!(109)),
        steps: Some(json!(1407)),
        distance: Some(json!(1.03)),
        levels: Some(complete_levels()),
        heart_rate_average: Some(json!(96)),
        heart_rate_zones: Some(complete_zones()),
    }
}

/// The JSON a client would send for a candidate, as a batch item
pub fn batch_item(candidate: &ActivityCandidate) -> Value {
    serde_json::to_value(candidate).unwrap_or(Value::Null)
}

/// Health service double with a configurable database status and extra components
#[derive(Debug, Clone)]
pub struct MockHealthService {
    database: HealthComponent,
    extra: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Every component healthy
    pub fn new() -> Self {
        Self {
            database: HealthComponent::healthy(),
            extra: HashMap::new(),
        }
    }

    pub fn with_degraded_database(mut self) -> Self {
        self.database = HealthComponent::degraded("Database is experiencing high load");
        self
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database = HealthComponent::unhealthy("Database connection failed");
        self
    }

    /// Report an additional component
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.extra.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = self.extra.clone();
        components.insert("database".to_string(), self.database.clone());
        components.insert("api".to_string(), HealthComponent::healthy());

        SystemHealth::from_components(components)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database.status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err(self.database.details.clone().unwrap_or_default()),
        }
    }
}

/// Factory function to create a physical activity service over a fresh mock repository.
/// The returned repository handle shares state with the service's.
pub fn create_mock_physical_activity_service() -> (PhysicalActivityService<MockPhysicalActivityRepository>, MockPhysicalActivityRepository) {
    let repository = MockPhysicalActivityRepository::new();
    (PhysicalActivityService::new(repository.clone()), repository)
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
