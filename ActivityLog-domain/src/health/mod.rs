//! Health reporting for the service and its database

use std::collections::HashMap;
use activity_log_data::database;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Overall status, the worst of the component statuses
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    /// Working with reduced capacity
    Degraded,
    Unhealthy,
}

/// Status of one component, with an optional explanation
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

impl HealthComponent {
    pub fn healthy() -> Self {
        Self { status: ComponentStatus::Healthy, details: None }
    }

    pub fn degraded(details: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Degraded, details: Some(details.into()) }
    }

    pub fn unhealthy(details: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Unhealthy, details: Some(details.into()) }
    }
}

/// Health of every component, keyed by component name
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    pub components: HashMap<String, HealthComponent>,
}

impl SystemHealth {
    /// Build a report whose overall status is the worst component status
    pub fn from_components(components: HashMap<String, HealthComponent>) -> Self {
        let has = |status: ComponentStatus| components.values().any(|c| c.status == status);
        let status = if has(ComponentStatus::Unhealthy) {
            SystemStatus::Unhealthy
        } else if has(ComponentStatus::Degraded) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        Self { status, components }
    }
}

#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    async fn get_system_health(&self) -> SystemHealth;

    /// `Ok(true)` when the database is usable, `Ok(false)` when every connection is busy,
    /// `Err` when no connection can be obtained
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check out a connection from the global pool
pub async fn check_database_status() -> Result<bool, String> {
    match database::get_connection_info() {
        Ok(info) if info.is_saturated() => {
            warn!("Database pool is saturated: {}", info);
            Ok(false)
        },
        Ok(info) => {
            debug!("Database check passed: {}", info);
            Ok(true)
        },
        Err(e) => Err(format!("Database connection error: {}", e)),
    }
}

/// Report the database and API components
pub async fn get_system_health() -> SystemHealth {
    let database = match check_database_status().await {
        Ok(true) => HealthComponent::healthy(),
        Ok(false) => HealthComponent::degraded("Every database connection is in use"),
        Err(e) => {
            warn!("Database health check failed: {}", e);
            HealthComponent::unhealthy(e)
        },
    };

    let mut components = HashMap::new();
    components.insert("database".to_string(), database);
    components.insert("api".to_string(), HealthComponent::healthy());

    SystemHealth::from_components(components)
}

/// Health service backed by the global database pool
#[derive(Debug, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        HealthService
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        get_system_health().await
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_system_health() {
        let health = HealthService::new().get_system_health().await;
        // The global pool may or may not be initialized in the test process
        assert!(health.components.contains_key("database"));
        assert_eq!(health.components["api"].status, ComponentStatus::Healthy);
    }

    #[test]
    fn test_overall_status_is_worst_component() {
        let mut components = HashMap::new();
        components.insert("database".to_string(), HealthComponent::degraded("slow"));
        components.insert("api".to_string(), HealthComponent::healthy());
        assert_eq!(SystemHealth::from_components(components.clone()).status, SystemStatus::Degraded);

        components.insert("cache".to_string(), HealthComponent::unhealthy("down"));
        assert_eq!(SystemHealth::from_components(components).status, SystemStatus::Unhealthy);

        assert_eq!(SystemHealth::from_components(HashMap::new()).status, SystemStatus::Healthy);
    }
}
