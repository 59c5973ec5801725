use tracing::{debug, error, warn};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::physical_activity::{ActivityFilter, CreatePhysicalActivityRequest, PhysicalActivity};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for physical activities.
///
/// Equivalence for [`exists`](PhysicalActivityRepositoryTrait::exists) is owned by the
/// implementation; the provided repositories treat two activities as equivalent when they
/// share the patient and the start time.
#[async_trait]
pub trait PhysicalActivityRepositoryTrait {
    /// Check whether an activity equivalent to the request is already stored
    async fn exists(&self, request: &CreatePhysicalActivityRequest) -> Result<bool, RepositoryError>;

    /// Store a new activity, assigning its identifier
    async fn create(&self, request: CreatePhysicalActivityRequest) -> Result<PhysicalActivity, RepositoryError>;

    /// Get an activity by ID, only if it belongs to the patient
    async fn get_by_id_and_patient(&self, id: &str, patient_id: &str) -> Result<Option<PhysicalActivity>, RepositoryError>;

    /// Get a filtered page of a patient's activities together with the total match count
    async fn get_by_patient(
        &self,
        patient_id: &str,
        filter: &ActivityFilter,
    ) -> Result<(Vec<PhysicalActivity>, usize), RepositoryError>;

    /// Delete a patient's activity, returning whether anything was removed
    async fn delete_by_patient(&self, id: &str, patient_id: &str) -> Result<bool, RepositoryError>;

    /// Count a patient's activities
    async fn count_by_patient(&self, patient_id: &str) -> Result<usize, RepositoryError>;
}

/// Generate a new activity identifier: 32 lowercase hexadecimal characters
pub fn generate_activity_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Repository for physical activities.
/// Uses the global SQLite pool when it is initialized, in-memory storage otherwise.
#[derive(Debug, Clone, Default)]
pub struct PhysicalActivityRepository {
    /// In-memory storage for when database is not available
    storage: InMemoryStorage,
}

impl PhysicalActivityRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }
}

#[async_trait]
impl PhysicalActivityRepositoryTrait for PhysicalActivityRepository {
    async fn exists(&self, request: &CreatePhysicalActivityRequest) -> Result<bool, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::exists(&pool, &request.patient_id, &request.start_time).await {
                    Ok(found) => Ok(found),
                    Err(e) => {
                        error!("Failed to check for existing activity in database: {}", e);
                        self.storage.exists(&request.patient_id, &request.start_time).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for exists", e);
                self.storage.exists(&request.patient_id, &request.start_time).await
            }
        }
    }

    async fn create(&self, request: CreatePhysicalActivityRequest) -> Result<PhysicalActivity, RepositoryError> {
        let activity = request.into_activity(generate_activity_id());

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing physical activity in database: {}", activity.id);
                match DatabaseStorage::store_activity(&pool, &activity).await {
                    Ok(()) => Ok(activity),
                    // Never fall back to memory after a recognised duplicate
                    Err(e) if e.is_conflict() => {
                        warn!("Physical activity rejected by unique index: {}", e);
                        Err(e)
                    },
                    Err(e) => {
                        error!("Failed to store activity in database: {}", e);
                        self.storage.store_activity(&activity).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_activity(&activity).await
            }
        }
    }

    async fn get_by_id_and_patient(&self, id: &str, patient_id: &str) -> Result<Option<PhysicalActivity>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::get_by_id_and_patient(&pool, id, patient_id).await {
                    Ok(activity) => Ok(activity),
                    Err(e) => {
                        error!("Failed to get activity by ID from database: {}", e);
                        self.storage.get_by_id_and_patient(id, patient_id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id_and_patient", e);
                self.storage.get_by_id_and_patient(id, patient_id).await
            }
        }
    }

    async fn get_by_patient(
        &self,
        patient_id: &str,
        filter: &ActivityFilter,
    ) -> Result<(Vec<PhysicalActivity>, usize), RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::get_by_patient(&pool, patient_id, filter).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        error!("Failed to get filtered activities from database: {}", e);
                        self.storage.get_by_patient(patient_id, filter).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_patient", e);
                self.storage.get_by_patient(patient_id, filter).await
            }
        }
    }

    async fn delete_by_patient(&self, id: &str, patient_id: &str) -> Result<bool, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::delete_by_patient(&pool, id, patient_id).await,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for delete_by_patient", e);
                self.storage.delete_by_patient(id, patient_id).await
            }
        }
    }

    async fn count_by_patient(&self, patient_id: &str) -> Result<usize, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::count_by_patient(&pool, patient_id).await {
                    Ok(total) => Ok(total),
                    Err(e) => {
                        error!("Failed to count activities in database: {}", e);
                        self.storage.count_by_patient(patient_id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for count_by_patient", e);
                self.storage.count_by_patient(patient_id).await
            }
        }
    }
}

/// Mock physical activity repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Stateful in-memory repository with switchable failures.
    /// Clones share state, so a test can keep a handle after moving one into a service.
    #[derive(Debug, Clone, Default)]
    pub struct MockPhysicalActivityRepository {
        activities: Arc<Mutex<Vec<PhysicalActivity>>>,
        fail_exists: bool,
        fail_create: bool,
    }

    impl MockPhysicalActivityRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined activities
        pub fn with_activities(activities: Vec<PhysicalActivity>) -> Self {
            Self {
                activities: Arc::new(Mutex::new(activities)),
                ..Self::default()
            }
        }

        /// Make every conflict check fail with a storage error
        pub fn with_exists_failure(mut self) -> Self {
            self.fail_exists = true;
            self
        }

        /// Make every create fail with a storage error
        pub fn with_create_failure(mut self) -> Self {
            self.fail_create = true;
            self
        }

        /// Snapshot of the stored activities, in insertion order
        pub fn stored(&self) -> Vec<PhysicalActivity> {
            self.activities.lock().map(|a| a.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl PhysicalActivityRepositoryTrait for MockPhysicalActivityRepository {
        async fn exists(&self, request: &CreatePhysicalActivityRequest) -> Result<bool, RepositoryError> {
            if self.fail_exists {
                return Err(RepositoryError::Lock("mock is configured to fail exists".to_string()));
            }

            let activities = self.activities.lock()?;
            Ok(activities
                .iter()
                .any(|a| a.patient_id == request.patient_id && a.start_time == request.start_time))
        }

        async fn create(&self, request: CreatePhysicalActivityRequest) -> Result<PhysicalActivity, RepositoryError> {
            if self.fail_create {
                return Err(RepositoryError::Lock("mock is configured to fail create".to_string()));
            }

            let activity = request.into_activity(generate_activity_id());
            self.activities.lock()?.push(activity.clone());
            Ok(activity)
        }

        async fn get_by_id_and_patient(&self, id: &str, patient_id: &str) -> Result<Option<PhysicalActivity>, RepositoryError> {
            let activities = self.activities.lock()?;
            Ok(activities
                .iter()
                .find(|a| a.id == id && a.patient_id == patient_id)
                .cloned())
        }

        async fn get_by_patient(
            &self,
            patient_id: &str,
            filter: &ActivityFilter,
        ) -> Result<(Vec<PhysicalActivity>, usize), RepositoryError> {
            let activities = self.activities.lock()?;
            let owned = activities
                .iter()
                .filter(|a| a.patient_id == patient_id)
                .cloned();

            Ok(filter.apply(owned))
        }

        async fn delete_by_patient(&self, id: &str, patient_id: &str) -> Result<bool, RepositoryError> {
            let mut activities = self.activities.lock()?;
            let before = activities.len();
            activities.retain(|a| !(a.id == id && a.patient_id == patient_id));
            Ok(activities.len() < before)
        }

        async fn count_by_patient(&self, patient_id: &str) -> Result<usize, RepositoryError> {
            let activities = self.activities.lock()?;
            Ok(activities.iter().filter(|a| a.patient_id == patient_id).count())
        }
    }
}
