use std::sync::{Arc, Mutex};
use std::collections::HashMap;

use crate::models::physical_activity::{ActivityFilter, PhysicalActivity};
use super::errors::RepositoryError;

/// In-memory storage for physical activities, used when the database is not available
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    activities: Arc<Mutex<HashMap<String, PhysicalActivity>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            activities: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether an activity with the same patient and start time is stored
    pub async fn exists(&self, patient_id: &str, start_time: &chrono::DateTime<chrono::Utc>) -> Result<bool, RepositoryError> {
        let store = self.activities.lock()?;
        Ok(store
            .values()
            .any(|a| a.patient_id == patient_id && a.start_time == *start_time))
    }

    /// Store an activity, enforcing the same uniqueness as the database index
    pub async fn store_activity(&self, activity: &PhysicalActivity) -> Result<PhysicalActivity, RepositoryError> {
        let mut store = self.activities.lock()?;

        if store
            .values()
            .any(|a| a.patient_id == activity.patient_id && a.start_time == activity.start_time)
        {
            return Err(RepositoryError::Conflict(format!(
                "activity starting at {} already stored for patient {}",
                activity.start_time.to_rfc3339(),
                activity.patient_id
            )));
        }

        store.insert(activity.id.clone(), activity.clone());
        Ok(activity.clone())
    }

    /// Get an activity by ID for a patient
    pub async fn get_by_id_and_patient(&self, id: &str, patient_id: &str) -> Result<Option<PhysicalActivity>, RepositoryError> {
        let store = self.activities.lock()?;
        Ok(store
            .get(id)
            .filter(|a| a.patient_id == patient_id)
            .cloned())
    }

    /// Get a filtered page of a patient's activities
    pub async fn get_by_patient(
        &self,
        patient_id: &str,
        filter: &ActivityFilter,
    ) -> Result<(Vec<PhysicalActivity>, usize), RepositoryError> {
        let store = self.activities.lock()?;
        let owned = store
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned();

        Ok(filter.apply(owned))
    }

    /// Delete a patient's activity, returning whether anything was removed
    pub async fn delete_by_patient(&self, id: &str, patient_id: &str) -> Result<bool, RepositoryError> {
        let mut store = self.activities.lock()?;

        let owned = store.get(id).is_some_and(|a| a.patient_id == patient_id);
        if owned {
            store.remove(id);
        }

        Ok(owned)
    }

    /// Count a patient's activities
    pub async fn count_by_patient(&self, patient_id: &str) -> Result<usize, RepositoryError> {
        let store = self.activities.lock()?;
        Ok(store.values().filter(|a| a.patient_id == patient_id).count())
    }
}
