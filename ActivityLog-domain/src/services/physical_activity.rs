use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use async_trait::async_trait;

use crate::entities::conversions;
use crate::entities::outcome::{ActivityMultiStatus, ItemOutcome, StatusError, StatusSuccess, SubmissionOutcome};
use crate::entities::physical_activity::{ActivityCandidate, ActivityQuery, ActivitySubmission, NewPhysicalActivity, PhysicalActivity};
use crate::validation::primitives::is_identifier;
use crate::validation::{validate_physical_activity, FieldRule, ValidationError};
use activity_log_data::repository::{PhysicalActivityRepositoryTrait, RepositoryError};

/// Status code reported for a stored item
pub const CREATED: u16 = 201;

/// Physical activity service errors
#[derive(Debug, Error)]
pub enum PhysicalActivityServiceError {
    /// The candidate or an identifier was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An equivalent activity is already stored for the patient
    #[error("Physical activity is already registered.")]
    Conflict(String),

    /// Not found error
    #[error("Physical activity not found!")]
    NotFound(String),

    /// Any other repository failure
    #[error("{0}")]
    Repository(String),
}

impl PhysicalActivityServiceError {
    /// HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            PhysicalActivityServiceError::Validation(_) => 400,
            PhysicalActivityServiceError::Conflict(_) => 409,
            PhysicalActivityServiceError::NotFound(_) => 404,
            PhysicalActivityServiceError::Repository(_) => 500,
        }
    }

    /// Short summary shown to the caller
    pub fn message(&self) -> String {
        match self {
            PhysicalActivityServiceError::Validation(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Detailed description shown to the caller
    pub fn description(&self) -> String {
        match self {
            PhysicalActivityServiceError::Validation(e) => e.description(),
            PhysicalActivityServiceError::Conflict(patient_id) => format!(
                "A physical activity with the same start_time is already registered for patient {}.",
                patient_id
            ),
            PhysicalActivityServiceError::NotFound(id) => {
                format!("Physical activity {} was not found for the patient.", id)
            },
            PhysicalActivityServiceError::Repository(_) => {
                "An unexpected error occurred while processing the physical activity.".to_string()
            },
        }
    }
}

/// Trait for physical activity service operations
#[async_trait]
pub trait PhysicalActivityServiceTrait {
    /// Validate a candidate without touching storage
    fn validate(&self, candidate: &ActivityCandidate) -> Result<NewPhysicalActivity, PhysicalActivityServiceError>;

    /// Validate, check for a duplicate and store one candidate
    async fn add(&self, candidate: &ActivityCandidate) -> Result<PhysicalActivity, PhysicalActivityServiceError>;

    /// Process a batch item by item, in order. Never fails as a whole.
    async fn add_many(&self, items: Vec<Value>) -> ActivityMultiStatus;

    /// Dispatch a single candidate or a batch
    async fn submit(&self, submission: ActivitySubmission) -> Result<SubmissionOutcome, PhysicalActivityServiceError>;

    /// Get a patient's activity if it lies within the query's date window
    async fn get_by_id_and_owner(
        &self,
        id: &str,
        patient_id: &str,
        query: &ActivityQuery,
    ) -> Result<Option<PhysicalActivity>, PhysicalActivityServiceError>;

    /// List a patient's activities
    async fn list_by_owner(
        &self,
        patient_id: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<PhysicalActivity>, PhysicalActivityServiceError>;

    /// Delete a patient's activity, returning whether anything was removed
    async fn remove_by_owner(&self, id: &str, patient_id: &str) -> Result<bool, PhysicalActivityServiceError>;

    /// Count a patient's activities
    async fn count_by_owner(&self, patient_id: &str) -> Result<usize, PhysicalActivityServiceError>;
}

/// Physical activity service for domain logic
pub struct PhysicalActivityService<R: PhysicalActivityRepositoryTrait> {
    repository: R,
}

impl<R: PhysicalActivityRepositoryTrait> PhysicalActivityService<R> {
    /// Create a new physical activity service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError, patient_id: &str) -> PhysicalActivityServiceError {
        match err {
            RepositoryError::Conflict(_) => PhysicalActivityServiceError::Conflict(patient_id.to_string()),
            RepositoryError::NotFound(msg) => PhysicalActivityServiceError::NotFound(msg),
            _ => {
                error!("Physical activity repository failure: {}", err);
                PhysicalActivityServiceError::Repository(err.to_string())
            },
        }
    }

    fn check_identifier(field: &str, value: &str) -> Result<(), PhysicalActivityServiceError> {
        if is_identifier(value) {
            Ok(())
        } else {
            Err(ValidationError::invalid(field, FieldRule::MalformedIdentifier).into())
        }
    }

    fn convert(&self, activity: activity_log_data::models::PhysicalActivity) -> Result<PhysicalActivity, PhysicalActivityServiceError> {
        conversions::convert_to_domain_activity(activity).map_err(PhysicalActivityServiceError::Repository)
    }
}

#[async_trait]
impl<R: PhysicalActivityRepositoryTrait + Send + Sync> PhysicalActivityServiceTrait for PhysicalActivityService<R> {
    fn validate(&self, candidate: &ActivityCandidate) -> Result<NewPhysicalActivity, PhysicalActivityServiceError> {
        Ok(validate_physical_activity(candidate)?)
    }

    async fn add(&self, candidate: &ActivityCandidate) -> Result<PhysicalActivity, PhysicalActivityServiceError> {
        let activity = self.validate(candidate).map_err(|e| {
            warn!("Physical activity rejected: {}", e);
            e
        })?;

        let request = conversions::convert_to_data_create_request(&activity);

        let exists = self.repository.exists(&request)
            .await
            .map_err(|e| self.map_repo_error(e, &activity.patient_id))?;
        if exists {
            warn!(
                "Physical activity starting at {} already registered for patient {}",
                activity.start_time.to_rfc3339(),
                activity.patient_id
            );
            return Err(PhysicalActivityServiceError::Conflict(activity.patient_id));
        }

        let stored = self.repository.create(request)
            .await
            .map_err(|e| self.map_repo_error(e, &activity.patient_id))?;

        info!("Physical activity {} created for patient {}", stored.id, stored.patient_id);
        self.convert(stored)
    }

    async fn add_many(&self, items: Vec<Value>) -> ActivityMultiStatus {
        let mut report = ActivityMultiStatus::new();

        for (index, item) in items.into_iter().enumerate() {
            let result = self.add(&ActivityCandidate::from(&item)).await;
            let outcome = match result {
                Ok(activity) => ItemOutcome::Success(StatusSuccess {
                    code: CREATED,
                    item: activity,
                }),
                Err(e) => ItemOutcome::Error(StatusError {
                    code: e.status_code(),
                    message: e.message(),
                    description: e.description(),
                    item,
                }),
            };

            match &outcome {
                ItemOutcome::Success(success) => debug!("Batch item {} stored as {}", index, success.item.id),
                ItemOutcome::Error(failure) => debug!("Batch item {} failed with {}", index, failure.code),
            }
            report.push(outcome);
        }

        info!(
            "Physical activity batch processed: created={}, failed={}",
            report.success.len(),
            report.error.len()
        );
        report
    }

    async fn submit(&self, submission: ActivitySubmission) -> Result<SubmissionOutcome, PhysicalActivityServiceError> {
        match submission {
            ActivitySubmission::Single(candidate) => Ok(SubmissionOutcome::Created(self.add(&candidate).await?)),
            ActivitySubmission::Batch(items) => Ok(SubmissionOutcome::MultiStatus(self.add_many(items).await)),
        }
    }

    async fn get_by_id_and_owner(
        &self,
        id: &str,
        patient_id: &str,
        query: &ActivityQuery,
    ) -> Result<Option<PhysicalActivity>, PhysicalActivityServiceError> {
        Self::check_identifier("id", id)?;
        Self::check_identifier("patient_id", patient_id)?;

        let filter = conversions::convert_to_data_filter(query);
        let stored = self.repository.get_by_id_and_patient(id, patient_id)
            .await
            .map_err(|e| self.map_repo_error(e, patient_id))?;

        stored
            .filter(|activity| filter.matches(activity))
            .map(|activity| self.convert(activity))
            .transpose()
    }

    async fn list_by_owner(
        &self,
        patient_id: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<PhysicalActivity>, PhysicalActivityServiceError> {
        Self::check_identifier("patient_id", patient_id)?;

        let filter = conversions::convert_to_data_filter(query);
        let (activities, total) = self.repository.get_by_patient(patient_id, &filter)
            .await
            .map_err(|e| self.map_repo_error(e, patient_id))?;
        debug!("Listing {} of {} activities for patient {}", activities.len(), total, patient_id);

        activities
            .into_iter()
            .map(|activity| self.convert(activity))
            .collect()
    }

    async fn remove_by_owner(&self, id: &str, patient_id: &str) -> Result<bool, PhysicalActivityServiceError> {
        Self::check_identifier("id", id)?;
        Self::check_identifier("patient_id", patient_id)?;

        let removed = self.repository.delete_by_patient(id, patient_id)
            .await
            .map_err(|e| self.map_repo_error(e, patient_id))?;
        if removed {
            info!("Physical activity {} removed for patient {}", id, patient_id);
        }

        Ok(removed)
    }

    async fn count_by_owner(&self, patient_id: &str) -> Result<usize, PhysicalActivityServiceError> {
        Self::check_identifier("patient_id", patient_id)?;

        self.repository.count_by_patient(patient_id)
            .await
            .map_err(|e| self.map_repo_error(e, patient_id))
    }
}

/// Create a default physical activity service using the repository from data layer
pub fn create_default_physical_activity_service() -> impl PhysicalActivityServiceTrait + Send + Sync {
    let repository = activity_log_data::repository::PhysicalActivityRepository::new();
    PhysicalActivityService::new(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch_item, candidate_starting_at, valid_candidate, MockPhysicalActivityRepository, PATIENT_ID};
    use serde_json::json;
    use activity_log_data::models::{ActivityFilter, CreatePhysicalActivityRequest};
    use activity_log_data::models::PhysicalActivity as StoredActivity;
    use chrono::{Duration, TimeZone, Utc};
    use mockall::{mock, Sequence};

    mock! {
        pub Repo {}

        #[async_trait]
        impl PhysicalActivityRepositoryTrait for Repo {
            async fn exists(&self, request: &CreatePhysicalActivityRequest) -> Result<bool, RepositoryError>;
            async fn create(&self, request: CreatePhysicalActivityRequest) -> Result<StoredActivity, RepositoryError>;
            async fn get_by_id_and_patient(&self, id: &str, patient_id: &str) -> Result<Option<StoredActivity>, RepositoryError>;
            async fn get_by_patient(&self, patient_id: &str, filter: &ActivityFilter) -> Result<(Vec<StoredActivity>, usize), RepositoryError>;
            async fn delete_by_patient(&self, id: &str, patient_id: &str) -> Result<bool, RepositoryError>;
            async fn count_by_patient(&self, patient_id: &str) -> Result<usize, RepositoryError>;
        }
    }

    const ACTIVITY_ID: &str = "0123456789abcdef0123456789abcdef";

    fn stored_at(id: &str, hour: u32) -> StoredActivity {
        let start = Utc.with_ymd_and_hms(2018, 12, 14, hour, 0, 0).unwrap();
        StoredActivity {
            id: id.to_string(),
            patient_id: PATIENT_ID.to_string(),
            name: "Walk".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(20),
            duration: 1_200_000,
            calories: 100.0,
            steps: None,
            distance: None,
            levels: None,
            heart_rate_average: None,
            heart_rate_zones: None,
        }
    }

    #[tokio::test]
    async fn test_add_checks_for_conflict_before_creating() {
        let mut repo = MockRepo::new();
        let mut seq = Sequence::new();
        repo.expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                assert_eq!(request.patient_id, PATIENT_ID);
                Ok(false)
            });
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| Ok(request.into_activity(ACTIVITY_ID.to_string())));

        let service = PhysicalActivityService::new(repo);
        let activity = service.add(&valid_candidate()).await.unwrap();

        assert_eq!(activity.id, ACTIVITY_ID);
        assert_eq!(activity.duration, 1_178_000);
    }

    #[tokio::test]
    async fn test_add_conflict_never_writes() {
        let mut repo = MockRepo::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        repo.expect_create().never();

        let service = PhysicalActivityService::new(repo);
        let err = service.add(&valid_candidate()).await.unwrap_err();

        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "Physical activity is already registered.");
        assert_eq!(
            err.description(),
            format!("A physical activity with the same start_time is already registered for patient {}.", PATIENT_ID)
        );
    }

    #[tokio::test]
    async fn test_add_invalid_candidate_never_touches_storage() {
        let mut repo = MockRepo::new();
        repo.expect_exists().never();
        repo.expect_create().never();

        let service = PhysicalActivityService::new(repo);
        let err = service.add(&ActivityCandidate::default()).await.unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Required fields were not provided...");
        assert_eq!(
            err.description(),
            "Physical activity validation: start_time, end_time, duration, patient_id, name, calories required!"
        );
    }

    #[tokio::test]
    async fn test_unique_index_conflict_on_create_is_a_conflict() {
        let mut repo = MockRepo::new();
        repo.expect_exists().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|_| Err(RepositoryError::Conflict("UNIQUE constraint failed".to_string())));

        let service = PhysicalActivityService::new(repo);
        let err = service.add(&valid_candidate()).await.unwrap_err();

        assert!(matches!(err, PhysicalActivityServiceError::Conflict(_)));
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_storage_failure_is_unclassified() {
        let mut repo = MockRepo::new();
        repo.expect_exists().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|_| Err(RepositoryError::Lock("disk on fire".to_string())));

        let service = PhysicalActivityService::new(repo);
        let err = service.add(&valid_candidate()).await.unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Lock error: disk on fire");
    }

    #[tokio::test]
    async fn test_batch_valid_and_missing_everything() {
        let repo = MockPhysicalActivityRepository::new();
        let service = PhysicalActivityService::new(repo.clone());

        let report = service
            .add_many(vec![batch_item(&valid_candidate()), json!({})])
            .await;

        assert_eq!(report.success.len(), 1);
        assert_eq!(report.error.len(), 1);
        assert_eq!(report.success[0].code, 201);
        assert_eq!(report.error[0].code, 400);
        assert_eq!(report.error[0].item, json!({}));
        assert_eq!(repo.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_of_already_stored_activities_all_conflict() {
        let candidates = vec![
            candidate_starting_at("2018-12-14T08:00:00Z", "2018-12-14T08:30:00Z"),
            candidate_starting_at("2018-12-14T12:00:00Z", "2018-12-14T12:45:00Z"),
            candidate_starting_at("2018-12-14T18:00:00Z", "2018-12-14T18:10:00Z"),
        ];
        let repo = MockPhysicalActivityRepository::new();
        let service = PhysicalActivityService::new(repo.clone());
        for candidate in &candidates {
            service.add(candidate).await.unwrap();
        }

        let items: Vec<Value> = candidates.iter().map(batch_item).collect();
        let report = service.add_many(items.clone()).await;

        assert!(report.success.is_empty());
        assert_eq!(report.error.len(), 3);
        for (failure, item) in report.error.iter().zip(&items) {
            assert_eq!(failure.code, 409);
            assert!(failure.message.contains("already registered"));
            assert_eq!(&failure.item, item);
        }
        assert_eq!(repo.stored().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_keeps_processing_order_and_does_not_dedupe_within_batch() {
        let first = candidate_starting_at("2018-12-14T08:00:00Z", "2018-12-14T08:30:00Z");
        let second = candidate_starting_at("2018-12-14T09:00:00Z", "2018-12-14T09:30:00Z");
        let broken = ActivityCandidate { calories: Some(json!(-1)), ..second.clone() };

        let (service, repo) = crate::testing::create_mock_physical_activity_service();
        let report = service
            .add_many(vec![batch_item(&first), batch_item(&broken), batch_item(&second), batch_item(&first)])
            .await;

        let names: Vec<_> = report.success.iter().map(|s| s.item.start_time.to_rfc3339()).collect();
        assert_eq!(names, vec!["2018-12-14T08:00:00+00:00", "2018-12-14T09:00:00+00:00"]);
        let codes: Vec<u16> = report.error.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![400, 409]);
        assert_eq!(report.error[0].item, batch_item(&broken));
        assert_eq!(report.error[0].description, "calories can't be negative!");
        assert_eq!(repo.stored().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_storage_failures_are_reported_per_item() {
        let repo = MockPhysicalActivityRepository::new().with_create_failure();
        let service = PhysicalActivityService::new(repo);

        let report = service.add_many(vec![batch_item(&valid_candidate()), json!({})]).await;

        assert!(report.success.is_empty());
        let codes: Vec<u16> = report.error.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![500, 400]);
    }

    #[tokio::test]
    async fn test_batch_non_object_item_is_rejected_on_its_own() {
        let (service, repo) = crate::testing::create_mock_physical_activity_service();

        let report = service
            .add_many(vec![batch_item(&valid_candidate()), json!(5), json!(["walk"])])
            .await;

        assert_eq!(report.success.len(), 1);
        assert_eq!(report.error.len(), 2);
        assert_eq!(report.error[0].code, 400);
        assert_eq!(report.error[0].item, json!(5));
        assert!(report.error[0].description.starts_with("Physical activity validation: start_time, end_time"));
        assert_eq!(report.error[1].item, json!(["walk"]));
        assert_eq!(repo.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_dispatches_single_and_batch() {
        let (service, _repo) = crate::testing::create_mock_physical_activity_service();

        let single = service
            .submit(ActivitySubmission::Single(valid_candidate()))
            .await
            .unwrap();
        assert!(matches!(single, SubmissionOutcome::Created(ref a) if a.name == "Walk"));

        let err = service
            .submit(ActivitySubmission::Single(valid_candidate()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        let batch = service
            .submit(ActivitySubmission::Batch(vec![batch_item(&valid_candidate())]))
            .await
            .unwrap();
        match batch {
            SubmissionOutcome::MultiStatus(report) => assert_eq!(report.error[0].code, 409),
            other => panic!("expected a report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_and_owner_applies_date_window() {
        let repo = MockPhysicalActivityRepository::with_activities(vec![stored_at(ACTIVITY_ID, 12)]);
        let service = PhysicalActivityService::new(repo);

        let found = service
            .get_by_id_and_owner(ACTIVITY_ID, PATIENT_ID, &ActivityQuery::default())
            .await
            .unwrap();
        assert_eq!(found.map(|a| a.id), Some(ACTIVITY_ID.to_string()));

        let later = ActivityQuery {
            start_date: Some(Utc.with_ymd_and_hms(2018, 12, 15, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(
            service.get_by_id_and_owner(ACTIVITY_ID, PATIENT_ID, &later).await.unwrap(),
            None
        );

        let other_patient = "ffffffffffffffffffffffffffffffff";
        assert_eq!(
            service.get_by_id_and_owner(ACTIVITY_ID, other_patient, &ActivityQuery::default()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_read_operations_validate_identifiers() {
        let mut repo = MockRepo::new();
        repo.expect_get_by_id_and_patient().never();
        repo.expect_delete_by_patient().never();
        repo.expect_count_by_patient().never();
        let service = PhysicalActivityService::new(repo);

        let err = service
            .get_by_id_and_owner("42", PATIENT_ID, &ActivityQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.description(), "id is not in valid identifier format (32 hexadecimal characters)!");

        assert!(service.remove_by_owner(ACTIVITY_ID, "patient").await.is_err());
        assert!(service.count_by_owner("").await.is_err());
    }

    #[tokio::test]
    async fn test_list_remove_and_count_by_owner() {
        let repo = MockPhysicalActivityRepository::with_activities(vec![
            stored_at("00000000000000000000000000000001", 8),
            stored_at("00000000000000000000000000000002", 12),
            stored_at("00000000000000000000000000000003", 18),
        ]);
        let service = PhysicalActivityService::new(repo);

        let query = ActivityQuery { limit: Some(2), sort_desc: Some(false), ..Default::default() };
        let listed = service.list_by_owner(PATIENT_ID, &query).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["00000000000000000000000000000001", "00000000000000000000000000000002"]);

        assert_eq!(service.count_by_owner(PATIENT_ID).await.unwrap(), 3);
        assert!(service.remove_by_owner("00000000000000000000000000000002", PATIENT_ID).await.unwrap());
        assert!(!service.remove_by_owner("00000000000000000000000000000002", PATIENT_ID).await.unwrap());
        assert_eq!(service.count_by_owner(PATIENT_ID).await.unwrap(), 2);
    }
}
