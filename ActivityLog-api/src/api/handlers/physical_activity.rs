use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, instrument, warn};

// Import domain entities and services
use activity_log_domain::entities::{ActivitySubmission, SubmissionOutcome};
use activity_log_domain::services::{
    create_default_physical_activity_service, PhysicalActivityServiceError, PhysicalActivityServiceTrait,
};

// Import our entities
use crate::entities::{
    ActivityQueryParams, PhysicalActivityRequest, PublicErrorResponse, PublicMultiStatus, PublicPhysicalActivity,
};

/// Header carrying the number of activities stored for the patient
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Service type for dependency injection
pub type PhysicalActivityService = Arc<dyn PhysicalActivityServiceTrait + Send + Sync>;

/// Create a default service for the handlers to use
pub fn create_service() -> PhysicalActivityService {
    Arc::new(create_default_physical_activity_service())
}

/// Log a service failure at a level matching its status and turn it into a response
fn error_response(err: PhysicalActivityServiceError) -> Response {
    match err.status_code() {
        500 => error!("Physical activity request failed: {}", err),
        _ => warn!("Physical activity request rejected: {}", err.description()),
    }
    PublicErrorResponse::from(err).into_response()
}

/// Register one physical activity, or a batch of them
#[utoipa::path(
    post,
    path = "/api/v1/patients/{patient_id}/physicalactivities",
    params(
        ("patient_id" = String, Path, description = "Patient ID (32 hexadecimal characters)")
    ),
    request_body(
        content = PhysicalActivityRequest,
        description = "A single activity, or an array of activities for a batch"
    ),
    responses(
        (status = 201, description = "Physical activity created", body = PublicPhysicalActivity),
        (status = 207, description = "Batch processed, see per-item report", body = PublicMultiStatus),
        (status = 400, description = "Invalid physical activity", body = PublicErrorResponse),
        (status = 409, description = "Physical activity already registered", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse),
    ),
    tag = "physical_activities"
)]
#[instrument(skip(service, payload))]
pub async fn create_physical_activities(
    State(service): State<PhysicalActivityService>,
    Path(patient_id): Path<String>,
    payload: Result<Json<ActivitySubmission>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(submission) = payload.map_err(|rejection| {
        warn!("Unreadable physical activity body: {}", rejection.body_text());
        PublicErrorResponse::bad_request(rejection.body_text()).into_response()
    })?;

    // The patient in the path owns every submitted activity
    let submission = submission.with_patient_id(&patient_id);

    match service.submit(submission).await.map_err(error_response)? {
        SubmissionOutcome::Created(activity) => {
            info!("Physical activity created with ID: {}", activity.id);
            Ok((StatusCode::CREATED, Json(PublicPhysicalActivity::from(activity))).into_response())
        },
        SubmissionOutcome::MultiStatus(report) => {
            info!(
                "Physical activity batch processed: {} created, {} failed",
                report.success.len(),
                report.error.len()
            );
            Ok((StatusCode::MULTI_STATUS, Json(PublicMultiStatus::from(report))).into_response())
        },
    }
}

/// List a patient's physical activities
#[utoipa::path(
    get,
    path = "/api/v1/patients/{patient_id}/physicalactivities",
    params(
        ("patient_id" = String, Path, description = "Patient ID (32 hexadecimal characters)"),
        ActivityQueryParams
    ),
    responses(
        (status = 200, description = "Physical activities of the patient", body = Vec<PublicPhysicalActivity>,
            headers(("x-total-count" = usize, description = "Number of activities stored for the patient"))),
        (status = 400, description = "Invalid query parameters or patient ID", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse),
    ),
    tag = "physical_activities"
)]
#[instrument(skip(service))]
pub async fn list_physical_activities(
    State(service): State<PhysicalActivityService>,
    Path(patient_id): Path<String>,
    Query(params): Query<ActivityQueryParams>,
) -> Result<impl IntoResponse, Response> {
    let query = params.to_query().map_err(IntoResponse::into_response)?;

    let activities = service.list_by_owner(&patient_id, &query).await.map_err(error_response)?;
    let total = service.count_by_owner(&patient_id).await.map_err(error_response)?;

    info!("Returning {} of {} physical activities for patient {}", activities.len(), total, patient_id);

    let activities: Vec<PublicPhysicalActivity> = activities.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, [(TOTAL_COUNT_HEADER, total.to_string())], Json(activities)))
}

/// Get one of a patient's physical activities
#[utoipa::path(
    get,
    path = "/api/v1/patients/{patient_id}/physicalactivities/{activity_id}",
    params(
        ("patient_id" = String, Path, description = "Patient ID (32 hexadecimal characters)"),
        ("activity_id" = String, Path, description = "Physical activity ID (32 hexadecimal characters)"),
        ActivityQueryParams
    ),
    responses(
        (status = 200, description = "Physical activity found", body = PublicPhysicalActivity),
        (status = 400, description = "Invalid identifier or query parameters", body = PublicErrorResponse),
        (status = 404, description = "Physical activity not found", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse),
    ),
    tag = "physical_activities"
)]
#[instrument(skip(service))]
pub async fn get_physical_activity(
    State(service): State<PhysicalActivityService>,
    Path((patient_id, activity_id)): Path<(String, String)>,
    Query(params): Query<ActivityQueryParams>,
) -> Result<impl IntoResponse, Response> {
    let query = params.to_query().map_err(IntoResponse::into_response)?;

    match service
        .get_by_id_and_owner(&activity_id, &patient_id, &query)
        .await
        .map_err(error_response)?
    {
        Some(activity) => Ok((StatusCode::OK, Json(PublicPhysicalActivity::from(activity)))),
        None => {
            info!("Physical activity {} not found for patient {}", activity_id, patient_id);
            Err(error_response(PhysicalActivityServiceError::NotFound(activity_id)))
        },
    }
}

/// Delete one of a patient's physical activities
#[utoipa::path(
    delete,
    path = "/api/v1/patients/{patient_id}/physicalactivities/{activity_id}",
    params(
        ("patient_id" = String, Path, description = "Patient ID (32 hexadecimal characters)"),
        ("activity_id" = String, Path, description = "Physical activity ID (32 hexadecimal characters)")
    ),
    responses(
        (status = 204, description = "Physical activity deleted, or nothing to delete"),
        (status = 400, description = "Invalid identifier", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse),
    ),
    tag = "physical_activities"
)]
#[instrument(skip(service))]
pub async fn delete_physical_activity(
    State(service): State<PhysicalActivityService>,
    Path((patient_id, activity_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Response> {
    let removed = service
        .remove_by_owner(&activity_id, &patient_id)
        .await
        .map_err(error_response)?;

    if removed {
        info!("Physical activity {} deleted for patient {}", activity_id, patient_id);
    }

    Ok(StatusCode::NO_CONTENT)
}
