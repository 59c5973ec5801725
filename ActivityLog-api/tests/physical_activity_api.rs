use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use activity_log_api::api::routes::create_router;
use activity_log_domain::testing::{
    candidate_starting_at, create_mock_physical_activity_service, valid_candidate, MockHealthService,
    MockPhysicalActivityRepository, PATIENT_ID,
};

const OTHER_PATIENT_ID: &str = "0123456789abcdef0123456789abcdef";

fn collection_uri() -> String {
    format!("/api/v1/patients/{}/physicalactivities", PATIENT_ID)
}

fn item_uri(activity_id: &str) -> String {
    format!("{}/{}", collection_uri(), activity_id)
}

fn create_test_app() -> (Router, MockPhysicalActivityRepository) {
    let (service, repository) = create_mock_physical_activity_service();
    let app = create_router(Arc::new(service), Arc::new(MockHealthService::new()));
    (app, repository)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, body)
}

fn candidate_json(start_time: &str, end_time: &str) -> Value {
    serde_json::to_value(candidate_starting_at(start_time, end_time)).unwrap()
}

#[tokio::test]
async fn test_create_single_activity() {
    let (app, repository) = create_test_app();
    let mut body = serde_json::to_value(valid_candidate()).unwrap();
    body["patient_id"] = json!(OTHER_PATIENT_ID);

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"].as_str().map(str::len), Some(32));
    // The patient in the path wins over the body
    assert_eq!(body["patient_id"], PATIENT_ID);
    assert_eq!(body["name"], "Walk");
    assert_eq!(body["duration"], 1178000);
    assert_eq!(body["levels"][3]["name"], "very");
    assert_eq!(body["heart_rate_zones"]["peak"]["max"], 220);
    assert_eq!(repository.stored().len(), 1);
}

#[tokio::test]
async fn test_create_single_activity_with_missing_fields() {
    let (app, repository) = create_test_app();

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(json!({ "name": "Walk" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "Required fields were not provided...");
    assert_eq!(
        body["description"],
        "Physical activity validation: start_time, end_time, duration, calories required!"
    );
    assert!(repository.stored().is_empty());
}

#[tokio::test]
async fn test_create_single_activity_with_invalid_field() {
    let (app, _) = create_test_app();
    let mut body = serde_json::to_value(valid_candidate()).unwrap();
    body["end_time"] = json!("2018-12-14T12:00:00Z");

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "One or more request fields are invalid...");
    assert_eq!(body["description"], "end_time cannot be older than start_time!");
}

#[tokio::test]
async fn test_create_duplicate_activity_conflicts() {
    let (app, repository) = create_test_app();
    let body = serde_json::to_value(valid_candidate()).unwrap();

    let (status, _, _) = send(&app, Method::POST, &collection_uri(), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
    assert_eq!(body["message"], "Physical activity is already registered.");
    assert_eq!(repository.stored().len(), 1);
}

#[tokio::test]
async fn test_create_batch_reports_each_item() {
    let (app, repository) = create_test_app();
    let batch = json!([serde_json::to_value(valid_candidate()).unwrap(), {}]);

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(batch)).await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["success"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["success"][0]["code"], 201);
    assert_eq!(body["success"][0]["item"]["name"], "Walk");
    assert_eq!(body["error"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["error"][0]["code"], 400);
    assert_eq!(
        body["error"][0]["description"],
        "Physical activity validation: start_time, end_time, duration, name, calories required!"
    );
    // The rejected item is echoed back as submitted, owned by the path patient
    assert_eq!(body["error"][0]["item"], json!({ "patient_id": PATIENT_ID }));
    assert_eq!(repository.stored().len(), 1);
}

#[tokio::test]
async fn test_create_batch_with_non_object_items() {
    let (app, repository) = create_test_app();
    let batch = json!([serde_json::to_value(valid_candidate()).unwrap(), 5, "walk"]);

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(batch)).await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["success"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["success"][0]["item"]["patient_id"], PATIENT_ID);
    let errors = body["error"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e["code"] == 400));
    assert_eq!(
        errors[0]["description"],
        "Physical activity validation: start_time, end_time, duration, patient_id, name, calories required!"
    );
    assert_eq!(errors[0]["item"], 5);
    assert_eq!(errors[1]["item"], "walk");
    assert_eq!(repository.stored().len(), 1);
}

#[tokio::test]
async fn test_create_with_scalar_body_is_rejected() {
    let (app, repository) = create_test_app();

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(json!(5))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(repository.stored().is_empty());
}

#[tokio::test]
async fn test_create_batch_of_stored_activities_all_conflict() {
    let (app, _) = create_test_app();
    let batch = json!([
        candidate_json("2018-12-14T10:00:00Z", "2018-12-14T10:30:00Z"),
        candidate_json("2018-12-14T11:00:00Z", "2018-12-14T11:30:00Z"),
        candidate_json("2018-12-14T12:00:00Z", "2018-12-14T12:30:00Z"),
    ]);

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(batch.clone())).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["success"].as_array().map(Vec::len), Some(3));

    let (status, _, body) = send(&app, Method::POST, &collection_uri(), Some(batch)).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(body["success"].as_array().map_or(false, Vec::is_empty));
    let errors = body["error"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e["code"] == 409));
    assert_eq!(errors[0]["item"]["start_time"], "2018-12-14T10:00:00Z");
    assert_eq!(errors[2]["item"]["start_time"], "2018-12-14T12:00:00Z");
}

#[tokio::test]
async fn test_create_with_unreadable_body() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(collection_uri())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_list_activities_with_total_count() {
    let (app, _) = create_test_app();
    let batch = json!([
        candidate_json("2018-12-14T10:00:00Z", "2018-12-14T10:30:00Z"),
        candidate_json("2018-12-15T10:00:00Z", "2018-12-15T10:30:00Z"),
        candidate_json("2018-12-16T10:00:00Z", "2018-12-16T10:30:00Z"),
    ]);
    send(&app, Method::POST, &collection_uri(), Some(batch)).await;

    let (status, headers, body) = send(&app, Method::GET, &collection_uri(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-total-count").and_then(|v| v.to_str().ok()), Some("3"));
    let activities = body.as_array().unwrap();
    assert_eq!(activities.len(), 3);
    // Newest first by default
    assert_eq!(activities[0]["start_time"], "2018-12-16T10:00:00Z");

    let uri = format!("{}?limit=1&sort=asc", collection_uri());
    let (status, headers, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-total-count").and_then(|v| v.to_str().ok()), Some("3"));
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["start_time"], "2018-12-14T10:00:00Z");

    let uri = format!(
        "{}?start_date=2018-12-15T00:00:00Z&end_date=2018-12-15T23:59:59Z",
        collection_uri()
    );
    let (_, _, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["start_time"], "2018-12-15T10:00:00Z");
}

#[tokio::test]
async fn test_list_rejects_invalid_parameters() {
    let (app, _) = create_test_app();

    let uri = format!("{}?limit=0", collection_uri());
    let (status, _, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "limit: invalid query parameter value!");

    let uri = format!("{}?sort=sideways", collection_uri());
    let (status, _, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, Method::GET, "/api/v1/patients/not-a-patient/physicalactivities", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["description"],
        "patient_id is not in valid identifier format (32 hexadecimal characters)!"
    );
}

#[tokio::test]
async fn test_get_activity_by_id() {
    let (app, _) = create_test_app();
    let (_, _, created) = send(
        &app,
        Method::POST,
        &collection_uri(),
        Some(serde_json::to_value(valid_candidate()).unwrap()),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, Method::GET, &item_uri(&id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    // Outside the requested date window
    let uri = format!("{}?start_date=2019-01-01T00:00:00Z", item_uri(&id));
    let (status, _, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Physical activity not found!");

    // Another patient cannot see it
    let uri = format!("/api/v1/patients/{}/physicalactivities/{}", OTHER_PATIENT_ID, id);
    let (status, _, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, Method::GET, &item_uri("not-an-id"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_activity() {
    let (app, repository) = create_test_app();
    let (_, _, created) = send(
        &app,
        Method::POST,
        &collection_uri(),
        Some(serde_json::to_value(valid_candidate()).unwrap()),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, Method::DELETE, &item_uri(&id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(repository.stored().is_empty());

    let (status, _, _) = send(&app, Method::GET, &item_uri(&id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again is not an error
    let (status, _, _) = send(&app, Method::DELETE, &item_uri(&id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let (app, _) = create_test_app();

    let (status, headers, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["database"]["status"], "ok");
    assert_eq!(headers.get("x-content-type-options").and_then(|v| v.to_str().ok()), Some("nosniff"));
    assert_eq!(headers.get("x-frame-options").and_then(|v| v.to_str().ok()), Some("DENY"));
}

#[tokio::test]
async fn test_unhealthy_database_is_reported() {
    let (service, _) = create_mock_physical_activity_service();
    let app = create_router(
        Arc::new(service),
        Arc::new(MockHealthService::new().with_unhealthy_database()),
    );

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["components"]["database"]["status"], "error");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = create_test_app();

    let (status, _, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "ActivityLog API");
    assert!(body["paths"]["/api/v1/patients/{patient_id}/physicalactivities"].is_object());
}
