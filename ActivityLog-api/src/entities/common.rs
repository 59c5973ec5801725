use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use activity_log_domain::services::PhysicalActivityServiceError;

/// Standardized error response format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicErrorResponse {
    /// HTTP status code of the error
    #[schema(example = 400)]
    pub code: u16,

    /// Short summary of the error
    #[schema(example = "Required fields were not provided...")]
    pub message: String,

    /// Details about the error
    #[schema(example = "Physical activity validation: name required!")]
    pub description: String,
}

impl PublicErrorResponse {
    pub fn new(code: StatusCode, message: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            message: message.into(),
            description: description.into(),
        }
    }

    /// A 400 response for a malformed request
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "One or more request fields are invalid...", description)
    }
}

impl From<&PhysicalActivityServiceError> for PublicErrorResponse {
    fn from(err: &PhysicalActivityServiceError) -> Self {
        Self {
            code: err.status_code(),
            message: err.message(),
            description: err.description(),
        }
    }
}

impl From<PhysicalActivityServiceError> for PublicErrorResponse {
    fn from(err: PhysicalActivityServiceError) -> Self {
        Self::from(&err)
    }
}

impl IntoResponse for PublicErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
