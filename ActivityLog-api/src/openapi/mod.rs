use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Physical activity endpoints
        crate::api::handlers::physical_activity::create_physical_activities,
        crate::api::handlers::physical_activity::list_physical_activities,
        crate::api::handlers::physical_activity::get_physical_activity,
        crate::api::handlers::physical_activity::delete_physical_activity,
    ),
    components(
        schemas(
            // Entities
            crate::entities::common::PublicErrorResponse,
            crate::entities::physical_activity::PhysicalActivityRequest,
            crate::entities::physical_activity::PublicPhysicalActivity,
            crate::entities::physical_activity::PublicActivityLevel,
            crate::entities::physical_activity::PublicHeartRateZones,
            crate::entities::physical_activity::PublicZoneBound,
            crate::entities::physical_activity::PublicMultiStatus,
            crate::entities::physical_activity::PublicStatusSuccess,
            crate::entities::physical_activity::PublicStatusError,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentHealthStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "physical_activities", description = "Physical activity registration and retrieval endpoints")
    ),
    info(
        title = "ActivityLog API",
        version = "0.1.0",
        description = "API for registering patients' physical activities",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
