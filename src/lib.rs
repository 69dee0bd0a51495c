use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod sanitize;
pub mod storage;

// Module for routing segregation (Public, Admin API, Pages).
pub mod routes;
use auth::AuthSession;
use routes::{admin, pages, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the JSON API. Aggregates every
/// handler decorated with `#[utoipa::path]` and the request/response schemas;
/// the resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::me,
        handlers::list_festivals, handlers::get_festival_details,
        handlers::list_exhibitions, handlers::get_exhibition_details,
        handlers::list_welfare_services, handlers::get_welfare_service_details,
        handlers::list_gas_stations, handlers::get_gas_station_details,
        handlers::admin_list_festivals, handlers::create_festival,
        handlers::update_festival, handlers::delete_festival,
        handlers::set_festival_visibility, handlers::reorder_festivals,
        handlers::admin_list_festival_images, handlers::presign_festival_image,
        handlers::complete_festival_image, handlers::delete_festival_image,
        handlers::reorder_festival_images, handlers::set_festival_thumbnail,
        handlers::admin_list_exhibitions, handlers::create_exhibition,
        handlers::update_exhibition, handlers::delete_exhibition,
        handlers::set_exhibition_visibility, handlers::reorder_exhibitions,
        handlers::admin_list_welfare_services, handlers::create_welfare_service,
        handlers::update_welfare_service, handlers::delete_welfare_service,
        handlers::set_welfare_service_visibility, handlers::reorder_welfare_services,
        handlers::sync_gas_stations
    ),
    components(
        schemas(
            models::Festival, models::FestivalImage, models::FestivalDetail,
            models::Exhibition, models::WelfareService, models::GasStation,
            models::Page<models::Festival>, models::Page<models::Exhibition>,
            models::Page<models::WelfareService>,
            models::LoginRequest, models::SessionResponse,
            models::CreateFestivalRequest, models::UpdateFestivalRequest,
            models::CreateExhibitionRequest, models::UpdateExhibitionRequest,
            models::CreateWelfareServiceRequest, models::UpdateWelfareServiceRequest,
            models::VisibilityRequest, models::ReorderItem, models::ReorderRequest,
            models::ReorderResponse, models::SetThumbnailRequest,
            models::PresignImageRequest, models::PresignImageResponse,
            models::StationSyncResponse,
        )
    ),
    tags(
        (name = "civic-portal", description = "Municipal Content Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access over the PgPool.
    pub repo: RepositoryState,
    /// Storage Layer: abstracts the S3 image-upload pipeline.
    pub storage: StorageState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let extractors (notably AuthSession) pull individual components out
// of the shared AppState without depending on the whole struct.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_auth_middleware
///
/// Enforces authentication for the admin API router. `AuthSession` implements
/// `FromRequestParts`, so a request without a valid session cookie is rejected
/// with 401 before any handler runs; the role check itself happens in the
/// handlers (403 for non-admin sessions).
async fn session_auth_middleware(_session: AuthSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware.
        .merge(public::public_routes())
        // Page shells: the session gate below handles their redirect policy.
        .merge(pages::pages_routes())
        // Admin API: nested under /api/admin behind the auth middleware.
        .nest(
            "/api/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                session_auth_middleware,
            )),
        )
        // Session gate: evaluates the per-path redirect policy (login page vs
        // admin area) for every request, before routing.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_gate,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers (outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in
                // a span carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer (applied last).
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the TraceLayer span: includes the `x-request-id` header so all
/// log lines of one request share a correlation ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
