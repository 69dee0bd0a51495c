use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints accessible to any client, anonymous or logged-in. These are the
/// read-only content surfaces of the portal plus the session endpoints.
///
/// Security Mandate:
/// Every data handler here must go through repository queries that enforce
/// `is_visible = true` (and `upload_status = 'uploaded'` for gallery images),
/// so hidden or still-uploading content can never leak to anonymous readers.
/// Rich-text fields are sanitized in the handler before serialization.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Session Endpoints ---
        // POST /api/auth/login — issues the session cookie on valid credentials.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout — expires the session cookie.
        .route("/api/auth/logout", post(handlers::logout))
        // GET /api/auth/me — echoes the resolved session (401 without one).
        .route("/api/auth/me", get(handlers::me))
        // --- Festivals ---
        // GET /api/festivals?page=&page_size=&search=&category=&location=
        .route("/api/festivals", get(handlers::list_festivals))
        // GET /api/festivals/{id} — detail plus uploaded gallery images.
        .route("/api/festivals/{id}", get(handlers::get_festival_details))
        // --- Exhibitions ---
        .route("/api/exhibitions", get(handlers::list_exhibitions))
        .route("/api/exhibitions/{id}", get(handlers::get_exhibition_details))
        // --- Welfare Services ---
        .route("/api/welfare-services", get(handlers::list_welfare_services))
        .route(
            "/api/welfare-services/{id}",
            get(handlers::get_welfare_service_details),
        )
        // --- Gas Stations (price map) ---
        // GET /api/gas-stations?min_lat=&max_lat=&min_lng=&max_lng=&brand=&search=
        .route("/api/gas-stations", get(handlers::list_gas_stations))
        .route(
            "/api/gas-stations/{id}",
            get(handlers::get_gas_station_details),
        )
}
