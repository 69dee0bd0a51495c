use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Admin Router Module
///
/// The backoffice JSON API, nested under `/api/admin`. The whole router is
/// wrapped in the session-auth middleware (401 without a valid cookie), and
/// every handler re-checks the 'admin' role (403 otherwise). API callers are
/// never redirected; redirects are reserved for the page routes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Festivals ---
        // Listing includes hidden rows; creation starts hidden.
        .route(
            "/festivals",
            get(handlers::admin_list_festivals).post(handlers::create_festival),
        )
        // PUT /api/admin/festivals/order
        // Manual ordering batch for the festival list. Registered before the
        // {id} routes so the literal segment wins.
        .route("/festivals/order", put(handlers::reorder_festivals))
        .route(
            "/festivals/{id}",
            put(handlers::update_festival).delete(handlers::delete_festival),
        )
        // PATCH /api/admin/festivals/{id}/visibility — publish/hide switch.
        .route(
            "/festivals/{id}/visibility",
            patch(handlers::set_festival_visibility),
        )
        // --- Festival Images (upload pipeline + gallery management) ---
        .route(
            "/festivals/{id}/images",
            get(handlers::admin_list_festival_images),
        )
        // POST .../images/presign — registers a pending row, returns the
        // short-lived direct-upload URL.
        .route(
            "/festivals/{id}/images/presign",
            post(handlers::presign_festival_image),
        )
        // PUT .../images/order — transactional gallery reorder.
        .route(
            "/festivals/{id}/images/order",
            put(handlers::reorder_festival_images),
        )
        // PUT .../images/thumbnail — exclusive thumbnail promotion.
        .route(
            "/festivals/{id}/images/thumbnail",
            put(handlers::set_festival_thumbnail),
        )
        .route(
            "/festivals/{id}/images/{image_id}/complete",
            post(handlers::complete_festival_image),
        )
        .route(
            "/festivals/{id}/images/{image_id}",
            delete(handlers::delete_festival_image),
        )
        // --- Exhibitions ---
        .route(
            "/exhibitions",
            get(handlers::admin_list_exhibitions).post(handlers::create_exhibition),
        )
        .route("/exhibitions/order", put(handlers::reorder_exhibitions))
        .route(
            "/exhibitions/{id}",
            put(handlers::update_exhibition).delete(handlers::delete_exhibition),
        )
        .route(
            "/exhibitions/{id}/visibility",
            patch(handlers::set_exhibition_visibility),
        )
        // --- Welfare Services ---
        .route(
            "/welfare-services",
            get(handlers::admin_list_welfare_services).post(handlers::create_welfare_service),
        )
        .route(
            "/welfare-services/order",
            put(handlers::reorder_welfare_services),
        )
        .route(
            "/welfare-services/{id}",
            put(handlers::update_welfare_service).delete(handlers::delete_welfare_service),
        )
        .route(
            "/welfare-services/{id}/visibility",
            patch(handlers::set_welfare_service_visibility),
        )
        // --- Gas Stations ---
        // POST /api/admin/gas-stations/sync — pull the price feed and upsert.
        .route("/gas-stations/sync", post(handlers::sync_gas_stations))
}
