use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// The two server-rendered shells the session gate routes between. The gate
/// middleware (applied in `create_router`) evaluates the redirect policy for
/// every request before these handlers run:
/// - /login with an admin session redirects to /admin.
/// - /admin without an admin session redirects to /login.
pub fn pages_routes() -> Router<AppState> {
    Router::new()
        // GET /login — credential form posting to /api/auth/login.
        .route("/login", get(handlers::login_page))
        // GET /admin — backoffice dashboard shell.
        .route("/admin", get(handlers::dashboard_page))
}
