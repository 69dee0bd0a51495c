/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// so no protected endpoint can be exposed by accident.

/// Routes accessible to all clients (anonymous, read-only, plus the auth
/// endpoints). Data handlers must enforce visibility checks
/// (`is_visible = true`) at the Repository level.
pub mod public;

/// Admin JSON API. Wrapped in the session-auth middleware; every handler
/// additionally checks for the 'admin' role.
pub mod admin;

/// Server-rendered page shells (/login, /admin). Protected by the session
/// gate's redirect policy rather than API status codes.
pub mod pages;
