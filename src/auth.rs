use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, config::AppConfig, models::AdminUser, repository::RepositoryState};

/// Name of the session cookie carrying the signed JWT.
pub const SESSION_COOKIE: &str = "portal_session";

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

/// Page paths used by the gate's redirect policy.
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/admin";

/// Claims
///
/// Payload of the session JWT. Signed with the server secret at login and
/// verified on every request; never persisted server-side. The role travels in
/// the token so the per-request gate does not need a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the admin user's UUID.
    pub sub: Uuid,
    pub email: String,
    /// 'admin' or 'user'.
    pub role: String,
    /// Issued At timestamp.
    pub iat: usize,
    /// Expiration timestamp. Always validated on decode.
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// issue_token
///
/// Signs a fresh session JWT for a successfully authenticated admin user.
pub fn issue_token(user: &AdminUser, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// decode_claims
///
/// Verifies signature and expiry. Every failure mode (expired, tampered,
/// malformed) collapses to `None` so callers cannot distinguish why a token
/// was rejected.
pub fn decode_claims(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .ok()
}

/// session_cookie
///
/// Serializes the Set-Cookie value for a new session: httpOnly, Path=/,
/// SameSite=Lax, and Secure in production.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// clear_session_cookie
///
/// Set-Cookie value that immediately expires the session cookie (logout).
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// token_from_headers
///
/// Pulls the raw session token out of the Cookie header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

/// claims_from_headers
///
/// The single claim source of truth: cookie extraction plus verification.
/// Used identically by the page gate and the API extractor.
pub fn claims_from_headers(headers: &HeaderMap, config: &AppConfig) -> Option<Claims> {
    token_from_headers(headers).and_then(|token| decode_claims(token, &config.jwt_secret))
}

// --- Gate Policy ---

/// GateAction
///
/// Outcome of evaluating the routing policy for one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Pass the request through.
    Allow,
    /// Redirect to the login page.
    ToLogin,
    /// Redirect to the admin dashboard (already-authenticated admin on /login).
    ToDashboard,
}

/// True for page paths inside the admin area. The admin JSON API lives under
/// `/api/admin` and is deliberately NOT matched here: API callers get 401/403
/// instead of redirects.
fn is_admin_page(path: &str) -> bool {
    path == DASHBOARD_PATH || path.starts_with("/admin/")
}

/// evaluate_gate
///
/// The per-request routing policy:
/// - admin claim: all paths allowed; the login page bounces to the dashboard.
/// - non-admin or no claim: admin pages bounce to login, everything else is
///   allowed. A non-admin claim on /login stays on /login.
pub fn evaluate_gate(path: &str, claims: Option<&Claims>) -> GateAction {
    match claims {
        Some(c) if c.is_admin() => {
            if path == LOGIN_PATH {
                GateAction::ToDashboard
            } else {
                GateAction::Allow
            }
        }
        _ => {
            if is_admin_page(path) {
                GateAction::ToLogin
            } else {
                GateAction::Allow
            }
        }
    }
}

/// session_gate
///
/// Middleware applying `evaluate_gate` to every request. Runs before routing,
/// so the policy is enforced identically for the first server-evaluated
/// request and every later navigation; the verified cookie is the only claim
/// source consulted.
pub async fn session_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let claims = claims_from_headers(request.headers(), &state.config);

    match evaluate_gate(request.uri().path(), claims.as_ref()) {
        GateAction::Allow => next.run(request).await,
        GateAction::ToLogin => Redirect::to(LOGIN_PATH).into_response(),
        GateAction::ToDashboard => Redirect::to(DASHBOARD_PATH).into_response(),
    }
}

// --- API Session Extractor ---

/// AuthSession
///
/// The resolved identity of an authenticated API request. Produced by the
/// extractor below; handlers take it as an argument and use the role for
/// their own authorization checks.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: Uuid,
    pub email: String,
    /// Current role, read from the database (not the token) so a demoted
    /// operator loses access as soon as their row changes.
    pub role: String,
}

impl AuthSession {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// AuthSession Extractor Implementation
///
/// Verifies the session cookie, then confirms the user still exists and reads
/// their current role. Rejects with 401 on any failure; the response never
/// reveals whether the token was absent, expired or tampered.
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let claims =
            claims_from_headers(&parts.headers, &config).ok_or(StatusCode::UNAUTHORIZED)?;

        // The token may outlive the account. Re-resolve the user row so a
        // deleted operator is locked out immediately.
        let user = repo
            .get_admin_user(claims.sub)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthSession {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}
