use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AppError
///
/// The application-wide error taxonomy. Every failure that can leave a handler is
/// normalized into one of these variants before it crosses the process boundary,
/// so callers only ever see the HTTP mapping below.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input shape or range (empty batch, negative order, malformed filter).
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request is well-formed but conflicts with entity state
    /// (e.g. reordering an image that has not finished uploading).
    #[error("{0}")]
    Invariant(String),

    /// No valid session. Expired, tampered and absent tokens all land here;
    /// the caller is never told which.
    #[error("authentication required")]
    Unauthorized,

    /// Valid session, insufficient role.
    #[error("insufficient permissions")]
    Forbidden,

    /// Database/transaction failure. Detail is logged server-side only.
    #[error("store failure")]
    Store(#[from] sqlx::Error),

    /// Object-storage failure (presign/delete). Detail is logged server-side only.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Upstream service (price feed) failure. Detail is logged server-side only.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl AppError {
    /// HTTP status for this error per the boundary contract.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Invariant(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Store(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store and upstream failures keep their detail out of the response body.
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!("store failure: {:?}", e);
                "internal server error".to_string()
            }
            AppError::Storage(detail) => {
                tracing::error!("storage failure: {}", detail);
                "internal server error".to_string()
            }
            AppError::Upstream(detail) => {
                tracing::error!("upstream failure: {}", detail);
                "upstream service unavailable".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
