use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminUser
///
/// Canonical identity record for backoffice operators, stored in `admin_users`.
/// The bcrypt hash never leaves the process: it is skipped during serialization
/// and only compared inside the login handler.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    // The RBAC field: 'admin' or 'user'.
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Festival
///
/// A festival record from the `festivals` table. `content` is operator-supplied
/// rich text and is sanitized before it is served on any public endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Festival {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub location: String,
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    // Controls public visibility (enforced in the repository's public queries).
    pub is_visible: bool,
    // Manual ordering key for list rendering. Lower sorts first.
    pub display_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// FestivalImage
///
/// One gallery image attached to a festival. At most one image per festival may
/// have `is_thumbnail = true`; promotion is a single atomic transition in the
/// repository. Rows start in `pending` state when a presigned upload is issued
/// and only become `uploaded` once the client confirms the transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FestivalImage {
    pub id: i64,
    pub festival_id: i64,
    pub file_url: String,
    pub display_order: i32,
    pub is_thumbnail: bool,
    // 'pending' | 'uploaded'
    pub upload_status: String,
}

/// Exhibition
///
/// An exhibition record from the `exhibitions` table. Same lifecycle as
/// `Festival` (visibility toggle, manual ordering, sanitized rich text).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Exhibition {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub place: String,
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub is_visible: bool,
    pub display_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// WelfareService
///
/// A welfare-service directory entry (`welfare_services` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct WelfareService {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub content: String,
    pub phone: String,
    pub address: String,
    pub is_visible: bool,
    pub display_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// GasStation
///
/// A gas station with its latest known fuel prices (`gas_stations` table).
/// Prices are integer KRW per liter; `None` means the feed did not report that
/// fuel type for the station. Rows are keyed by the upstream feed's station id
/// so the sync operation can upsert in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GasStation {
    pub id: i64,
    pub opinet_id: String,
    pub name: String,
    pub brand: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub gasoline_price: Option<i32>,
    pub diesel_price: Option<i32>,
    pub premium_price: Option<i32>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Pagination ---

/// Page
///
/// Envelope for every paginated public listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// ListFilter
///
/// The parsed, validated form of the public listing query parameters. Handlers
/// build this from the raw query string (clamping page/page_size) before any
/// repository call, so the data layer never sees unchecked input.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    // Admin listings include hidden rows; public listings never do.
    pub include_hidden: bool,
}

/// StationFilter
///
/// Parsed filter for the gas-station map listing. The bounding box is only
/// applied when all four corners are present.
#[derive(Debug, Clone, Default)]
pub struct StationFilter {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
    pub brand: Option<String>,
    pub search: Option<String>,
}

impl StationFilter {
    /// The bounding box, if the client supplied a complete one.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        match (self.min_lat, self.max_lat, self.min_lng, self.max_lng) {
            (Some(a), Some(b), Some(c), Some(d)) => Some((a, b, c, d)),
            _ => None,
        }
    }
}

// --- Content Kind (shared admin operations) ---

/// ContentKind
///
/// The three orderable, visibility-gated content tables. Shared admin
/// operations (visibility toggle, batch reorder) are parameterized over this
/// enum instead of duplicating one method per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Festival,
    Exhibition,
    Welfare,
}

impl ContentKind {
    /// The backing table name. Fixed set, never derived from request input.
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Festival => "festivals",
            ContentKind::Exhibition => "exhibitions",
            ContentKind::Welfare => "welfare_services",
        }
    }

    /// Entity label used in NotFound errors.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Festival => "festival",
            ContentKind::Exhibition => "exhibition",
            ContentKind::Welfare => "welfare service",
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/auth/login. The password is compared against
/// the stored bcrypt hash and never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// SessionResponse
///
/// The resolved session identity echoed by login and GET /api/auth/me.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// CreateFestivalRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFestivalRequest {
    pub title: String,
    pub content: String,
    pub category: String,
    pub location: String,
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
}

/// UpdateFestivalRequest
///
/// Partial update payload. `Option<T>` fields plus `skip_serializing_if` keep
/// the wire payload down to the fields actually being changed; the repository
/// applies them with COALESCE.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateFestivalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
}

/// CreateExhibitionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateExhibitionRequest {
    pub title: String,
    pub content: String,
    pub place: String,
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
}

/// UpdateExhibitionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateExhibitionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
}

/// CreateWelfareServiceRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateWelfareServiceRequest {
    pub name: String,
    pub category: String,
    pub content: String,
    pub phone: String,
    pub address: String,
}

/// UpdateWelfareServiceRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateWelfareServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// VisibilityRequest
///
/// Body of the admin visibility toggle endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VisibilityRequest {
    pub is_visible: bool,
}

/// ReorderItem
///
/// One (id, new display_order) pair of a reorder batch. Strictly typed: a
/// non-numeric id or order fails deserialization before any business logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct ReorderItem {
    pub id: i64,
    pub display_order: i32,
}

/// ReorderRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

/// ReorderResponse
///
/// Count of rows written plus the echoed batch, confirming what was applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReorderResponse {
    pub updated: u64,
    pub items: Vec<ReorderItem>,
}

/// SetThumbnailRequest
///
/// Body of the thumbnail endpoint. `is_thumbnail = true` promotes the target
/// image exclusively; `false` is a plain single-row unset.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SetThumbnailRequest {
    pub image_id: i64,
    pub is_thumbnail: bool,
}

/// PresignImageRequest
///
/// Input payload for requesting a short-lived upload URL for a festival image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PresignImageRequest {
    /// Original filename, used only to derive the extension.
    #[schema(example = "poster.jpg")]
    pub filename: String,
    /// MIME type; must be in the image allow-list and is enforced on the
    /// presigned PUT.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignImageResponse
///
/// The registered (pending) image row id plus the time-limited upload URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PresignImageResponse {
    pub image_id: i64,
    pub upload_url: String,
    pub file_url: String,
}

/// FestivalDetail
///
/// Public single-festival payload: the festival plus its uploaded gallery
/// images in display order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FestivalDetail {
    pub festival: Festival,
    pub images: Vec<FestivalImage>,
}

// --- Gas-Price Feed (Upstream Schema) ---

/// FeedStation
///
/// One station entry as reported by the external price feed. Internal to the
/// sync operation; upserted into `gas_stations` keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedStation {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    // Stations that do not sell a fuel type omit the key entirely.
    #[serde(default)]
    pub gasoline: Option<i32>,
    #[serde(default)]
    pub diesel: Option<i32>,
    #[serde(default)]
    pub premium: Option<i32>,
}

/// StationSyncResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StationSyncResponse {
    pub updated: u64,
}
