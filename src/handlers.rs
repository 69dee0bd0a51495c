use crate::{
    AppState,
    auth::{self, AuthSession},
    error::AppError,
    models::{
        CreateExhibitionRequest, CreateFestivalRequest, CreateWelfareServiceRequest, ContentKind,
        Exhibition, FeedStation, Festival, FestivalDetail, FestivalImage, GasStation, ListFilter,
        LoginRequest, Page, PresignImageRequest, PresignImageResponse, ReorderRequest,
        ReorderResponse, SessionResponse, SetThumbnailRequest, StationFilter,
        StationSyncResponse, UpdateExhibitionRequest, UpdateFestivalRequest,
        UpdateWelfareServiceRequest, VisibilityRequest, WelfareService,
    },
    sanitize::sanitize_html,
    storage::image_type_allowed,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// Default and maximum page sizes for public listings.
const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 100;

/// ListQuery
///
/// Raw query parameters accepted by the paginated listing endpoints. Parsed
/// into a validated `ListFilter` before any repository call; out-of-range
/// pagination values are clamped rather than rejected.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Items per page, clamped to 1..=100. Defaults to 12.
    pub page_size: Option<i64>,
    /// Case-insensitive search over title/name and content.
    pub search: Option<String>,
    /// Exact category filter.
    pub category: Option<String>,
    /// Exact location (or venue) filter.
    pub location: Option<String>,
}

impl ListQuery {
    fn into_filter(self, include_hidden: bool) -> ListFilter {
        ListFilter {
            page: self.page.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            search: self.search.filter(|s| !s.trim().is_empty()),
            category: self.category.filter(|s| !s.trim().is_empty()),
            location: self.location.filter(|s| !s.trim().is_empty()),
            include_hidden,
        }
    }
}

/// StationQuery
///
/// Raw query parameters of the gas-station map listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct StationQuery {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
    pub brand: Option<String>,
    pub search: Option<String>,
}

impl StationQuery {
    fn into_filter(self) -> StationFilter {
        StationFilter {
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lng: self.min_lng,
            max_lng: self.max_lng,
            brand: self.brand.filter(|s| !s.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

// --- Shared Validation Helpers ---

/// Handler-level shape checks for a reorder batch: non-empty, all orders
/// non-negative. Existence/state/duplicate checks run inside the repository
/// transaction where the current rows are visible.
fn validate_reorder_request(req: &ReorderRequest) -> Result<(), AppError> {
    if req.items.is_empty() {
        return Err(AppError::Validation("reorder batch is empty".to_string()));
    }
    for item in &req.items {
        if item.display_order < 0 {
            return Err(AppError::Validation(format!(
                "display_order must be non-negative (id {})",
                item.id
            )));
        }
    }
    Ok(())
}

// --- Page Stubs (Gate Targets) ---

/// login_page
///
/// [Page Route] Minimal login shell. The session gate bounces authenticated
/// admins from here to the dashboard.
pub async fn login_page() -> Html<&'static str> {
    Html(include_str!("pages/login.html"))
}

/// dashboard_page
///
/// [Page Route] Minimal admin dashboard shell. Reached only through the
/// session gate, which redirects everyone without an admin claim to /login.
pub async fn dashboard_page() -> Html<&'static str> {
    Html(include_str!("pages/dashboard.html"))
}

// --- Auth Handlers ---

/// login
///
/// [Public Route] Verifies email/password against `admin_users` and issues
/// the session cookie. Unknown email and wrong password produce the same 401
/// so the endpoint cannot be used to probe for accounts.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .repo
        .get_admin_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let verified = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !verified {
        return Err(AppError::Unauthorized);
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    let cookie = auth::session_cookie(&token, state.config.cookie_secure());

    let session = SessionResponse {
        id: user.id,
        email: user.email,
        role: user.role,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(session)))
}

/// logout
///
/// [Public Route] Expires the session cookie. Always succeeds; there is no
/// server-side session state to clean up.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cleared"))
)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = auth::clear_session_cookie(state.config.cookie_secure());
    ([(header::SET_COOKIE, cookie)], StatusCode::NO_CONTENT)
}

/// me
///
/// [Authenticated Route] Echoes the resolved session identity.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Session identity", body = SessionResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn me(session: AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        id: session.id,
        email: session.email,
        role: session.role,
    })
}

// --- Public Read Handlers ---

/// list_festivals
///
/// [Public Route] Paginated festival listing. Hidden rows are filtered in the
/// repository query; rich-text content is sanitized before serialization.
#[utoipa::path(
    get,
    path = "/api/festivals",
    params(ListQuery),
    responses((status = 200, description = "Festivals page", body = Page<Festival>))
)]
pub async fn list_festivals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Festival>>, AppError> {
    let mut page = state.repo.list_festivals(&query.into_filter(false)).await?;
    for festival in &mut page.items {
        festival.content = sanitize_html(&festival.content);
    }
    Ok(Json(page))
}

/// get_festival_details
///
/// [Public Route] One visible festival plus its uploaded gallery images in
/// display order.
#[utoipa::path(
    get,
    path = "/api/festivals/{id}",
    params(("id" = i64, Path, description = "Festival ID")),
    responses(
        (status = 200, description = "Festival detail", body = FestivalDetail),
        (status = 404, description = "Not found or hidden")
    )
)]
pub async fn get_festival_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FestivalDetail>, AppError> {
    let mut festival = state
        .repo
        .get_festival(id, false)
        .await?
        .ok_or(AppError::NotFound("festival"))?;
    festival.content = sanitize_html(&festival.content);

    let images = state.repo.list_festival_images(id, false).await?;

    Ok(Json(FestivalDetail { festival, images }))
}

/// list_exhibitions
///
/// [Public Route] Paginated exhibition listing, sanitized.
#[utoipa::path(
    get,
    path = "/api/exhibitions",
    params(ListQuery),
    responses((status = 200, description = "Exhibitions page", body = Page<Exhibition>))
)]
pub async fn list_exhibitions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Exhibition>>, AppError> {
    let mut page = state
        .repo
        .list_exhibitions(&query.into_filter(false))
        .await?;
    for exhibition in &mut page.items {
        exhibition.content = sanitize_html(&exhibition.content);
    }
    Ok(Json(page))
}

/// get_exhibition_details
#[utoipa::path(
    get,
    path = "/api/exhibitions/{id}",
    params(("id" = i64, Path, description = "Exhibition ID")),
    responses(
        (status = 200, description = "Exhibition detail", body = Exhibition),
        (status = 404, description = "Not found or hidden")
    )
)]
pub async fn get_exhibition_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Exhibition>, AppError> {
    let mut exhibition = state
        .repo
        .get_exhibition(id, false)
        .await?
        .ok_or(AppError::NotFound("exhibition"))?;
    exhibition.content = sanitize_html(&exhibition.content);
    Ok(Json(exhibition))
}

/// list_welfare_services
///
/// [Public Route] Paginated welfare-service directory, sanitized.
#[utoipa::path(
    get,
    path = "/api/welfare-services",
    params(ListQuery),
    responses((status = 200, description = "Welfare services page", body = Page<WelfareService>))
)]
pub async fn list_welfare_services(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<WelfareService>>, AppError> {
    let mut page = state
        .repo
        .list_welfare_services(&query.into_filter(false))
        .await?;
    for service in &mut page.items {
        service.content = sanitize_html(&service.content);
    }
    Ok(Json(page))
}

/// get_welfare_service_details
#[utoipa::path(
    get,
    path = "/api/welfare-services/{id}",
    params(("id" = i64, Path, description = "Welfare service ID")),
    responses(
        (status = 200, description = "Welfare service detail", body = WelfareService),
        (status = 404, description = "Not found or hidden")
    )
)]
pub async fn get_welfare_service_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WelfareService>, AppError> {
    let mut service = state
        .repo
        .get_welfare_service(id, false)
        .await?
        .ok_or(AppError::NotFound("welfare service"))?;
    service.content = sanitize_html(&service.content);
    Ok(Json(service))
}

/// list_gas_stations
///
/// [Public Route] Gas stations for the price map, cheapest gasoline first.
/// Accepts an optional bounding box so the map only loads the visible area.
#[utoipa::path(
    get,
    path = "/api/gas-stations",
    params(StationQuery),
    responses((status = 200, description = "Stations", body = [GasStation]))
)]
pub async fn list_gas_stations(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<Vec<GasStation>>, AppError> {
    let stations = state.repo.list_gas_stations(&query.into_filter()).await?;
    Ok(Json(stations))
}

/// get_gas_station_details
#[utoipa::path(
    get,
    path = "/api/gas-stations/{id}",
    params(("id" = i64, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Station detail", body = GasStation),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_gas_station_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<GasStation>, AppError> {
    let station = state
        .repo
        .get_gas_station(id)
        .await?
        .ok_or(AppError::NotFound("gas station"))?;
    Ok(Json(station))
}

// --- Admin: Festivals ---

/// admin_list_festivals
///
/// [Admin Route] All festivals including hidden ones, unsanitized (the
/// backoffice editor needs the raw markup).
#[utoipa::path(
    get,
    path = "/api/admin/festivals",
    params(ListQuery),
    responses((status = 200, description = "All festivals", body = Page<Festival>))
)]
pub async fn admin_list_festivals(
    session: AuthSession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Festival>>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let page = state.repo.list_festivals(&query.into_filter(true)).await?;
    Ok(Json(page))
}

/// create_festival
///
/// [Admin Route] New festivals start hidden and must be published explicitly.
#[utoipa::path(
    post,
    path = "/api/admin/festivals",
    request_body = CreateFestivalRequest,
    responses((status = 201, description = "Created", body = Festival))
)]
pub async fn create_festival(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateFestivalRequest>,
) -> Result<(StatusCode, Json<Festival>), AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    let festival = state.repo.create_festival(payload).await?;
    Ok((StatusCode::CREATED, Json(festival)))
}

/// update_festival
#[utoipa::path(
    put,
    path = "/api/admin/festivals/{id}",
    params(("id" = i64, Path, description = "Festival ID")),
    request_body = UpdateFestivalRequest,
    responses(
        (status = 200, description = "Updated", body = Festival),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_festival(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFestivalRequest>,
) -> Result<Json<Festival>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let festival = state
        .repo
        .update_festival(id, payload)
        .await?
        .ok_or(AppError::NotFound("festival"))?;
    Ok(Json(festival))
}

/// delete_festival
#[utoipa::path(
    delete,
    path = "/api/admin/festivals/{id}",
    params(("id" = i64, Path, description = "Festival ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_festival(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state.repo.delete_festival(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("festival"))
    }
}

/// set_festival_visibility
///
/// [Admin Route] Publishes or hides a festival. The moderation switch for the
/// public site.
#[utoipa::path(
    patch,
    path = "/api/admin/festivals/{id}/visibility",
    params(("id" = i64, Path, description = "Festival ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_festival_visibility(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisibilityRequest>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state
        .repo
        .set_content_visibility(ContentKind::Festival, id, payload.is_visible)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("festival"))
    }
}

/// reorder_festivals
///
/// [Admin Route] Applies a manual ordering batch to the festival list.
#[utoipa::path(
    put,
    path = "/api/admin/festivals/order",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Batch applied", body = ReorderResponse),
        (status = 400, description = "Invalid batch"),
        (status = 404, description = "Unknown festival in batch")
    )
)]
pub async fn reorder_festivals(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_reorder_request(&payload)?;
    let updated = state
        .repo
        .reorder_content(ContentKind::Festival, &payload.items)
        .await?;
    Ok(Json(ReorderResponse {
        updated,
        items: payload.items,
    }))
}

// --- Admin: Festival Images ---

/// admin_list_festival_images
///
/// [Admin Route] All gallery rows for a festival, pending uploads included.
#[utoipa::path(
    get,
    path = "/api/admin/festivals/{id}/images",
    params(("id" = i64, Path, description = "Festival ID")),
    responses((status = 200, description = "Images", body = [FestivalImage]))
)]
pub async fn admin_list_festival_images(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FestivalImage>>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let images = state.repo.list_festival_images(id, true).await?;
    Ok(Json(images))
}

/// presign_festival_image
///
/// [Admin Route] Starts the direct-to-storage upload pipeline: validates the
/// MIME type against the image allow-list, registers a pending image row, and
/// returns a short-lived presigned PUT URL. The row only becomes publicly
/// readable after the matching `complete` call.
#[utoipa::path(
    post,
    path = "/api/admin/festivals/{id}/images/presign",
    params(("id" = i64, Path, description = "Festival ID")),
    request_body = PresignImageRequest,
    responses(
        (status = 200, description = "Upload URL issued", body = PresignImageResponse),
        (status = 400, description = "Disallowed file type"),
        (status = 404, description = "Festival not found")
    )
)]
pub async fn presign_festival_image(
    session: AuthSession,
    State(state): State<AppState>,
    Path(festival_id): Path<i64>,
    Json(payload): Json<PresignImageRequest>,
) -> Result<Json<PresignImageResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if !image_type_allowed(&payload.file_type) {
        return Err(AppError::Validation(format!(
            "file type '{}' is not an allowed image type",
            payload.file_type
        )));
    }

    // Unique object key; only the extension of the client filename survives.
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("jpg");
    let object_key = format!("festivals/{}/{}.{}", festival_id, Uuid::new_v4(), extension);
    let file_url = format!("{}/{}", state.config.file_base_url, object_key);

    // Register the pending row first; 404s on a deleted festival before any
    // storage round trip.
    let image = state
        .repo
        .create_festival_image(festival_id, &file_url)
        .await?;

    let upload_url = state
        .storage
        .presign_image_upload(&object_key, &payload.file_type)
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(PresignImageResponse {
        image_id: image.id,
        upload_url,
        file_url,
    }))
}

/// complete_festival_image
///
/// [Admin Route] Confirms a finished upload, flipping the row to `uploaded`.
#[utoipa::path(
    post,
    path = "/api/admin/festivals/{id}/images/{image_id}/complete",
    params(
        ("id" = i64, Path, description = "Festival ID"),
        ("image_id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image uploaded", body = FestivalImage),
        (status = 404, description = "Not found")
    )
)]
pub async fn complete_festival_image(
    session: AuthSession,
    State(state): State<AppState>,
    Path((festival_id, image_id)): Path<(i64, i64)>,
) -> Result<Json<FestivalImage>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let image = state
        .repo
        .complete_festival_image(festival_id, image_id)
        .await?
        .ok_or(AppError::NotFound("image"))?;
    Ok(Json(image))
}

/// delete_festival_image
#[utoipa::path(
    delete,
    path = "/api/admin/festivals/{id}/images/{image_id}",
    params(
        ("id" = i64, Path, description = "Festival ID"),
        ("image_id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_festival_image(
    session: AuthSession,
    State(state): State<AppState>,
    Path((festival_id, image_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state
        .repo
        .delete_festival_image(festival_id, image_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("image"))
    }
}

/// reorder_festival_images
///
/// [Admin Route] Applies a gallery ordering batch in one transaction. The
/// response echoes the applied batch with the updated row count; a rejected
/// batch changes nothing.
#[utoipa::path(
    put,
    path = "/api/admin/festivals/{id}/images/order",
    params(("id" = i64, Path, description = "Festival ID")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Batch applied", body = ReorderResponse),
        (status = 400, description = "Invalid batch or image not uploaded"),
        (status = 404, description = "Unknown image in batch")
    )
)]
pub async fn reorder_festival_images(
    session: AuthSession,
    State(state): State<AppState>,
    Path(festival_id): Path<i64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_reorder_request(&payload)?;
    let updated = state
        .repo
        .reorder_festival_images(festival_id, &payload.items)
        .await?;
    Ok(Json(ReorderResponse {
        updated,
        items: payload.items,
    }))
}

/// set_festival_thumbnail
///
/// [Admin Route] Thumbnail promotion/demotion. Promotion is exclusive: the
/// repository guarantees at most one thumbnail per festival at any point.
#[utoipa::path(
    put,
    path = "/api/admin/festivals/{id}/images/thumbnail",
    params(("id" = i64, Path, description = "Festival ID")),
    request_body = SetThumbnailRequest,
    responses(
        (status = 204, description = "Applied"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn set_festival_thumbnail(
    session: AuthSession,
    State(state): State<AppState>,
    Path(festival_id): Path<i64>,
    Json(payload): Json<SetThumbnailRequest>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    state
        .repo
        .set_festival_thumbnail(festival_id, payload.image_id, payload.is_thumbnail)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Admin: Exhibitions ---

/// admin_list_exhibitions
#[utoipa::path(
    get,
    path = "/api/admin/exhibitions",
    params(ListQuery),
    responses((status = 200, description = "All exhibitions", body = Page<Exhibition>))
)]
pub async fn admin_list_exhibitions(
    session: AuthSession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Exhibition>>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let page = state.repo.list_exhibitions(&query.into_filter(true)).await?;
    Ok(Json(page))
}

/// create_exhibition
#[utoipa::path(
    post,
    path = "/api/admin/exhibitions",
    request_body = CreateExhibitionRequest,
    responses((status = 201, description = "Created", body = Exhibition))
)]
pub async fn create_exhibition(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateExhibitionRequest>,
) -> Result<(StatusCode, Json<Exhibition>), AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    let exhibition = state.repo.create_exhibition(payload).await?;
    Ok((StatusCode::CREATED, Json(exhibition)))
}

/// update_exhibition
#[utoipa::path(
    put,
    path = "/api/admin/exhibitions/{id}",
    params(("id" = i64, Path, description = "Exhibition ID")),
    request_body = UpdateExhibitionRequest,
    responses(
        (status = 200, description = "Updated", body = Exhibition),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_exhibition(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExhibitionRequest>,
) -> Result<Json<Exhibition>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let exhibition = state
        .repo
        .update_exhibition(id, payload)
        .await?
        .ok_or(AppError::NotFound("exhibition"))?;
    Ok(Json(exhibition))
}

/// delete_exhibition
#[utoipa::path(
    delete,
    path = "/api/admin/exhibitions/{id}",
    params(("id" = i64, Path, description = "Exhibition ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_exhibition(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state.repo.delete_exhibition(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("exhibition"))
    }
}

/// set_exhibition_visibility
#[utoipa::path(
    patch,
    path = "/api/admin/exhibitions/{id}/visibility",
    params(("id" = i64, Path, description = "Exhibition ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_exhibition_visibility(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisibilityRequest>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state
        .repo
        .set_content_visibility(ContentKind::Exhibition, id, payload.is_visible)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("exhibition"))
    }
}

/// reorder_exhibitions
#[utoipa::path(
    put,
    path = "/api/admin/exhibitions/order",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Batch applied", body = ReorderResponse),
        (status = 400, description = "Invalid batch"),
        (status = 404, description = "Unknown exhibition in batch")
    )
)]
pub async fn reorder_exhibitions(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_reorder_request(&payload)?;
    let updated = state
        .repo
        .reorder_content(ContentKind::Exhibition, &payload.items)
        .await?;
    Ok(Json(ReorderResponse {
        updated,
        items: payload.items,
    }))
}

// --- Admin: Welfare Services ---

/// admin_list_welfare_services
#[utoipa::path(
    get,
    path = "/api/admin/welfare-services",
    params(ListQuery),
    responses((status = 200, description = "All welfare services", body = Page<WelfareService>))
)]
pub async fn admin_list_welfare_services(
    session: AuthSession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<WelfareService>>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let page = state
        .repo
        .list_welfare_services(&query.into_filter(true))
        .await?;
    Ok(Json(page))
}

/// create_welfare_service
#[utoipa::path(
    post,
    path = "/api/admin/welfare-services",
    request_body = CreateWelfareServiceRequest,
    responses((status = 201, description = "Created", body = WelfareService))
)]
pub async fn create_welfare_service(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateWelfareServiceRequest>,
) -> Result<(StatusCode, Json<WelfareService>), AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    let service = state.repo.create_welfare_service(payload).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// update_welfare_service
#[utoipa::path(
    put,
    path = "/api/admin/welfare-services/{id}",
    params(("id" = i64, Path, description = "Welfare service ID")),
    request_body = UpdateWelfareServiceRequest,
    responses(
        (status = 200, description = "Updated", body = WelfareService),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_welfare_service(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateWelfareServiceRequest>,
) -> Result<Json<WelfareService>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    let service = state
        .repo
        .update_welfare_service(id, payload)
        .await?
        .ok_or(AppError::NotFound("welfare service"))?;
    Ok(Json(service))
}

/// delete_welfare_service
#[utoipa::path(
    delete,
    path = "/api/admin/welfare-services/{id}",
    params(("id" = i64, Path, description = "Welfare service ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_welfare_service(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state.repo.delete_welfare_service(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("welfare service"))
    }
}

/// set_welfare_service_visibility
#[utoipa::path(
    patch,
    path = "/api/admin/welfare-services/{id}/visibility",
    params(("id" = i64, Path, description = "Welfare service ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_welfare_service_visibility(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisibilityRequest>,
) -> Result<StatusCode, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    if state
        .repo
        .set_content_visibility(ContentKind::Welfare, id, payload.is_visible)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("welfare service"))
    }
}

/// reorder_welfare_services
#[utoipa::path(
    put,
    path = "/api/admin/welfare-services/order",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Batch applied", body = ReorderResponse),
        (status = 400, description = "Invalid batch"),
        (status = 404, description = "Unknown welfare service in batch")
    )
)]
pub async fn reorder_welfare_services(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_reorder_request(&payload)?;
    let updated = state
        .repo
        .reorder_content(ContentKind::Welfare, &payload.items)
        .await?;
    Ok(Json(ReorderResponse {
        updated,
        items: payload.items,
    }))
}

// --- Admin: Gas-Price Sync ---

/// sync_gas_stations
///
/// [Admin Route] Pulls the external price feed and upserts the full snapshot
/// in one transaction. Feed errors surface as 502 without partial writes.
#[utoipa::path(
    post,
    path = "/api/admin/gas-stations/sync",
    responses(
        (status = 200, description = "Feed applied", body = StationSyncResponse),
        (status = 502, description = "Price feed unavailable")
    )
)]
pub async fn sync_gas_stations(
    session: AuthSession,
    State(state): State<AppState>,
) -> Result<Json<StationSyncResponse>, AppError> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }

    let client = reqwest::Client::new();
    let mut request = client.get(&state.config.price_feed_url);
    if let Some(key) = &state.config.price_feed_key {
        request = request.header("apikey", key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "price feed returned {}",
            response.status()
        )));
    }

    let stations: Vec<FeedStation> = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let updated = state.repo.upsert_gas_stations(&stations).await?;
    Ok(Json(StationSyncResponse { updated }))
}
