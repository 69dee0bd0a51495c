use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use civic_portal::{
    AppState,
    auth::AuthSession,
    config::AppConfig,
    error::AppError,
    handlers,
    models::{
        AdminUser, CreateExhibitionRequest, CreateFestivalRequest, CreateWelfareServiceRequest,
        ContentKind, Exhibition, FeedStation, Festival, FestivalImage, GasStation, ListFilter,
        LoginRequest, Page, PresignImageRequest, ReorderItem, ReorderRequest,
        SetThumbnailRequest, StationFilter, UpdateExhibitionRequest, UpdateFestivalRequest,
        UpdateWelfareServiceRequest, VisibilityRequest, WelfareService,
    },
    repository::{Repository, RepositoryState},
    storage::{MockStorageService, StorageState},
};
use std::sync::Arc;
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for handler tests: pre-canned outputs per method.
// Handlers depend on the Repository trait, so this substitutes cleanly.
pub struct MockRepoControl {
    pub admin_user: Option<AdminUser>,
    pub festivals_to_return: Vec<Festival>,
    pub festival_to_return: Option<Festival>,
    pub images_to_return: Vec<FestivalImage>,
    pub image_to_return: FestivalImage,
    pub reorder_updated: u64,
    pub visibility_result: bool,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            admin_user: None,
            festivals_to_return: vec![],
            festival_to_return: Some(Festival::default()),
            images_to_return: vec![],
            image_to_return: FestivalImage::default(),
            reorder_updated: 0,
            visibility_result: true,
        }
    }
}

fn page_of<T>(items: Vec<T>) -> Page<T> {
    let total = items.len() as i64;
    Page {
        items,
        page: 1,
        page_size: 12,
        total,
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn list_festivals(&self, _f: &ListFilter) -> Result<Page<Festival>, AppError> {
        Ok(page_of(self.festivals_to_return.clone()))
    }
    async fn get_festival(&self, _id: i64, _h: bool) -> Result<Option<Festival>, AppError> {
        Ok(self.festival_to_return.clone())
    }
    async fn create_festival(&self, req: CreateFestivalRequest) -> Result<Festival, AppError> {
        Ok(Festival {
            id: 1,
            title: req.title,
            content: req.content,
            category: req.category,
            location: req.location,
            start_date: req.start_date,
            end_date: req.end_date,
            ..Festival::default()
        })
    }
    async fn update_festival(
        &self,
        _id: i64,
        _r: UpdateFestivalRequest,
    ) -> Result<Option<Festival>, AppError> {
        Ok(self.festival_to_return.clone())
    }
    async fn delete_festival(&self, _id: i64) -> Result<bool, AppError> {
        Ok(self.visibility_result)
    }
    async fn list_festival_images(
        &self,
        _f: i64,
        _p: bool,
    ) -> Result<Vec<FestivalImage>, AppError> {
        Ok(self.images_to_return.clone())
    }
    async fn create_festival_image(&self, _f: i64, _u: &str) -> Result<FestivalImage, AppError> {
        Ok(self.image_to_return.clone())
    }
    async fn complete_festival_image(
        &self,
        _f: i64,
        _i: i64,
    ) -> Result<Option<FestivalImage>, AppError> {
        Ok(Some(self.image_to_return.clone()))
    }
    async fn delete_festival_image(&self, _f: i64, _i: i64) -> Result<bool, AppError> {
        Ok(self.visibility_result)
    }
    async fn reorder_festival_images(
        &self,
        _f: i64,
        items: &[ReorderItem],
    ) -> Result<u64, AppError> {
        let _ = items;
        Ok(self.reorder_updated)
    }
    async fn set_festival_thumbnail(&self, _f: i64, _i: i64, _t: bool) -> Result<(), AppError> {
        Ok(())
    }
    async fn list_exhibitions(&self, _f: &ListFilter) -> Result<Page<Exhibition>, AppError> {
        Ok(page_of(vec![]))
    }
    async fn get_exhibition(&self, _id: i64, _h: bool) -> Result<Option<Exhibition>, AppError> {
        Ok(None)
    }
    async fn create_exhibition(&self, _r: CreateExhibitionRequest) -> Result<Exhibition, AppError> {
        Ok(Exhibition::default())
    }
    async fn update_exhibition(
        &self,
        _id: i64,
        _r: UpdateExhibitionRequest,
    ) -> Result<Option<Exhibition>, AppError> {
        Ok(None)
    }
    async fn delete_exhibition(&self, _id: i64) -> Result<bool, AppError> {
        Ok(false)
    }
    async fn list_welfare_services(
        &self,
        _f: &ListFilter,
    ) -> Result<Page<WelfareService>, AppError> {
        Ok(page_of(vec![]))
    }
    async fn get_welfare_service(
        &self,
        _id: i64,
        _h: bool,
    ) -> Result<Option<WelfareService>, AppError> {
        Ok(None)
    }
    async fn create_welfare_service(
        &self,
        _r: CreateWelfareServiceRequest,
    ) -> Result<WelfareService, AppError> {
        Ok(WelfareService::default())
    }
    async fn update_welfare_service(
        &self,
        _id: i64,
        _r: UpdateWelfareServiceRequest,
    ) -> Result<Option<WelfareService>, AppError> {
        Ok(None)
    }
    async fn delete_welfare_service(&self, _id: i64) -> Result<bool, AppError> {
        Ok(false)
    }
    async fn set_content_visibility(
        &self,
        _k: ContentKind,
        _id: i64,
        _v: bool,
    ) -> Result<bool, AppError> {
        Ok(self.visibility_result)
    }
    async fn reorder_content(
        &self,
        _k: ContentKind,
        _items: &[ReorderItem],
    ) -> Result<u64, AppError> {
        Ok(self.reorder_updated)
    }
    async fn list_gas_stations(&self, _f: &StationFilter) -> Result<Vec<GasStation>, AppError> {
        Ok(vec![])
    }
    async fn get_gas_station(&self, _id: i64) -> Result<Option<GasStation>, AppError> {
        Ok(None)
    }
    async fn upsert_gas_stations(&self, _s: &[FeedStation]) -> Result<u64, AppError> {
        Ok(0)
    }
    async fn get_admin_user(&self, _id: Uuid) -> Result<Option<AdminUser>, AppError> {
        Ok(self.admin_user.clone())
    }
    async fn get_admin_user_by_email(&self, _email: &str) -> Result<Option<AdminUser>, AppError> {
        Ok(self.admin_user.clone())
    }
}

// --- Helpers ---

fn make_state(repo: MockRepoControl) -> AppState {
    AppState {
        repo: Arc::new(repo) as RepositoryState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    }
}

fn admin_session() -> AuthSession {
    AuthSession {
        id: Uuid::new_v4(),
        email: "ops@city.example".to_string(),
        role: "admin".to_string(),
    }
}

fn user_session() -> AuthSession {
    AuthSession {
        id: Uuid::new_v4(),
        email: "viewer@city.example".to_string(),
        role: "user".to_string(),
    }
}

fn stored_admin(password: &str) -> AdminUser {
    AdminUser {
        id: Uuid::new_v4(),
        email: "ops@city.example".to_string(),
        role: "admin".to_string(),
        password_hash: bcrypt::hash(password, 4).expect("hash"),
    }
}

// --- Login Tests ---

#[tokio::test]
async fn test_login_success_sets_session_cookie() {
    let state = make_state(MockRepoControl {
        admin_user: Some(stored_admin("correct horse")),
        ..Default::default()
    });

    let response = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "ops@city.example".to_string(),
            password: "correct horse".to_string(),
        }),
    )
    .await
    .expect("login ok")
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("cookie header")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("portal_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let state = make_state(MockRepoControl {
        admin_user: Some(stored_admin("correct horse")),
        ..Default::default()
    });

    let result = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "ops@city.example".to_string(),
            password: "battery staple".to_string(),
        }),
    )
    .await;

    let Err(err) = result else {
        panic!("wrong password must be rejected")
    };
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_email_indistinguishable() {
    // Repo has no user at all; the status must match the wrong-password case.
    let state = make_state(MockRepoControl::default());

    let result = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "ghost@city.example".to_string(),
            password: "anything".to_string(),
        }),
    )
    .await;

    let Err(err) = result else {
        panic!("unknown email must be rejected")
    };
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_echoes_session() {
    let session = admin_session();
    let expected_id = session.id;

    let Json(body) = handlers::me(session).await;
    assert_eq!(body.id, expected_id);
    assert_eq!(body.role, "admin");
}

// --- Authorization Tests ---

#[tokio::test]
async fn test_admin_handler_rejects_non_admin_role() {
    let state = make_state(MockRepoControl::default());

    let err = handlers::admin_list_festivals(
        user_session(),
        State(state),
        Query(axum_query(serde_json::json!({}))),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

// Query<T> cannot be built from a unit literal; deserialize through serde.
fn axum_query(value: serde_json::Value) -> handlers::ListQuery {
    serde_json::from_value(value).unwrap()
}

// --- Reorder Validation Tests ---

#[tokio::test]
async fn test_reorder_images_rejects_empty_batch() {
    let state = make_state(MockRepoControl::default());

    let err = handlers::reorder_festival_images(
        admin_session(),
        State(state),
        Path(1),
        Json(ReorderRequest { items: vec![] }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reorder_images_rejects_negative_order() {
    let state = make_state(MockRepoControl::default());

    let err = handlers::reorder_festival_images(
        admin_session(),
        State(state),
        Path(1),
        Json(ReorderRequest {
            items: vec![ReorderItem {
                id: 7,
                display_order: -1,
            }],
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reorder_images_echoes_applied_batch() {
    let state = make_state(MockRepoControl {
        reorder_updated: 2,
        ..Default::default()
    });

    let items = vec![
        ReorderItem {
            id: 5,
            display_order: 0,
        },
        ReorderItem {
            id: 3,
            display_order: 1,
        },
    ];

    let Json(body) = handlers::reorder_festival_images(
        admin_session(),
        State(state),
        Path(1),
        Json(ReorderRequest {
            items: items.clone(),
        }),
    )
    .await
    .expect("reorder ok");

    assert_eq!(body.updated, 2);
    assert_eq!(body.items, items);
}

// --- Public Read Tests ---

#[tokio::test]
async fn test_public_list_sanitizes_content() {
    let festival = Festival {
        id: 9,
        title: "Lantern Festival".to_string(),
        content: "<p>Lanterns</p><script>steal()</script>".to_string(),
        ..Festival::default()
    };
    let state = make_state(MockRepoControl {
        festivals_to_return: vec![festival],
        ..Default::default()
    });

    let Json(page) = handlers::list_festivals(
        State(state),
        Query(axum_query(serde_json::json!({}))),
    )
    .await
    .expect("list ok");

    assert_eq!(page.items[0].content, "<p>Lanterns</p>");
}

#[tokio::test]
async fn test_public_detail_not_found_when_hidden() {
    let state = make_state(MockRepoControl {
        festival_to_return: None,
        ..Default::default()
    });

    let err = handlers::get_festival_details(State(state), Path(404))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

// --- Admin Content Tests ---

#[tokio::test]
async fn test_visibility_toggle_not_found() {
    let state = make_state(MockRepoControl {
        visibility_result: false,
        ..Default::default()
    });

    let err = handlers::set_festival_visibility(
        admin_session(),
        State(state),
        Path(123),
        Json(VisibilityRequest { is_visible: true }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_festival_rejects_blank_title() {
    let state = make_state(MockRepoControl::default());

    let err = handlers::create_festival(
        admin_session(),
        State(state),
        Json(CreateFestivalRequest {
            title: "   ".to_string(),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_thumbnail_handler_returns_no_content() {
    let state = make_state(MockRepoControl::default());

    let status = handlers::set_festival_thumbnail(
        admin_session(),
        State(state),
        Path(1),
        Json(SetThumbnailRequest {
            image_id: 4,
            is_thumbnail: true,
        }),
    )
    .await
    .expect("thumbnail ok");

    assert_eq!(status, StatusCode::NO_CONTENT);
}

// --- Image Pipeline Tests ---

#[tokio::test]
async fn test_presign_rejects_non_image_type() {
    let state = make_state(MockRepoControl::default());

    let err = handlers::presign_festival_image(
        admin_session(),
        State(state),
        Path(1),
        Json(PresignImageRequest {
            filename: "report.pdf".to_string(),
            file_type: "application/pdf".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_presign_returns_upload_url_and_image_row() {
    let state = make_state(MockRepoControl {
        image_to_return: FestivalImage {
            id: 42,
            festival_id: 1,
            upload_status: "pending".to_string(),
            ..Default::default()
        },
        ..Default::default()
    });

    let Json(body) = handlers::presign_festival_image(
        admin_session(),
        State(state),
        Path(1),
        Json(PresignImageRequest {
            filename: "poster.png".to_string(),
            file_type: "image/png".to_string(),
        }),
    )
    .await
    .expect("presign ok");

    assert_eq!(body.image_id, 42);
    // The mock storage produces a deterministic signed URL.
    assert!(body.upload_url.contains("signature=fake"));
    assert!(body.file_url.contains("festivals/1/"));
}
