use civic_portal::{
    error::AppError,
    models::{ContentKind, CreateFestivalRequest, FeedStation, ListFilter, ReorderItem},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Creates a festival through the repository; unique category/location marker
/// keeps each test's rows distinguishable in a shared database.
async fn create_test_festival(repo: &PostgresRepository, marker: &str) -> i64 {
    let festival = repo
        .create_festival(CreateFestivalRequest {
            title: format!("Festival {}", marker),
            content: "<p>seed</p>".to_string(),
            category: marker.to_string(),
            location: "Test City".to_string(),
            start_date: None,
            end_date: None,
        })
        .await
        .expect("Failed to create test festival");
    festival.id
}

/// Inserts an image row directly, controlling upload_status.
async fn seed_image(pool: &PgPool, festival_id: i64, order: i32, status: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO festival_images \
             (festival_id, file_url, display_order, is_thumbnail, upload_status) \
         VALUES ($1, $2, $3, false, $4) RETURNING id",
    )
    .bind(festival_id)
    .bind(format!("http://files.test/{}/{}.jpg", festival_id, order))
    .bind(order)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("Failed to seed image")
}

async fn image_orders(pool: &PgPool, festival_id: i64) -> Vec<(i64, i32)> {
    sqlx::query_as(
        "SELECT id, display_order FROM festival_images WHERE festival_id = $1 ORDER BY id",
    )
    .bind(festival_id)
    .fetch_all(pool)
    .await
    .expect("Failed to read image orders")
}

async fn thumbnail_ids(pool: &PgPool, festival_id: i64) -> Vec<i64> {
    sqlx::query_scalar(
        "SELECT id FROM festival_images WHERE festival_id = $1 AND is_thumbnail = true",
    )
    .bind(festival_id)
    .fetch_all(pool)
    .await
    .expect("Failed to read thumbnails")
}

fn marker() -> String {
    format!("t-{}", Uuid::new_v4().simple())
}

// --- Reorder Tests ---

#[test]
async fn test_reorder_applies_exact_mapping() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;
    let b = seed_image(&ctx.pool, festival_id, 1, "uploaded").await;
    let c = seed_image(&ctx.pool, festival_id, 2, "uploaded").await;

    // Reverse the gallery.
    let batch = vec![
        ReorderItem {
            id: c,
            display_order: 0,
        },
        ReorderItem {
            id: b,
            display_order: 1,
        },
        ReorderItem {
            id: a,
            display_order: 2,
        },
    ];
    let updated = repo
        .reorder_festival_images(festival_id, &batch)
        .await
        .expect("reorder should succeed");
    assert_eq!(updated, 3);

    // Re-reading yields exactly the input mapping.
    let orders = image_orders(&ctx.pool, festival_id).await;
    assert_eq!(orders, vec![(a, 2), (b, 1), (c, 0)]);
}

#[test]
async fn test_reorder_duplicate_id_changes_nothing() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;
    let b = seed_image(&ctx.pool, festival_id, 1, "uploaded").await;
    let before = image_orders(&ctx.pool, festival_id).await;

    let batch = vec![
        ReorderItem {
            id: a,
            display_order: 5,
        },
        ReorderItem {
            id: a,
            display_order: 6,
        },
        ReorderItem {
            id: b,
            display_order: 7,
        },
    ];
    let err = repo
        .reorder_festival_images(festival_id, &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The rejected batch must not have touched any row.
    let after = image_orders(&ctx.pool, festival_id).await;
    assert_eq!(before, after);
}

#[test]
async fn test_reorder_pending_image_rejected() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;
    let pending = seed_image(&ctx.pool, festival_id, 1, "pending").await;
    let before = image_orders(&ctx.pool, festival_id).await;

    let batch = vec![
        ReorderItem {
            id: a,
            display_order: 1,
        },
        ReorderItem {
            id: pending,
            display_order: 0,
        },
    ];
    let err = repo
        .reorder_festival_images(festival_id, &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Invariant(_)));

    let after = image_orders(&ctx.pool, festival_id).await;
    assert_eq!(before, after);
}

#[test]
async fn test_reorder_unknown_image_rejected() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;

    let batch = vec![
        ReorderItem {
            id: a,
            display_order: 1,
        },
        ReorderItem {
            id: a + 999_999,
            display_order: 0,
        },
    ];
    let err = repo
        .reorder_festival_images(festival_id, &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
async fn test_reorder_rejects_image_of_other_festival() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_a = create_test_festival(&repo, &marker()).await;
    let festival_b = create_test_festival(&repo, &marker()).await;

    let foreign = seed_image(&ctx.pool, festival_b, 0, "uploaded").await;

    let batch = vec![ReorderItem {
        id: foreign,
        display_order: 0,
    }];
    let err = repo
        .reorder_festival_images(festival_a, &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// --- Thumbnail Tests ---

#[test]
async fn test_thumbnail_promotion_is_exclusive() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;
    let b = seed_image(&ctx.pool, festival_id, 1, "uploaded").await;

    repo.set_festival_thumbnail(festival_id, a, true)
        .await
        .expect("promote a");
    assert_eq!(thumbnail_ids(&ctx.pool, festival_id).await, vec![a]);

    // Promoting b must atomically demote a.
    repo.set_festival_thumbnail(festival_id, b, true)
        .await
        .expect("promote b");
    assert_eq!(thumbnail_ids(&ctx.pool, festival_id).await, vec![b]);
}

#[test]
async fn test_thumbnail_promotion_idempotent() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;

    repo.set_festival_thumbnail(festival_id, a, true)
        .await
        .expect("promote");
    repo.set_festival_thumbnail(festival_id, a, true)
        .await
        .expect("re-promote");

    assert_eq!(thumbnail_ids(&ctx.pool, festival_id).await, vec![a]);
}

#[test]
async fn test_thumbnail_unset_is_plain_write() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let a = seed_image(&ctx.pool, festival_id, 0, "uploaded").await;
    repo.set_festival_thumbnail(festival_id, a, true)
        .await
        .expect("promote");

    repo.set_festival_thumbnail(festival_id, a, false)
        .await
        .expect("demote");
    assert!(thumbnail_ids(&ctx.pool, festival_id).await.is_empty());
}

#[test]
async fn test_thumbnail_unknown_image_not_found() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let festival_id = create_test_festival(&repo, &marker()).await;

    let err = repo
        .set_festival_thumbnail(festival_id, 999_999_999, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// --- Visibility & Listing Tests ---

#[test]
async fn test_public_listing_hides_invisible_rows() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let category = marker();

    let hidden = create_test_festival(&repo, &category).await;
    let published = create_test_festival(&repo, &category).await;
    repo.set_content_visibility(ContentKind::Festival, published, true)
        .await
        .expect("publish");

    let filter = ListFilter {
        page: 1,
        page_size: 50,
        category: Some(category.clone()),
        ..Default::default()
    };
    let page = repo.list_festivals(&filter).await.expect("list");

    assert_eq!(page.total, 1);
    assert!(page.items.iter().all(|f| f.id != hidden));
    assert!(page.items.iter().any(|f| f.id == published));

    // Admin listing sees both.
    let admin_filter = ListFilter {
        include_hidden: true,
        ..filter
    };
    let admin_page = repo.list_festivals(&admin_filter).await.expect("list all");
    assert_eq!(admin_page.total, 2);
}

#[test]
async fn test_listing_pagination_and_search() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let category = marker();

    for _ in 0..3 {
        let id = create_test_festival(&repo, &category).await;
        repo.set_content_visibility(ContentKind::Festival, id, true)
            .await
            .expect("publish");
    }

    let filter = ListFilter {
        page: 1,
        page_size: 2,
        category: Some(category.clone()),
        ..Default::default()
    };
    let page = repo.list_festivals(&filter).await.expect("page 1");
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let page2 = repo
        .list_festivals(&ListFilter {
            page: 2,
            ..filter.clone()
        })
        .await
        .expect("page 2");
    assert_eq!(page2.items.len(), 1);

    // Search matches the seeded title, case-insensitively.
    let search = repo
        .list_festivals(&ListFilter {
            page: 1,
            page_size: 10,
            category: Some(category),
            search: Some("FESTIVAL".to_string()),
            ..Default::default()
        })
        .await
        .expect("search");
    assert_eq!(search.total, 3);
}

#[test]
async fn test_update_festival_is_partial() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = create_test_festival(&repo, &marker()).await;

    let updated = repo
        .update_festival(
            id,
            civic_portal::models::UpdateFestivalRequest {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");

    assert_eq!(updated.title, "Renamed");
    // Untouched fields keep their values.
    assert_eq!(updated.content, "<p>seed</p>");
}

// --- Gas Station Tests ---

#[test]
async fn test_station_upsert_updates_in_place() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let opinet_id = format!("OP-{}", Uuid::new_v4().simple());

    let mut feed = vec![FeedStation {
        id: opinet_id.clone(),
        name: "City Gas".to_string(),
        brand: "SK".to_string(),
        address: "1 Main St".to_string(),
        lat: 37.65,
        lng: 126.83,
        gasoline: Some(1650),
        diesel: Some(1500),
        premium: None,
    }];

    repo.upsert_gas_stations(&feed).await.expect("first sync");

    // Second snapshot with a new price must update, not duplicate.
    feed[0].gasoline = Some(1700);
    repo.upsert_gas_stations(&feed).await.expect("second sync");

    let rows: Vec<(String, Option<i32>)> = sqlx::query_as(
        "SELECT opinet_id, gasoline_price FROM gas_stations WHERE opinet_id = $1",
    )
    .bind(&opinet_id)
    .fetch_all(&ctx.pool)
    .await
    .expect("read station");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, Some(1700));
}

// --- Admin User Tests ---

#[test]
async fn test_get_admin_user_by_email() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let id = Uuid::new_v4();
    let email = format!("{}@city.example", id.simple());
    sqlx::query(
        "INSERT INTO admin_users (id, email, role, password_hash) VALUES ($1, $2, 'admin', $3)",
    )
    .bind(id)
    .bind(&email)
    .bind("$2b$04$notarealhash")
    .execute(&ctx.pool)
    .await
    .expect("seed admin");

    let user = repo
        .get_admin_user_by_email(&email)
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.role, "admin");

    let missing = repo
        .get_admin_user_by_email("nobody@city.example")
        .await
        .expect("query");
    assert!(missing.is_none());
}
