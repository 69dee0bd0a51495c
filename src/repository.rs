use crate::error::AppError;
use crate::models::{
    AdminUser, ContentKind, CreateExhibitionRequest, CreateFestivalRequest,
    CreateWelfareServiceRequest, Exhibition, FeedStation, Festival, FestivalImage, GasStation,
    ListFilter, Page, ReorderItem, StationFilter, UpdateExhibitionRequest, UpdateFestivalRequest,
    UpdateWelfareServiceRequest, WelfareService,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers depend on this
/// trait (as `Arc<dyn Repository>`), never on the Postgres implementation, so
/// tests can substitute a mock without touching handler code.
///
/// Every method returns `Result<_, AppError>`; connection and query failures
/// surface as `AppError::Store` and are normalized to a generic 500 at the
/// boundary.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Festivals ---
    async fn list_festivals(&self, filter: &ListFilter) -> Result<Page<Festival>, AppError>;
    async fn get_festival(&self, id: i64, include_hidden: bool)
    -> Result<Option<Festival>, AppError>;
    async fn create_festival(&self, req: CreateFestivalRequest) -> Result<Festival, AppError>;
    async fn update_festival(
        &self,
        id: i64,
        req: UpdateFestivalRequest,
    ) -> Result<Option<Festival>, AppError>;
    async fn delete_festival(&self, id: i64) -> Result<bool, AppError>;

    // --- Festival Images ---
    async fn list_festival_images(
        &self,
        festival_id: i64,
        include_pending: bool,
    ) -> Result<Vec<FestivalImage>, AppError>;
    // Registers a pending image row when a presigned upload is issued.
    async fn create_festival_image(
        &self,
        festival_id: i64,
        file_url: &str,
    ) -> Result<FestivalImage, AppError>;
    // Marks the row uploaded once the client confirms the transfer.
    async fn complete_festival_image(
        &self,
        festival_id: i64,
        image_id: i64,
    ) -> Result<Option<FestivalImage>, AppError>;
    async fn delete_festival_image(&self, festival_id: i64, image_id: i64)
    -> Result<bool, AppError>;
    // Applies a full order batch in one transaction. See `check_image_batch`
    // for the validation sequence.
    async fn reorder_festival_images(
        &self,
        festival_id: i64,
        items: &[ReorderItem],
    ) -> Result<u64, AppError>;
    // Thumbnail promotion is a single atomic transition: at no point can two
    // images of one festival be observed as thumbnails.
    async fn set_festival_thumbnail(
        &self,
        festival_id: i64,
        image_id: i64,
        is_thumbnail: bool,
    ) -> Result<(), AppError>;

    // --- Exhibitions ---
    async fn list_exhibitions(&self, filter: &ListFilter) -> Result<Page<Exhibition>, AppError>;
    async fn get_exhibition(
        &self,
        id: i64,
        include_hidden: bool,
    ) -> Result<Option<Exhibition>, AppError>;
    async fn create_exhibition(&self, req: CreateExhibitionRequest)
    -> Result<Exhibition, AppError>;
    async fn update_exhibition(
        &self,
        id: i64,
        req: UpdateExhibitionRequest,
    ) -> Result<Option<Exhibition>, AppError>;
    async fn delete_exhibition(&self, id: i64) -> Result<bool, AppError>;

    // --- Welfare Services ---
    async fn list_welfare_services(
        &self,
        filter: &ListFilter,
    ) -> Result<Page<WelfareService>, AppError>;
    async fn get_welfare_service(
        &self,
        id: i64,
        include_hidden: bool,
    ) -> Result<Option<WelfareService>, AppError>;
    async fn create_welfare_service(
        &self,
        req: CreateWelfareServiceRequest,
    ) -> Result<WelfareService, AppError>;
    async fn update_welfare_service(
        &self,
        id: i64,
        req: UpdateWelfareServiceRequest,
    ) -> Result<Option<WelfareService>, AppError>;
    async fn delete_welfare_service(&self, id: i64) -> Result<bool, AppError>;

    // --- Shared Content Operations ---
    // Visibility toggle; returns false when the row does not exist.
    async fn set_content_visibility(
        &self,
        kind: ContentKind,
        id: i64,
        visible: bool,
    ) -> Result<bool, AppError>;
    // Batch reorder of content rows, transactional like the image variant but
    // without the upload-status rule.
    async fn reorder_content(&self, kind: ContentKind, items: &[ReorderItem])
    -> Result<u64, AppError>;

    // --- Gas Stations ---
    async fn list_gas_stations(&self, filter: &StationFilter)
    -> Result<Vec<GasStation>, AppError>;
    async fn get_gas_station(&self, id: i64) -> Result<Option<GasStation>, AppError>;
    // Upserts the whole feed snapshot in one transaction, keyed by opinet_id.
    async fn upsert_gas_stations(&self, stations: &[FeedStation]) -> Result<u64, AppError>;

    // --- Admin Users ---
    async fn get_admin_user(&self, id: Uuid) -> Result<Option<AdminUser>, AppError>;
    async fn get_admin_user_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Batch Validation (pure, shared by Postgres impl and tests) ---

/// check_image_batch
///
/// Validates a reorder batch against the image rows actually present for the
/// festival, in the contract's order: unknown id first (NotFound), then
/// not-yet-uploaded rows (Invariant), then duplicate ids (Validation).
/// `rows` is (id, upload_status) as read inside the reorder transaction.
pub fn check_image_batch(items: &[ReorderItem], rows: &[(i64, String)]) -> Result<(), AppError> {
    let by_id: HashMap<i64, &str> = rows.iter().map(|(id, s)| (*id, s.as_str())).collect();

    for item in items {
        match by_id.get(&item.id) {
            None => return Err(AppError::NotFound("image")),
            Some(&status) if status != "uploaded" => {
                return Err(AppError::Invariant(format!(
                    "image {} is not in uploaded state",
                    item.id
                )));
            }
            Some(_) => {}
        }
    }

    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id) {
            return Err(AppError::Validation(format!(
                "duplicate image id {} in batch",
                item.id
            )));
        }
    }

    Ok(())
}

/// check_content_batch
///
/// Content-row variant of `check_image_batch`: existence, then duplicates.
pub fn check_content_batch(
    items: &[ReorderItem],
    existing: &HashSet<i64>,
    label: &'static str,
) -> Result<(), AppError> {
    for item in items {
        if !existing.contains(&item.id) {
            return Err(AppError::NotFound(label));
        }
    }

    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id) {
            return Err(AppError::Validation(format!(
                "duplicate id {} in batch",
                item.id
            )));
        }
    }

    Ok(())
}

/// PostgresRepository
///
/// The concrete `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FESTIVAL_COLS: &str = "id, title, content, category, location, start_date, end_date, \
     is_visible, display_order, created_at, updated_at";
const EXHIBITION_COLS: &str = "id, title, content, place, start_date, end_date, \
     is_visible, display_order, created_at, updated_at";
const WELFARE_COLS: &str = "id, name, category, content, phone, address, \
     is_visible, display_order, created_at, updated_at";
const IMAGE_COLS: &str = "id, festival_id, file_url, display_order, is_thumbnail, upload_status";
const STATION_COLS: &str = "id, opinet_id, name, brand, address, lat, lng, \
     gasoline_price, diesel_price, premium_price, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- FESTIVALS ---

    /// list_festivals
    ///
    /// Paginated listing with search/category/location filters, assembled with
    /// QueryBuilder so every user value is bound, never interpolated.
    /// Public calls (`include_hidden = false`) strictly filter `is_visible`.
    async fn list_festivals(&self, filter: &ListFilter) -> Result<Page<Festival>, AppError> {
        let push_filters = |builder: &mut QueryBuilder<sqlx::Postgres>| {
            if !filter.include_hidden {
                builder.push(" AND is_visible = true");
            }
            if let Some(category) = &filter.category {
                builder.push(" AND category = ");
                builder.push_bind(category.clone());
            }
            if let Some(location) = &filter.location {
                builder.push(" AND location = ");
                builder.push_bind(location.clone());
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search);
                builder.push(" AND (title ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR content ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        };

        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM festivals WHERE 1=1");
        push_filters(&mut count_builder);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM festivals WHERE 1=1", FESTIVAL_COLS));
        push_filters(&mut builder);
        builder.push(" ORDER BY display_order ASC, created_at DESC LIMIT ");
        builder.push_bind(filter.page_size);
        builder.push(" OFFSET ");
        builder.push_bind((filter.page - 1) * filter.page_size);

        let items = builder
            .build_query_as::<Festival>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            page: filter.page,
            page_size: filter.page_size,
            total,
        })
    }

    async fn get_festival(
        &self,
        id: i64,
        include_hidden: bool,
    ) -> Result<Option<Festival>, AppError> {
        let festival = sqlx::query_as::<_, Festival>(&format!(
            "SELECT {} FROM festivals WHERE id = $1 AND (is_visible = true OR $2)",
            FESTIVAL_COLS
        ))
        .bind(id)
        .bind(include_hidden)
        .fetch_optional(&self.pool)
        .await?;
        Ok(festival)
    }

    /// create_festival
    ///
    /// New festivals start hidden and are appended at the end of the manual
    /// ordering; an admin publishes them explicitly via the visibility toggle.
    async fn create_festival(&self, req: CreateFestivalRequest) -> Result<Festival, AppError> {
        let festival = sqlx::query_as::<_, Festival>(&format!(
            "INSERT INTO festivals \
                 (title, content, category, location, start_date, end_date, \
                  is_visible, display_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, false, \
                     (SELECT COALESCE(MAX(display_order) + 1, 0) FROM festivals), \
                     NOW(), NOW()) \
             RETURNING {}",
            FESTIVAL_COLS
        ))
        .bind(req.title)
        .bind(req.content)
        .bind(req.category)
        .bind(req.location)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(festival)
    }

    /// update_festival
    ///
    /// Partial update via COALESCE: only fields present in the request change.
    async fn update_festival(
        &self,
        id: i64,
        req: UpdateFestivalRequest,
    ) -> Result<Option<Festival>, AppError> {
        let festival = sqlx::query_as::<_, Festival>(&format!(
            "UPDATE festivals \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 category = COALESCE($4, category), \
                 location = COALESCE($5, location), \
                 start_date = COALESCE($6, start_date), \
                 end_date = COALESCE($7, end_date), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            FESTIVAL_COLS
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .bind(req.category)
        .bind(req.location)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(festival)
    }

    async fn delete_festival(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM festivals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- FESTIVAL IMAGES ---

    async fn list_festival_images(
        &self,
        festival_id: i64,
        include_pending: bool,
    ) -> Result<Vec<FestivalImage>, AppError> {
        let images = sqlx::query_as::<_, FestivalImage>(&format!(
            "SELECT {} FROM festival_images \
             WHERE festival_id = $1 AND (upload_status = 'uploaded' OR $2) \
             ORDER BY display_order ASC, id ASC",
            IMAGE_COLS
        ))
        .bind(festival_id)
        .bind(include_pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// create_festival_image
    ///
    /// Registers a pending row for a presigned upload. The parent festival is
    /// checked first so a stale admin tab gets a 404 instead of an FK error.
    async fn create_festival_image(
        &self,
        festival_id: i64,
        file_url: &str,
    ) -> Result<FestivalImage, AppError> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM festivals WHERE id = $1")
            .bind(festival_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("festival"));
        }

        let image = sqlx::query_as::<_, FestivalImage>(&format!(
            "INSERT INTO festival_images \
                 (festival_id, file_url, display_order, is_thumbnail, upload_status) \
             VALUES ($1, $2, \
                     (SELECT COALESCE(MAX(display_order) + 1, 0) FROM festival_images \
                      WHERE festival_id = $1), \
                     false, 'pending') \
             RETURNING {}",
            IMAGE_COLS
        ))
        .bind(festival_id)
        .bind(file_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    async fn complete_festival_image(
        &self,
        festival_id: i64,
        image_id: i64,
    ) -> Result<Option<FestivalImage>, AppError> {
        let image = sqlx::query_as::<_, FestivalImage>(&format!(
            "UPDATE festival_images SET upload_status = 'uploaded' \
             WHERE id = $1 AND festival_id = $2 \
             RETURNING {}",
            IMAGE_COLS
        ))
        .bind(image_id)
        .bind(festival_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn delete_festival_image(
        &self,
        festival_id: i64,
        image_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM festival_images WHERE id = $1 AND festival_id = $2")
            .bind(image_id)
            .bind(festival_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// reorder_festival_images
    ///
    /// Validates and applies the whole batch inside one transaction. The rows
    /// are locked (`FOR UPDATE`) before validation so a concurrent reorder of
    /// the same festival serializes instead of interleaving; either every
    /// update lands or the transaction rolls back.
    async fn reorder_festival_images(
        &self,
        festival_id: i64,
        items: &[ReorderItem],
    ) -> Result<u64, AppError> {
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();

        let mut tx = self.pool.begin().await?;

        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, upload_status FROM festival_images \
             WHERE festival_id = $1 AND id = ANY($2) \
             FOR UPDATE",
        )
        .bind(festival_id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        check_image_batch(items, &rows)?;

        let mut updated = 0u64;
        for item in items {
            let result = sqlx::query(
                "UPDATE festival_images SET display_order = $1 \
                 WHERE id = $2 AND festival_id = $3",
            )
            .bind(item.display_order)
            .bind(item.id)
            .bind(festival_id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// set_festival_thumbnail
    ///
    /// Promotion runs in a transaction: the previous thumbnail is unset and
    /// the target set before commit, so readers never observe two thumbnails
    /// for one festival. Re-promoting the current thumbnail is a no-op.
    /// Unsetting is a plain single-row write with no side effects.
    async fn set_festival_thumbnail(
        &self,
        festival_id: i64,
        image_id: i64,
        is_thumbnail: bool,
    ) -> Result<(), AppError> {
        if !is_thumbnail {
            let result = sqlx::query(
                "UPDATE festival_images SET is_thumbnail = false \
                 WHERE id = $1 AND festival_id = $2",
            )
            .bind(image_id)
            .bind(festival_id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("image"));
            }
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let target: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM festival_images WHERE id = $1 AND festival_id = $2 FOR UPDATE",
        )
        .bind(image_id)
        .bind(festival_id)
        .fetch_optional(&mut *tx)
        .await?;
        if target.is_none() {
            return Err(AppError::NotFound("image"));
        }

        sqlx::query(
            "UPDATE festival_images SET is_thumbnail = false \
             WHERE festival_id = $1 AND is_thumbnail = true AND id <> $2",
        )
        .bind(festival_id)
        .bind(image_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE festival_images SET is_thumbnail = true WHERE id = $1")
            .bind(image_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // --- EXHIBITIONS ---

    async fn list_exhibitions(&self, filter: &ListFilter) -> Result<Page<Exhibition>, AppError> {
        let push_filters = |builder: &mut QueryBuilder<sqlx::Postgres>| {
            if !filter.include_hidden {
                builder.push(" AND is_visible = true");
            }
            if let Some(location) = &filter.location {
                builder.push(" AND place = ");
                builder.push_bind(location.clone());
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search);
                builder.push(" AND (title ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR content ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        };

        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM exhibitions WHERE 1=1");
        push_filters(&mut count_builder);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM exhibitions WHERE 1=1",
            EXHIBITION_COLS
        ));
        push_filters(&mut builder);
        builder.push(" ORDER BY display_order ASC, created_at DESC LIMIT ");
        builder.push_bind(filter.page_size);
        builder.push(" OFFSET ");
        builder.push_bind((filter.page - 1) * filter.page_size);

        let items = builder
            .build_query_as::<Exhibition>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            page: filter.page,
            page_size: filter.page_size,
            total,
        })
    }

    async fn get_exhibition(
        &self,
        id: i64,
        include_hidden: bool,
    ) -> Result<Option<Exhibition>, AppError> {
        let exhibition = sqlx::query_as::<_, Exhibition>(&format!(
            "SELECT {} FROM exhibitions WHERE id = $1 AND (is_visible = true OR $2)",
            EXHIBITION_COLS
        ))
        .bind(id)
        .bind(include_hidden)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exhibition)
    }

    async fn create_exhibition(
        &self,
        req: CreateExhibitionRequest,
    ) -> Result<Exhibition, AppError> {
        let exhibition = sqlx::query_as::<_, Exhibition>(&format!(
            "INSERT INTO exhibitions \
                 (title, content, place, start_date, end_date, \
                  is_visible, display_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, false, \
                     (SELECT COALESCE(MAX(display_order) + 1, 0) FROM exhibitions), \
                     NOW(), NOW()) \
             RETURNING {}",
            EXHIBITION_COLS
        ))
        .bind(req.title)
        .bind(req.content)
        .bind(req.place)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exhibition)
    }

    async fn update_exhibition(
        &self,
        id: i64,
        req: UpdateExhibitionRequest,
    ) -> Result<Option<Exhibition>, AppError> {
        let exhibition = sqlx::query_as::<_, Exhibition>(&format!(
            "UPDATE exhibitions \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 place = COALESCE($4, place), \
                 start_date = COALESCE($5, start_date), \
                 end_date = COALESCE($6, end_date), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            EXHIBITION_COLS
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .bind(req.place)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exhibition)
    }

    async fn delete_exhibition(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM exhibitions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- WELFARE SERVICES ---

    async fn list_welfare_services(
        &self,
        filter: &ListFilter,
    ) -> Result<Page<WelfareService>, AppError> {
        let push_filters = |builder: &mut QueryBuilder<sqlx::Postgres>| {
            if !filter.include_hidden {
                builder.push(" AND is_visible = true");
            }
            if let Some(category) = &filter.category {
                builder.push(" AND category = ");
                builder.push_bind(category.clone());
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search);
                builder.push(" AND (name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR content ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        };

        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM welfare_services WHERE 1=1");
        push_filters(&mut count_builder);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM welfare_services WHERE 1=1",
            WELFARE_COLS
        ));
        push_filters(&mut builder);
        builder.push(" ORDER BY display_order ASC, created_at DESC LIMIT ");
        builder.push_bind(filter.page_size);
        builder.push(" OFFSET ");
        builder.push_bind((filter.page - 1) * filter.page_size);

        let items = builder
            .build_query_as::<WelfareService>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            page: filter.page,
            page_size: filter.page_size,
            total,
        })
    }

    async fn get_welfare_service(
        &self,
        id: i64,
        include_hidden: bool,
    ) -> Result<Option<WelfareService>, AppError> {
        let service = sqlx::query_as::<_, WelfareService>(&format!(
            "SELECT {} FROM welfare_services WHERE id = $1 AND (is_visible = true OR $2)",
            WELFARE_COLS
        ))
        .bind(id)
        .bind(include_hidden)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service)
    }

    async fn create_welfare_service(
        &self,
        req: CreateWelfareServiceRequest,
    ) -> Result<WelfareService, AppError> {
        let service = sqlx::query_as::<_, WelfareService>(&format!(
            "INSERT INTO welfare_services \
                 (name, category, content, phone, address, \
                  is_visible, display_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, false, \
                     (SELECT COALESCE(MAX(display_order) + 1, 0) FROM welfare_services), \
                     NOW(), NOW()) \
             RETURNING {}",
            WELFARE_COLS
        ))
        .bind(req.name)
        .bind(req.category)
        .bind(req.content)
        .bind(req.phone)
        .bind(req.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(service)
    }

    async fn update_welfare_service(
        &self,
        id: i64,
        req: UpdateWelfareServiceRequest,
    ) -> Result<Option<WelfareService>, AppError> {
        let service = sqlx::query_as::<_, WelfareService>(&format!(
            "UPDATE welfare_services \
             SET name = COALESCE($2, name), \
                 category = COALESCE($3, category), \
                 content = COALESCE($4, content), \
                 phone = COALESCE($5, phone), \
                 address = COALESCE($6, address), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            WELFARE_COLS
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.category)
        .bind(req.content)
        .bind(req.phone)
        .bind(req.address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service)
    }

    async fn delete_welfare_service(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM welfare_services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- SHARED CONTENT OPERATIONS ---

    /// set_content_visibility
    ///
    /// The table name comes from `ContentKind::table()` (a fixed set), never
    /// from request input; the id and flag are bound parameters.
    async fn set_content_visibility(
        &self,
        kind: ContentKind,
        id: i64,
        visible: bool,
    ) -> Result<bool, AppError> {
        let query = format!(
            "UPDATE {} SET is_visible = $1, updated_at = NOW() WHERE id = $2",
            kind.table()
        );
        let result = sqlx::query(&query)
            .bind(visible)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// reorder_content
    ///
    /// Same transactional batch shape as `reorder_festival_images`, minus the
    /// upload-status rule (content rows have no upload lifecycle).
    async fn reorder_content(
        &self,
        kind: ContentKind,
        items: &[ReorderItem],
    ) -> Result<u64, AppError> {
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();

        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT id FROM {} WHERE id = ANY($1) FOR UPDATE", kind.table());
        let found: Vec<i64> = sqlx::query_scalar(&select)
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;
        let existing: HashSet<i64> = found.into_iter().collect();

        check_content_batch(items, &existing, kind.label())?;

        let update = format!(
            "UPDATE {} SET display_order = $1, updated_at = NOW() WHERE id = $2",
            kind.table()
        );
        let mut updated = 0u64;
        for item in items {
            let result = sqlx::query(&update)
                .bind(item.display_order)
                .bind(item.id)
                .execute(&mut *tx)
                .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    // --- GAS STATIONS ---

    /// list_gas_stations
    ///
    /// Map-view listing: optional bounding box and brand/search filters,
    /// cheapest gasoline first. Capped at 500 rows to bound map payloads.
    async fn list_gas_stations(
        &self,
        filter: &StationFilter,
    ) -> Result<Vec<GasStation>, AppError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM gas_stations WHERE 1=1",
            STATION_COLS
        ));

        if let Some((min_lat, max_lat, min_lng, max_lng)) = filter.bounds() {
            builder.push(" AND lat BETWEEN ");
            builder.push_bind(min_lat);
            builder.push(" AND ");
            builder.push_bind(max_lat);
            builder.push(" AND lng BETWEEN ");
            builder.push_bind(min_lng);
            builder.push(" AND ");
            builder.push_bind(max_lng);
        }
        if let Some(brand) = &filter.brand {
            builder.push(" AND brand = ");
            builder.push_bind(brand.clone());
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR address ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY gasoline_price ASC NULLS LAST, name ASC LIMIT 500");

        let stations = builder
            .build_query_as::<GasStation>()
            .fetch_all(&self.pool)
            .await?;
        Ok(stations)
    }

    async fn get_gas_station(&self, id: i64) -> Result<Option<GasStation>, AppError> {
        let station = sqlx::query_as::<_, GasStation>(&format!(
            "SELECT {} FROM gas_stations WHERE id = $1",
            STATION_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(station)
    }

    /// upsert_gas_stations
    ///
    /// One transaction for the whole feed snapshot; a feed row either updates
    /// its existing station (matched on opinet_id) or inserts a new one.
    async fn upsert_gas_stations(&self, stations: &[FeedStation]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut updated = 0u64;
        for station in stations {
            let result = sqlx::query(
                "INSERT INTO gas_stations \
                     (opinet_id, name, brand, address, lat, lng, \
                      gasoline_price, diesel_price, premium_price, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
                 ON CONFLICT (opinet_id) DO UPDATE SET \
                     name = EXCLUDED.name, \
                     brand = EXCLUDED.brand, \
                     address = EXCLUDED.address, \
                     lat = EXCLUDED.lat, \
                     lng = EXCLUDED.lng, \
                     gasoline_price = EXCLUDED.gasoline_price, \
                     diesel_price = EXCLUDED.diesel_price, \
                     premium_price = EXCLUDED.premium_price, \
                     updated_at = NOW()",
            )
            .bind(&station.id)
            .bind(&station.name)
            .bind(&station.brand)
            .bind(&station.address)
            .bind(station.lat)
            .bind(station.lng)
            .bind(station.gasoline)
            .bind(station.diesel)
            .bind(station.premium)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    // --- ADMIN USERS ---

    async fn get_admin_user(&self, id: Uuid) -> Result<Option<AdminUser>, AppError> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, email, role, password_hash FROM admin_users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_admin_user_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, email, role, password_hash FROM admin_users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
