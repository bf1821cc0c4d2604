//! PostgreSQL implementation of the content store.
//!
//! Wish timestamps come from `clock_timestamp()` inside the insert, and
//! every cursor comparison is a row comparison on `(created_at, id)`, so
//! pagination stays stable when two wishes share a timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ContentStore, CursorRange, EventQuery, SortOrder, WishFilter, WishQuery};
use crate::config::WallConfig;
use crate::domain::{
    DeviceType, Event, EventId, EventPatch, GeoPoint, NewEvent, NewWish, Wish,
    WishId, WishPatch,
};
use crate::error::WallError;

const EVENT_COLUMNS: &str = "id, name, description, theme, start_date, end_date, is_active, \
     total_wishes, video_url, preview_url, settings, created_at, updated_at";

const WISH_COLUMNS: &str = "id, event_id, user_name, message, photo_url, approved, public, \
     device_type, location, color_theme, created_at";

/// A row of the `events` table.
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    theme: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    total_wishes: i64,
    video_url: Option<String>,
    preview_url: Option<String>,
    settings: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            theme: row.theme,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            total_wishes: u64::try_from(row.total_wishes).unwrap_or(0),
            video_url: row.video_url,
            preview_url: row.preview_url,
            settings: serde_json::from_value(row.settings).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of the `wishes` table.
#[derive(Debug, FromRow)]
struct WishRow {
    id: Uuid,
    event_id: Uuid,
    user_name: String,
    message: String,
    photo_url: Option<String>,
    approved: bool,
    public: bool,
    device_type: String,
    location: Option<serde_json::Value>,
    color_theme: String,
    created_at: DateTime<Utc>,
}

impl From<WishRow> for Wish {
    fn from(row: WishRow) -> Self {
        Self {
            id: WishId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            user_name: row.user_name,
            message: row.message,
            photo_url: row.photo_url,
            created_at: row.created_at,
            approved: row.approved,
            public: row.public,
            device_type: DeviceType::from_tag(&row.device_type),
            location: row
                .location
                .and_then(|v| serde_json::from_value::<GeoPoint>(v).ok()),
            color_theme: row.color_theme,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, WallError> {
    serde_json::to_value(value).map_err(|e| WallError::Internal(e.to_string()))
}

/// PostgreSQL-backed content store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresContentStore {
    pool: PgPool,
}

impl PostgresContentStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the gateway configuration and runs pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(config: &WallConfig) -> Result<Self, WallError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| WallError::Store(e.to_string()))?;
        tracing::info!("content store connected and migrated");
        Ok(Self::new(pool))
    }

    async fn write_event(&self, event: &Event) -> Result<(), WallError> {
        sqlx::query(
            "UPDATE events SET name = $2, description = $3, theme = $4, start_date = $5, \
             end_date = $6, is_active = $7, video_url = $8, preview_url = $9, settings = $10, \
             updated_at = $11 WHERE id = $1",
        )
        .bind(event.id.as_uuid())
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.theme)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.is_active)
        .bind(&event.video_url)
        .bind(&event.preview_url)
        .bind(to_json(&event.settings)?)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn push_wish_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: WishFilter) {
    match filter {
        WishFilter::All => {}
        WishFilter::Approved => {
            builder.push(" AND approved");
        }
        WishFilter::Eligible => {
            builder.push(" AND approved AND public");
        }
    }
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, WallError> {
        let sql = format!(
            "INSERT INTO events (id, name, description, theme, start_date, end_date, is_active, \
             video_url, preview_url, settings) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {EVENT_COLUMNS}"
        );
        let row: EventRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.description)
            .bind(&new.theme)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(new.is_active)
            .bind(&new.video_url)
            .bind(&new.preview_url)
            .bind(to_json(&new.settings)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, WallError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, WallError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"
        ));
        if query.active_only {
            builder.push(" AND is_active");
        }
        if let Some(after) = query.after {
            builder
                .push(" AND (created_at, id) < (")
                .push_bind(after.created_at)
                .push(", ")
                .push_bind(*after.id.as_uuid())
                .push(")");
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(query.limit));
        let rows: Vec<EventRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn count_events(&self, active_only: bool) -> Result<u64, WallError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE ($1 = FALSE OR is_active)")
                .bind(active_only)
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn update_event(
        &self,
        event_id: EventId,
        patch: EventPatch,
    ) -> Result<Event, WallError> {
        let mut event = self
            .get_event(event_id)
            .await?
            .ok_or(WallError::EventNotFound(event_id))?;
        event.apply(patch, Utc::now());
        self.write_event(&event).await?;
        Ok(event)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<(), WallError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(WallError::EventNotFound(event_id));
        }
        Ok(())
    }

    async fn create_wish(&self, event_id: EventId, new: NewWish) -> Result<Wish, WallError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE events SET total_wishes = total_wishes + 1 WHERE id = $1")
            .bind(event_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(WallError::EventNotFound(event_id));
        }

        let location = new.location.as_ref().map(to_json).transpose()?;
        let sql = format!(
            "INSERT INTO wishes (id, event_id, user_name, message, photo_url, approved, public, \
             device_type, location, color_theme) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
             COALESCE($10, 'gold')) RETURNING {WISH_COLUMNS}"
        );
        let row: WishRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(event_id.as_uuid())
            .bind(&new.user_name)
            .bind(&new.message)
            .bind(&new.photo_url)
            .bind(new.approved)
            .bind(new.public)
            .bind(new.device_type.as_str())
            .bind(location)
            .bind(&new.color_theme)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
    ) -> Result<Option<Wish>, WallError> {
        let sql = format!("SELECT {WISH_COLUMNS} FROM wishes WHERE event_id = $1 AND id = $2");
        let row: Option<WishRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .bind(wish_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Wish::from))
    }

    async fn update_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
        patch: WishPatch,
    ) -> Result<Wish, WallError> {
        let mut wish = self
            .get_wish(event_id, wish_id)
            .await?
            .ok_or(WallError::WishNotFound(wish_id))?;
        wish.apply(patch);
        let location = wish.location.as_ref().map(to_json).transpose()?;
        sqlx::query(
            "UPDATE wishes SET user_name = $3, message = $4, photo_url = $5, approved = $6, \
             public = $7, device_type = $8, location = $9, color_theme = $10 \
             WHERE event_id = $1 AND id = $2",
        )
        .bind(event_id.as_uuid())
        .bind(wish_id.as_uuid())
        .bind(&wish.user_name)
        .bind(&wish.message)
        .bind(&wish.photo_url)
        .bind(wish.approved)
        .bind(wish.public)
        .bind(wish.device_type.as_str())
        .bind(location)
        .bind(&wish.color_theme)
        .execute(&self.pool)
        .await?;
        Ok(wish)
    }

    async fn delete_wish(&self, event_id: EventId, wish_id: WishId) -> Result<(), WallError> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM wishes WHERE event_id = $1 AND id = $2")
            .bind(event_id.as_uuid())
            .bind(wish_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(WallError::WishNotFound(wish_id));
        }
        sqlx::query(
            "UPDATE events SET total_wishes = GREATEST(total_wishes - 1, 0) WHERE id = $1",
        )
        .bind(event_id.as_uuid())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn query_wishes(
        &self,
        event_id: EventId,
        query: WishQuery,
    ) -> Result<Vec<Wish>, WallError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {WISH_COLUMNS} FROM wishes WHERE event_id = "
        ));
        builder.push_bind(*event_id.as_uuid());
        push_wish_filter(&mut builder, query.filter);

        let (op, cursor) = match query.range {
            CursorRange::Unbounded => ("", None),
            CursorRange::Before(cursor) => ("<", Some(cursor)),
            CursorRange::After(cursor) => (">", Some(cursor)),
        };
        if let Some(cursor) = cursor {
            builder
                .push(format!(" AND (created_at, id) {op} ("))
                .push_bind(cursor.created_at)
                .push(", ")
                .push_bind(*cursor.id.as_uuid())
                .push(")");
        }

        builder.push(match query.order {
            SortOrder::Desc => " ORDER BY created_at DESC, id DESC",
            SortOrder::Asc => " ORDER BY created_at ASC, id ASC",
        });
        builder.push(" LIMIT ").push_bind(i64::from(query.limit));

        let rows: Vec<WishRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Wish::from).collect())
    }

    async fn count_wishes(&self, event_id: EventId, filter: WishFilter) -> Result<u64, WallError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM wishes WHERE event_id = ");
        builder.push_bind(*event_id.as_uuid());
        push_wish_filter(&mut builder, filter);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
