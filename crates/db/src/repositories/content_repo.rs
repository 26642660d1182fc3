use campusign_core::content::FreeFormContent;
use campusign_core::error::CoreError;
use campusign_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::content::ContentRow;
use crate::store::storage;

/// Column list for `content` queries, stream memberships aggregated in.
/// List queries select `NULL` for the blob so payloads only travel through
/// the dedicated blob fetch.
const CONTENT_COLUMNS: &str = "\
    c.id, c.type, c.data, c.mime_type, c.blob, c.posted, \
    ARRAY_AGG(e.stream_id ORDER BY e.stream_id) AS streams";

const CONTENT_COLUMNS_NO_BLOB: &str = "\
    c.id, c.type, c.data, c.mime_type, NULL::bytea AS blob, c.posted, \
    ARRAY_AGG(e.stream_id ORDER BY e.stream_id) AS streams";

fn columns(with_blob: bool) -> &'static str {
    if with_blob {
        CONTENT_COLUMNS
    } else {
        CONTENT_COLUMNS_NO_BLOB
    }
}

/// Provides persistence for free-form content posts.
pub struct ContentRepo;

impl ContentRepo {
    /// Post a piece of content, assigning its id and post timestamp. Both
    /// are assigned exactly once, here; a value supplied by the caller is
    /// rejected outright.
    pub async fn post(
        pool: &PgPool,
        content: &FreeFormContent,
    ) -> Result<FreeFormContent, CoreError> {
        if content.id.is_some() || content.posted.is_some() {
            return Err(CoreError::Validation(
                "content id and post time are assigned at insert and cannot be supplied".into(),
            ));
        }

        let data = content.body.to_storage_json();
        let (mime_type, blob) = match content.body.blob() {
            Some((mime, Some(blob))) => (Some(mime), Some(blob)),
            Some((_, None)) => {
                return Err(CoreError::Validation(
                    "binary content cannot be posted without its payload".into(),
                ));
            }
            None => (None, None),
        };

        let mut tx = pool.begin().await.map_err(storage)?;

        let (id, posted): (DbId, Timestamp) = sqlx::query_as(
            "INSERT INTO content (type, data, mime_type, blob) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, posted",
        )
        .bind(content.body.type_name())
        .bind(&data)
        .bind(mime_type)
        .bind(blob)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        for stream in &content.streams {
            sqlx::query(
                "INSERT INTO content_stream_entries (content_id, stream_id) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(stream)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        tracing::info!(content = id, kind = content.body.type_name(), "Content posted");

        Ok(FreeFormContent {
            id: Some(id),
            posted: Some(posted),
            streams: content.streams.clone(),
            body: content.body.clone(),
        })
    }

    /// Fetch the posts belonging to any of the given streams, newest first.
    pub async fn fetch_in_streams(
        pool: &PgPool,
        streams: &[DbId],
        limit: i64,
        with_blob: bool,
    ) -> Result<Vec<ContentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM content c \
             JOIN content_stream_entries e ON e.content_id = c.id \
             WHERE c.id IN ( \
                SELECT content_id FROM content_stream_entries WHERE stream_id = ANY($1) \
             ) \
             GROUP BY c.id \
             ORDER BY c.posted DESC \
             LIMIT $2",
            columns(with_blob)
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(streams)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Fetch a single post by ID.
    pub async fn fetch_by_id(
        pool: &PgPool,
        id: DbId,
        with_blob: bool,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM content c \
             JOIN content_stream_entries e ON e.content_id = c.id \
             WHERE c.id = $1 \
             GROUP BY c.id",
            columns(with_blob)
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a post. Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
