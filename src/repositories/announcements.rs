use sqlx::PgPool;

use crate::db::models::Announcement;
use crate::db::types::Audience;

const COLUMNS: &str = "id, title, content, audience, author_id, created_at";

pub(crate) struct CreateAnnouncement<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) audience: Audience,
    pub(crate) author_id: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Newest first, restricted to the given audiences.
pub(crate) async fn list_for(
    pool: &PgPool,
    audiences: &[Audience],
    limit: i64,
) -> Result<Vec<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements
         WHERE audience = ANY($1)
         ORDER BY created_at DESC, id
         LIMIT $2"
    ))
    .bind(audiences)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAnnouncement<'_>,
) -> Result<Announcement, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(&format!(
        "INSERT INTO announcements (id, title, content, audience, author_id, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.audience)
    .bind(params.author_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM announcements WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
