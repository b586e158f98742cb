use sqlx::PgPool;

use crate::db::models::SchoolClass;

const COLUMNS: &str = "id, name, level, wali_kelas_id, created_at, updated_at";

pub(crate) struct CreateClass<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) level: &'a str,
    pub(crate) wali_kelas_id: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateClass {
    pub(crate) name: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) wali_kelas_id: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "SELECT {COLUMNS} FROM classes ORDER BY level, name, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!("SELECT {COLUMNS} FROM classes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClass<'_>,
) -> Result<SchoolClass, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "INSERT INTO classes (id, name, level, wali_kelas_id, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.level)
    .bind(params.wali_kelas_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateClass,
) -> Result<Option<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "UPDATE classes SET
            name = COALESCE($1, name),
            level = COALESCE($2, level),
            wali_kelas_id = COALESCE($3, wali_kelas_id),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.level)
    .bind(params.wali_kelas_id)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
