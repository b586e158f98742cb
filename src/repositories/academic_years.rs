use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use crate::db::models::AcademicYear;

const COLUMNS: &str = "id, name, start_date, end_date, is_active, created_at, updated_at";

pub(crate) struct CreateAcademicYear<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) start_date: time::Date,
    pub(crate) end_date: time::Date,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateAcademicYear {
    pub(crate) name: Option<String>,
    pub(crate) start_date: Option<time::Date>,
    pub(crate) end_date: Option<time::Date>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years ORDER BY start_date DESC, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_active(pool: &PgPool) -> Result<Option<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years WHERE is_active LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

/// Inserts an inactive year; see [`create_active`] for the active variant.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAcademicYear<'_>,
) -> Result<AcademicYear, sqlx::Error> {
    insert(pool, &params).await
}

/// Inserts the year and makes it the only active one in a single
/// transaction. Nothing is stored when the swap fails.
pub(crate) async fn create_active(
    pool: &PgPool,
    params: CreateAcademicYear<'_>,
) -> Result<AcademicYear, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_active_flag(&mut tx).await?;

    insert(&mut *tx, &params).await?;
    let year = swap_active(&mut tx, params.id, params.created_at).await?;

    tx.commit().await?;
    Ok(year)
}

async fn insert<'e, E>(
    executor: E,
    params: &CreateAcademicYear<'_>,
) -> Result<AcademicYear, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, AcademicYear>(&format!(
        "INSERT INTO academic_years
            (id, name, start_date, end_date, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,$4,FALSE,$5,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAcademicYear,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "UPDATE academic_years SET
            name = COALESCE($1, name),
            start_date = COALESCE($2, start_date),
            end_date = COALESCE($3, end_date),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Makes `id` the only active year. Returns `None` when the year does not
/// exist, leaving the current active year untouched.
pub(crate) async fn activate(
    pool: &PgPool,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_active_flag(&mut tx).await?;

    let exists = sqlx::query_scalar::<_, String>("SELECT id FROM academic_years WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let year = swap_active(&mut tx, id, updated_at).await?;
    tx.commit().await?;
    Ok(Some(year))
}

/// Serializes writers of `is_active`. Must be the first statement of the
/// transaction.
async fn lock_active_flag(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query("LOCK TABLE academic_years IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn swap_active(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<AcademicYear, sqlx::Error> {
    sqlx::query(
        "UPDATE academic_years SET is_active = FALSE, updated_at = $1
         WHERE is_active AND id <> $2",
    )
    .bind(updated_at)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    sqlx::query_as::<_, AcademicYear>(&format!(
        "UPDATE academic_years SET is_active = TRUE, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(updated_at)
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}
