use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::UserRow;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, email, name, role, class_id, nis, \
    ARRAY(SELECT subject_id FROM teacher_subjects ts \
          WHERE ts.teacher_id = users.id ORDER BY subject_id) AS subject_ids, \
    ARRAY(SELECT c.id FROM classes c \
          WHERE c.wali_kelas_id = users.id ORDER BY c.id) AS homeroom_class_ids, \
    created_at, updated_at";

#[derive(Debug, Default)]
pub(crate) struct ListUsers {
    pub(crate) role: Option<UserRole>,
    pub(crate) class_id: Option<String>,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_name_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, filters: &ListUsers) -> Result<Vec<UserRow>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE 1=1"));

    if let Some(role) = filters.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(class_id) = &filters.class_id {
        builder.push(" AND class_id = ").push_bind(class_id);
    }

    builder.push(" ORDER BY name, id");
    builder.build_query_as::<UserRow>().fetch_all(pool).await
}

/// Students of a class, ordered for printing.
pub(crate) async fn list_students_by_class(
    pool: &PgPool,
    class_id: &str,
) -> Result<Vec<UserRow>, sqlx::Error> {
    list(pool, &ListUsers { role: Some(UserRole::Siswa), class_id: Some(class_id.to_string()) })
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) name: &'a str,
    pub(crate) role: UserRole,
    pub(crate) class_id: Option<&'a str>,
    pub(crate) nis: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, email, name, role, class_id, nis, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
    )
    .bind(params.id)
    .bind(params.email)
    .bind(params.name)
    .bind(params.role.as_str())
    .bind(params.class_id)
    .bind(params.nis)
    .bind(params.created_at)
    .bind(params.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) struct UpdateUser {
    pub(crate) email: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) nis: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateUser,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET
            email = COALESCE($1, email),
            name = COALESCE($2, name),
            class_id = COALESCE($3, class_id),
            nis = COALESCE($4, nis),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.email)
    .bind(params.name)
    .bind(params.class_id)
    .bind(params.nis)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

/// Replaces a teacher's subject assignments.
pub(crate) async fn set_subjects(
    pool: &PgPool,
    teacher_id: &str,
    subject_ids: &[String],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM teacher_subjects WHERE teacher_id = $1")
        .bind(teacher_id)
        .execute(&mut *tx)
        .await?;

    if !subject_ids.is_empty() {
        sqlx::query(
            "INSERT INTO teacher_subjects (teacher_id, subject_id)
             SELECT $1, subject_id FROM UNNEST($2::text[]) AS subject_id
             ON CONFLICT DO NOTHING",
        )
        .bind(teacher_id)
        .bind(subject_ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}
