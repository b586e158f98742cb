use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{AttendanceEntry, AttendanceRecord};

const COLUMNS: &str = "\
    id, academic_year_id, class_id, subject_id, teacher_id, date, records, \
    created_at, updated_at";

#[derive(Debug, Default)]
pub(crate) struct ListAttendance {
    pub(crate) academic_year_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) subject_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) date: Option<time::Date>,
}

pub(crate) struct CreateAttendance<'a> {
    pub(crate) id: &'a str,
    pub(crate) academic_year_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) date: time::Date,
    pub(crate) records: Vec<AttendanceEntry>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateAttendance {
    pub(crate) date: Option<time::Date>,
    pub(crate) records: Option<Vec<AttendanceEntry>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list(
    pool: &PgPool,
    filters: &ListAttendance,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM attendance_records WHERE 1=1"
    ));

    if let Some(academic_year_id) = &filters.academic_year_id {
        builder.push(" AND academic_year_id = ").push_bind(academic_year_id);
    }
    if let Some(class_id) = &filters.class_id {
        builder.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(subject_id) = &filters.subject_id {
        builder.push(" AND subject_id = ").push_bind(subject_id);
    }
    if let Some(teacher_id) = &filters.teacher_id {
        builder.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(date) = filters.date {
        builder.push(" AND date = ").push_bind(date);
    }

    builder.push(" ORDER BY date, created_at, id");
    builder.build_query_as::<AttendanceRecord>().fetch_all(pool).await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {COLUMNS} FROM attendance_records WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAttendance<'_>,
) -> Result<AttendanceRecord, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "INSERT INTO attendance_records (
            id, academic_year_id, class_id, subject_id, teacher_id, date, records,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.academic_year_id)
    .bind(params.class_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.date)
    .bind(Json(params.records))
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAttendance,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "UPDATE attendance_records SET
            date = COALESCE($1, date),
            records = COALESCE($2, records),
            updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(params.date)
    .bind(params.records.map(Json))
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
