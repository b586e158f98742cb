use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Schedule;
use crate::db::types::SchoolDay;

const COLUMNS: &str = "\
    id, academic_year_id, class_id, subject_id, teacher_id, day, \
    start_time, end_time, room, created_at, updated_at";

#[derive(Debug, Default)]
pub(crate) struct ListSchedules {
    pub(crate) academic_year_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) day: Option<SchoolDay>,
}

pub(crate) struct CreateSchedule<'a> {
    pub(crate) id: &'a str,
    pub(crate) academic_year_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) day: SchoolDay,
    pub(crate) start_time: time::Time,
    pub(crate) end_time: time::Time,
    pub(crate) room: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateSchedule {
    pub(crate) subject_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) day: Option<SchoolDay>,
    pub(crate) start_time: Option<time::Time>,
    pub(crate) end_time: Option<time::Time>,
    pub(crate) room: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list(
    pool: &PgPool,
    filters: &ListSchedules,
) -> Result<Vec<Schedule>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM schedules WHERE 1=1"));

    if let Some(academic_year_id) = &filters.academic_year_id {
        builder.push(" AND academic_year_id = ").push_bind(academic_year_id);
    }
    if let Some(class_id) = &filters.class_id {
        builder.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(teacher_id) = &filters.teacher_id {
        builder.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(day) = filters.day {
        builder.push(" AND day = ").push_bind(day);
    }

    builder.push(" ORDER BY day, start_time, class_id");
    builder.build_query_as::<Schedule>().fetch_all(pool).await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(&format!("SELECT {COLUMNS} FROM schedules WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSchedule<'_>,
) -> Result<Schedule, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(&format!(
        "INSERT INTO schedules (
            id, academic_year_id, class_id, subject_id, teacher_id, day,
            start_time, end_time, room, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.academic_year_id)
    .bind(params.class_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.day)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.room)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSchedule,
) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(&format!(
        "UPDATE schedules SET
            subject_id = COALESCE($1, subject_id),
            teacher_id = COALESCE($2, teacher_id),
            day = COALESCE($3, day),
            start_time = COALESCE($4, start_time),
            end_time = COALESCE($5, end_time),
            room = COALESCE($6, room),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}"
    ))
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.day)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.room)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Whether `teacher_id` teaches `subject_id` to `class_id` in the year.
pub(crate) async fn teaching_binding_exists(
    pool: &PgPool,
    academic_year_id: &str,
    class_id: &str,
    subject_id: &str,
    teacher_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM schedules
            WHERE academic_year_id = $1 AND class_id = $2
              AND subject_id = $3 AND teacher_id = $4
         )",
    )
    .bind(academic_year_id)
    .bind(class_id)
    .bind(subject_id)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
}

/// Whether `teacher_id` has any lesson with `class_id` in the year.
pub(crate) async fn teaches_class(
    pool: &PgPool,
    academic_year_id: &str,
    class_id: &str,
    teacher_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM schedules
            WHERE academic_year_id = $1 AND class_id = $2 AND teacher_id = $3
         )",
    )
    .bind(academic_year_id)
    .bind(class_id)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
}
