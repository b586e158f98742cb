use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{GradeRecord, ScoreSheet};
use crate::db::types::AssessmentType;

const COLUMNS: &str = "\
    id, academic_year_id, class_id, subject_id, teacher_id, assessment_type, \
    assessment_name, date, scores, created_at, updated_at";

#[derive(Debug, Default)]
pub(crate) struct ListGrades {
    pub(crate) academic_year_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) subject_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) assessment_type: Option<AssessmentType>,
}

pub(crate) struct CreateGrade<'a> {
    pub(crate) id: &'a str,
    pub(crate) academic_year_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) assessment_name: &'a str,
    pub(crate) date: time::Date,
    pub(crate) scores: ScoreSheet,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateGrade {
    pub(crate) assessment_type: Option<AssessmentType>,
    pub(crate) assessment_name: Option<String>,
    pub(crate) date: Option<time::Date>,
    pub(crate) scores: Option<ScoreSheet>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list(
    pool: &PgPool,
    filters: &ListGrades,
) -> Result<Vec<GradeRecord>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM grade_records WHERE 1=1"));

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
    if let Some(assessment_type) = filters.assessment_type {
        builder.push(" AND assessment_type = ").push_bind(assessment_type);
    }

    builder.push(" ORDER BY date, created_at, id");
    builder.build_query_as::<GradeRecord>().fetch_all(pool).await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<GradeRecord>, sqlx::Error> {
    sqlx::query_as::<_, GradeRecord>(&format!("SELECT {COLUMNS} FROM grade_records WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateGrade<'_>,
) -> Result<GradeRecord, sqlx::Error> {
    sqlx::query_as::<_, GradeRecord>(&format!(
        "INSERT INTO grade_records (
            id, academic_year_id, class_id, subject_id, teacher_id, assessment_type,
            assessment_name, date, scores, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.academic_year_id)
    .bind(params.class_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.assessment_type)
    .bind(params.assessment_name)
    .bind(params.date)
    .bind(Json(params.scores))
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateGrade,
) -> Result<Option<GradeRecord>, sqlx::Error> {
    sqlx::query_as::<_, GradeRecord>(&format!(
        "UPDATE grade_records SET
            assessment_type = COALESCE($1, assessment_type),
            assessment_name = COALESCE($2, assessment_name),
            date = COALESCE($3, date),
            scores = COALESCE($4, scores),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(params.assessment_type)
    .bind(params.assessment_name)
    .bind(params.date)
    .bind(params.scores.map(Json))
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
