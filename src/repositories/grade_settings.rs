use sqlx::PgPool;

use crate::db::models::GradeSettings;

const COLUMNS: &str = "\
    id, academic_year_id, tugas_percentage, uts_percentage, uas_percentage, \
    lainnya_percentage, absence_percentage, updated_at";

pub(crate) struct UpsertGradeSettings<'a> {
    pub(crate) id: &'a str,
    pub(crate) academic_year_id: &'a str,
    pub(crate) tugas_percentage: f64,
    pub(crate) uts_percentage: f64,
    pub(crate) uas_percentage: f64,
    pub(crate) lainnya_percentage: Option<f64>,
    pub(crate) absence_percentage: Option<f64>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn find_by_year(
    pool: &PgPool,
    academic_year_id: &str,
) -> Result<Option<GradeSettings>, sqlx::Error> {
    sqlx::query_as::<_, GradeSettings>(&format!(
        "SELECT {COLUMNS} FROM grade_settings WHERE academic_year_id = $1"
    ))
    .bind(academic_year_id)
    .fetch_optional(pool)
    .await
}

/// One settings row per academic year; `id` is only used on first insert.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertGradeSettings<'_>,
) -> Result<GradeSettings, sqlx::Error> {
    sqlx::query_as::<_, GradeSettings>(&format!(
        "INSERT INTO grade_settings (
            id, academic_year_id, tugas_percentage, uts_percentage, uas_percentage,
            lainnya_percentage, absence_percentage, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         ON CONFLICT (academic_year_id)
         DO UPDATE SET tugas_percentage = EXCLUDED.tugas_percentage,
                       uts_percentage = EXCLUDED.uts_percentage,
                       uas_percentage = EXCLUDED.uas_percentage,
                       lainnya_percentage = EXCLUDED.lainnya_percentage,
                       absence_percentage = EXCLUDED.absence_percentage,
                       updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.academic_year_id)
    .bind(params.tugas_percentage)
    .bind(params.uts_percentage)
    .bind(params.uas_percentage)
    .bind(params.lainnya_percentage)
    .bind(params.absence_percentage)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}
