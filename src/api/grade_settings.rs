use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentAdmin, CurrentStaff};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::grade::{GradeSettingsQuery, GradeSettingsResponse, GradeSettingsUpdate};
use crate::services::grade_policy;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(put_settings))
}

/// Stored weights for the year, or the fallback weights flagged `is_default`.
async fn get_settings(
    Query(query): Query<GradeSettingsQuery>,
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<GradeSettingsResponse>, ApiError> {
    let year = guards::resolve_year(&state, Some(&query.academic_year_id)).await?;

    let settings = repositories::grade_settings::find_by_year(state.db(), &year.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grade settings"))?;

    Ok(Json(match settings {
        Some(settings) => GradeSettingsResponse::from_db(settings),
        None => GradeSettingsResponse::fallback(year.id),
    }))
}

async fn put_settings(
    Query(query): Query<GradeSettingsQuery>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GradeSettingsUpdate>,
) -> Result<Json<GradeSettingsResponse>, ApiError> {
    grade_policy::validate(&payload.percentages())
        .map_err(|violation| ApiError::UnprocessableEntity(violation.to_string()))?;

    let year = guards::resolve_year(&state, Some(&query.academic_year_id)).await?;

    let settings = repositories::grade_settings::upsert(
        state.db(),
        repositories::grade_settings::UpsertGradeSettings {
            id: &Uuid::new_v4().to_string(),
            academic_year_id: &year.id,
            tugas_percentage: payload.tugas_percentage,
            uts_percentage: payload.uts_percentage,
            uas_percentage: payload.uas_percentage,
            lainnya_percentage: payload.lainnya_percentage,
            absence_percentage: payload.absence_percentage,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save grade settings"))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "grade_settings_update",
        academic_year_id = %settings.academic_year_id,
        tugas = settings.tugas_percentage,
        uts = settings.uts_percentage,
        uas = settings.uas_percentage,
        "Admin action"
    );

    Ok(Json(GradeSettingsResponse::from_db(settings)))
}
