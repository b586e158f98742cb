use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentStaff};
use crate::api::validation;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::grade::{
    GradeCreate, GradeListQuery, GradeRecapQuery, GradeResponse, GradeUpdate,
};
use crate::services::report_card::{self, GradeRecap};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grades).post(create_grade))
        .route("/recap", get(grade_recap))
        .route("/:grade_id", patch(update_grade))
}

async fn list_grades(
    Query(query): Query<GradeListQuery>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeResponse>>, ApiError> {
    let teacher_id = match user.role() {
        UserRole::Admin => None,
        _ => Some(user.id.clone()),
    };
    let filters = repositories::grades::ListGrades {
        academic_year_id: query.academic_year_id,
        class_id: query.class_id,
        subject_id: query.subject_id,
        teacher_id,
        assessment_type: query.assessment_type,
    };

    let records = repositories::grades::list(state.db(), &filters)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(records.into_iter().map(GradeResponse::from_db).collect()))
}

async fn create_grade(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<GradeCreate>,
) -> Result<(StatusCode, Json<GradeResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validation::validate_scores(&payload.scores)?;

    let year = guards::resolve_year(&state, Some(&payload.academic_year_id)).await?;
    guards::require_teaching_assignment(
        &state,
        &user,
        &year.id,
        &payload.class_id,
        &payload.subject_id,
    )
    .await?;
    validation::ensure_class_members(
        &state,
        &payload.class_id,
        payload.scores.keys().map(String::as_str),
    )
    .await?;

    let record = repositories::grades::create(
        state.db(),
        repositories::grades::CreateGrade {
            id: &Uuid::new_v4().to_string(),
            academic_year_id: &year.id,
            class_id: &payload.class_id,
            subject_id: &payload.subject_id,
            teacher_id: &user.id,
            assessment_type: payload.assessment_type,
            assessment_name: payload.assessment_name.trim(),
            date: payload.date,
            scores: payload.scores,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record grades"))?;

    tracing::info!(
        teacher_id = %user.id,
        grade_id = %record.id,
        class_id = %record.class_id,
        subject_id = %record.subject_id,
        assessment_type = record.assessment_type.label(),
        "Grades recorded"
    );

    Ok((StatusCode::CREATED, Json(GradeResponse::from_db(record))))
}

async fn update_grade(
    Path(grade_id): Path<String>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<GradeUpdate>,
) -> Result<Json<GradeResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = repositories::grades::find_by_id(state.db(), &grade_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grade record"))?
        .ok_or_else(|| ApiError::NotFound("Grade record not found".to_string()))?;

    guards::require_teaching_assignment(
        &state,
        &user,
        &current.academic_year_id,
        &current.class_id,
        &current.subject_id,
    )
    .await?;
    if let Some(scores) = payload.scores.as_ref() {
        validation::validate_scores(scores)?;
        let student_ids = scores.keys().map(String::as_str);
        validation::ensure_class_members(&state, &current.class_id, student_ids).await?;
    }

    let record = repositories::grades::update(
        state.db(),
        &grade_id,
        repositories::grades::UpdateGrade {
            assessment_type: payload.assessment_type,
            assessment_name: payload.assessment_name.map(|name| name.trim().to_string()),
            date: payload.date,
            scores: payload.scores,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update grade record"))?
    .ok_or_else(|| ApiError::NotFound("Grade record not found".to_string()))?;

    tracing::info!(teacher_id = %user.id, grade_id = %record.id, "Grades updated");

    Ok(Json(GradeResponse::from_db(record)))
}

/// Final scores of every student in a class for one subject.
async fn grade_recap(
    Query(query): Query<GradeRecapQuery>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<GradeRecap>, ApiError> {
    let year = guards::resolve_year(&state, query.academic_year_id.as_deref()).await?;
    if !guards::can_view_class(&state, &user, &year.id, &query.class_id).await? {
        return Err(ApiError::Forbidden("Not allowed to view this class"));
    }

    let recap = report_card::build_grade_recap(
        state.db(),
        state.rounding(),
        &year,
        &query.class_id,
        &query.subject_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to build grade recap"))?
    .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    metrics::record_report("grade_recap", "api", recap.rows.len());

    Ok(Json(recap))
}
