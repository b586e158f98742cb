use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentStaff, CurrentStudent, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::schemas::attendance::{RecapQuery, YearQuery};
use crate::services::report_card::{self, AttendanceRecap, ReportCard};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/report-card/:student_id", get(student_report_card))
        .route("/me/report-card", get(my_report_card))
        .route("/attendance-recap", get(attendance_recap))
}

async fn student_report_card(
    Path(student_id): Path<String>,
    Query(query): Query<YearQuery>,
    CurrentUser(viewer): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ReportCard>, ApiError> {
    let card =
        load_report_card(&state, &viewer, &student_id, query.academic_year_id.as_deref()).await?;
    metrics::record_report("report_card", "api", card.rows.len());
    Ok(Json(card))
}

async fn my_report_card(
    Query(query): Query<YearQuery>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ReportCard>, ApiError> {
    let year = guards::resolve_year(&state, query.academic_year_id.as_deref()).await?;
    let card = report_card::build_report_card(state.db(), state.rounding(), &student, &year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to build report card"))?;

    metrics::record_report("report_card", "api", card.rows.len());
    Ok(Json(card))
}

async fn attendance_recap(
    Query(query): Query<RecapQuery>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<AttendanceRecap>, ApiError> {
    let recap = load_attendance_recap(&state, &user, &query).await?;
    metrics::record_report("attendance_recap", "api", recap.rows.len());
    Ok(Json(recap))
}

/// Report card of `student_id` as seen by `viewer`. Unknown students are
/// 404, students outside the viewer's reach are 403.
pub(crate) async fn load_report_card(
    state: &AppState,
    viewer: &User,
    student_id: &str,
    academic_year_id: Option<&str>,
) -> Result<ReportCard, ApiError> {
    let student = guards::load_student(state, student_id).await?;
    let year = guards::resolve_year(state, academic_year_id).await?;
    if !guards::can_view_student(state, viewer, &student, &year.id).await? {
        return Err(ApiError::Forbidden("Not allowed to view this student"));
    }

    report_card::build_report_card(state.db(), state.rounding(), &student, &year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to build report card"))
}

pub(crate) async fn load_attendance_recap(
    state: &AppState,
    viewer: &User,
    query: &RecapQuery,
) -> Result<AttendanceRecap, ApiError> {
    let year = guards::resolve_year(state, query.academic_year_id.as_deref()).await?;
    if !guards::can_view_class(state, viewer, &year.id, &query.class_id).await? {
        return Err(ApiError::Forbidden("Not allowed to view this class"));
    }

    report_card::build_attendance_recap(
        state.db(),
        &year,
        &query.class_id,
        query.subject_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to build attendance recap"))?
    .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))
}

#[cfg(test)]
mod tests;
