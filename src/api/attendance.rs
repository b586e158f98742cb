use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentStaff, CurrentStudent};
use crate::api::reports;
use crate::api::validation;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::attendance::{
    AttendanceCreate, AttendanceListQuery, AttendanceResponse, AttendanceUpdate,
    MyAttendanceResponse, RecapQuery, SubjectRateResponse, YearQuery,
};
use crate::services::attendance_tally;
use crate::services::report_card::AttendanceRecap;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance).post(create_attendance))
        .route("/summary", get(class_summary))
        .route("/me", get(my_attendance))
        .route("/:attendance_id", patch(update_attendance))
}

/// Teachers only see sessions they recorded.
async fn list_attendance(
    Query(query): Query<AttendanceListQuery>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let teacher_id = match user.role() {
        UserRole::Admin => None,
        _ => Some(user.id.clone()),
    };
    let filters = repositories::attendance::ListAttendance {
        academic_year_id: query.academic_year_id,
        class_id: query.class_id,
        subject_id: query.subject_id,
        teacher_id,
        date: query.date,
    };

    let records = repositories::attendance::list(state.db(), &filters)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance"))?;

    Ok(Json(records.into_iter().map(AttendanceResponse::from_db).collect()))
}

async fn create_attendance(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<AttendanceCreate>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validation::validate_attendance_entries(&payload.records)?;

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
        payload.records.iter().map(|entry| entry.student_id.as_str()),
    )
    .await?;

    let record = repositories::attendance::create(
        state.db(),
        repositories::attendance::CreateAttendance {
            id: &Uuid::new_v4().to_string(),
            academic_year_id: &year.id,
            class_id: &payload.class_id,
            subject_id: &payload.subject_id,
            teacher_id: &user.id,
            date: payload.date,
            records: payload.records,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record attendance"))?;

    tracing::info!(
        teacher_id = %user.id,
        attendance_id = %record.id,
        class_id = %record.class_id,
        subject_id = %record.subject_id,
        entries = record.records.0.len(),
        "Attendance recorded"
    );

    Ok((StatusCode::CREATED, Json(AttendanceResponse::from_db(record))))
}

async fn update_attendance(
    Path(attendance_id): Path<String>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<AttendanceUpdate>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = repositories::attendance::find_by_id(state.db(), &attendance_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attendance"))?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    guards::require_teaching_assignment(
        &state,
        &user,
        &current.academic_year_id,
        &current.class_id,
        &current.subject_id,
    )
    .await?;
    if let Some(records) = payload.records.as_deref() {
        validation::validate_attendance_entries(records)?;
        validation::ensure_class_members(
            &state,
            &current.class_id,
            records.iter().map(|entry| entry.student_id.as_str()),
        )
        .await?;
    }

    let record = repositories::attendance::update(
        state.db(),
        &attendance_id,
        repositories::attendance::UpdateAttendance {
            date: payload.date,
            records: payload.records,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update attendance"))?
    .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    tracing::info!(teacher_id = %user.id, attendance_id = %record.id, "Attendance updated");

    Ok(Json(AttendanceResponse::from_db(record)))
}

/// Per-student recap for one class, optionally narrowed to a subject.
async fn class_summary(
    Query(query): Query<RecapQuery>,
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<AttendanceRecap>, ApiError> {
    let recap = reports::load_attendance_recap(&state, &user, &query).await?;
    metrics::record_report("attendance_recap", "api", recap.rows.len());

    Ok(Json(recap))
}

async fn my_attendance(
    Query(query): Query<YearQuery>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<MyAttendanceResponse>, ApiError> {
    let year = guards::resolve_year(&state, query.academic_year_id.as_deref()).await?;
    let filters = repositories::attendance::ListAttendance {
        academic_year_id: Some(year.id.clone()),
        class_id: student.student_class_id().map(str::to_string),
        ..Default::default()
    };

    let (records, subjects) = tokio::try_join!(
        repositories::attendance::list(state.db(), &filters),
        repositories::subjects::list(state.db()),
    )
    .map_err(|e| ApiError::internal(e, "Failed to load attendance"))?;

    let names: HashMap<&str, &str> =
        subjects.iter().map(|subject| (subject.id.as_str(), subject.name.as_str())).collect();
    let summary = attendance_tally::tally_student(&records, &student.id);
    let per_subject = attendance_tally::tally_by_subject(&records, &student.id)
        .into_iter()
        .map(|entry| SubjectRateResponse {
            subject_name: names.get(entry.subject_id.as_str()).map(|name| name.to_string()),
            present_rate: entry.summary.present_rate(),
            subject_id: entry.subject_id,
            summary: entry.summary,
        })
        .collect();

    Ok(Json(MyAttendanceResponse {
        academic_year_id: year.id,
        present_rate: summary.present_rate(),
        has_sessions: summary.has_sessions(),
        summary,
        subjects: per_subject,
    }))
}
