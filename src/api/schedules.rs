use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentAdmin, CurrentStaff, CurrentUser};
use crate::api::validation;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::UserProfile;
use crate::repositories;
use crate::schemas::academic::{ScheduleCreate, ScheduleListQuery, ScheduleResponse, ScheduleUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route("/me", get(my_schedule))
        .route("/:schedule_id", patch(update_schedule))
}

async fn list_schedules(
    Query(query): Query<ScheduleListQuery>,
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleResponse>>, ApiError> {
    let filters = repositories::schedules::ListSchedules {
        academic_year_id: query.academic_year_id,
        class_id: query.class_id,
        teacher_id: query.teacher_id,
        day: query.day,
    };
    let schedules = repositories::schedules::list(state.db(), &filters)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list schedules"))?;

    Ok(Json(schedules.into_iter().map(ScheduleResponse::from_db).collect()))
}

/// Lessons of the active year: taught lessons for teachers, the class
/// timetable for students, everything for admins.
async fn my_schedule(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleResponse>>, ApiError> {
    let year = guards::resolve_year(&state, None).await?;

    let mut filters = repositories::schedules::ListSchedules {
        academic_year_id: Some(year.id),
        ..Default::default()
    };
    match &user.profile {
        UserProfile::Admin => {}
        UserProfile::Guru { .. } => filters.teacher_id = Some(user.id.clone()),
        UserProfile::Siswa { class_id, .. } => filters.class_id = Some(class_id.clone()),
    }

    let schedules = repositories::schedules::list(state.db(), &filters)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list schedules"))?;

    Ok(Json(schedules.into_iter().map(ScheduleResponse::from_db).collect()))
}

async fn create_schedule(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ScheduleCreate>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validation::validate_lesson_times(payload.start_time, payload.end_time)?;

    let (year, class, subject, teacher_exists) = tokio::try_join!(
        repositories::academic_years::find_by_id(state.db(), &payload.academic_year_id),
        repositories::classes::find_by_id(state.db(), &payload.class_id),
        repositories::subjects::find_by_id(state.db(), &payload.subject_id),
        repositories::users::exists(state.db(), &payload.teacher_id),
    )
    .map_err(|e| ApiError::internal(e, "Failed to load schedule references"))?;

    if year.is_none() {
        return Err(ApiError::NotFound("Academic year not found".to_string()));
    }
    if class.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }
    if subject.is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }
    if !teacher_exists {
        return Err(ApiError::NotFound("Teacher not found".to_string()));
    }

    let schedule = repositories::schedules::create(
        state.db(),
        repositories::schedules::CreateSchedule {
            id: &Uuid::new_v4().to_string(),
            academic_year_id: &payload.academic_year_id,
            class_id: &payload.class_id,
            subject_id: &payload.subject_id,
            teacher_id: &payload.teacher_id,
            day: payload.day,
            start_time: payload.start_time,
            end_time: payload.end_time,
            room: payload.room.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create schedule"))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "schedule_create",
        schedule_id = %schedule.id,
        teacher_id = %schedule.teacher_id,
        "Admin action"
    );

    Ok((StatusCode::CREATED, Json(ScheduleResponse::from_db(schedule))))
}

async fn update_schedule(
    Path(schedule_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ScheduleUpdate>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = repositories::schedules::find_by_id(state.db(), &schedule_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load schedule"))?
        .ok_or_else(|| ApiError::NotFound("Schedule not found".to_string()))?;
    validation::validate_lesson_times(
        payload.start_time.unwrap_or(current.start_time),
        payload.end_time.unwrap_or(current.end_time),
    )?;

    let schedule = repositories::schedules::update(
        state.db(),
        &schedule_id,
        repositories::schedules::UpdateSchedule {
            subject_id: payload.subject_id,
            teacher_id: payload.teacher_id,
            day: payload.day,
            start_time: payload.start_time,
            end_time: payload.end_time,
            room: payload.room,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update schedule"))?
    .ok_or_else(|| ApiError::NotFound("Schedule not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "schedule_update",
        schedule_id = %schedule.id,
        "Admin action"
    );

    Ok(Json(ScheduleResponse::from_db(schedule)))
}
