use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::academic::{AcademicYearCreate, AcademicYearResponse, AcademicYearUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_years).post(create_year))
        .route("/active", get(active_year))
        .route("/:year_id", patch(update_year))
        .route("/:year_id/activate", post(activate_year))
}

async fn list_years(
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<AcademicYearResponse>>, ApiError> {
    let years = repositories::academic_years::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list academic years"))?;

    Ok(Json(years.into_iter().map(AcademicYearResponse::from_db).collect()))
}

async fn active_year(
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<AcademicYearResponse>, ApiError> {
    let year = repositories::academic_years::find_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load active academic year"))?
        .ok_or_else(|| ApiError::NotFound("No active academic year".to_string()))?;

    Ok(Json(AcademicYearResponse::from_db(year)))
}

async fn create_year(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AcademicYearCreate>,
) -> Result<(StatusCode, Json<AcademicYearResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validation::validate_date_range(payload.start_date, payload.end_date)?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let params = repositories::academic_years::CreateAcademicYear {
        id: &id,
        name: payload.name.trim(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        created_at: now,
    };
    let year = if payload.is_active {
        repositories::academic_years::create_active(state.db(), params).await
    } else {
        repositories::academic_years::create(state.db(), params).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to create academic year"))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "academic_year_create",
        academic_year_id = %year.id,
        is_active = year.is_active,
        "Admin action"
    );

    Ok((StatusCode::CREATED, Json(AcademicYearResponse::from_db(year))))
}

async fn update_year(
    Path(year_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AcademicYearUpdate>,
) -> Result<Json<AcademicYearResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = repositories::academic_years::find_by_id(state.db(), &year_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load academic year"))?
        .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))?;
    validation::validate_date_range(
        payload.start_date.unwrap_or(current.start_date),
        payload.end_date.unwrap_or(current.end_date),
    )?;

    let year = repositories::academic_years::update(
        state.db(),
        &year_id,
        repositories::academic_years::UpdateAcademicYear {
            name: payload.name.map(|name| name.trim().to_string()),
            start_date: payload.start_date,
            end_date: payload.end_date,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update academic year"))?
    .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "academic_year_update",
        academic_year_id = %year.id,
        "Admin action"
    );

    Ok(Json(AcademicYearResponse::from_db(year)))
}

async fn activate_year(
    Path(year_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Json<AcademicYearResponse>, ApiError> {
    let year = repositories::academic_years::activate(state.db(), &year_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to activate academic year"))?
        .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "academic_year_activate",
        academic_year_id = %year.id,
        "Admin action"
    );

    Ok(Json(AcademicYearResponse::from_db(year)))
}
