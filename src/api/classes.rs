use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentAdmin, CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::academic::{ClassCreate, ClassResponse, ClassUpdate};
use crate::schemas::attendance::YearQuery;
use crate::schemas::user::UserResponse;
use crate::services::report_card;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/:class_id", patch(update_class))
        .route("/:class_id/students", get(list_students))
}

async fn list_classes(
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = repositories::classes::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;

    Ok(Json(classes.into_iter().map(ClassResponse::from_db).collect()))
}

async fn create_class(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class = repositories::classes::create(
        state.db(),
        repositories::classes::CreateClass {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            level: payload.level.trim(),
            wali_kelas_id: payload.wali_kelas_id.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "class_create",
        class_id = %class.id,
        "Admin action"
    );

    Ok((StatusCode::CREATED, Json(ClassResponse::from_db(class))))
}

async fn update_class(
    Path(class_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassUpdate>,
) -> Result<Json<ClassResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class = repositories::classes::update(
        state.db(),
        &class_id,
        repositories::classes::UpdateClass {
            name: payload.name.map(|value| value.trim().to_string()),
            level: payload.level.map(|value| value.trim().to_string()),
            wali_kelas_id: payload.wali_kelas_id,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update class"))?
    .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        action = "class_update",
        class_id = %class.id,
        "Admin action"
    );

    Ok(Json(ClassResponse::from_db(class)))
}

/// Class roster for staff who may see the class in the given (or active) year.
async fn list_students(
    Path(class_id): Path<String>,
    axum::extract::Query(query): axum::extract::Query<YearQuery>,
    CurrentStaff(user): CurrentStaff,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    let year = guards::resolve_year(&state, query.academic_year_id.as_deref()).await?;
    if !guards::can_view_class(&state, &user, &year.id, &class_id).await? {
        return Err(ApiError::Forbidden("Not allowed to view this class"));
    }

    let roster = report_card::load_roster(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class roster"))?;

    Ok(Json(roster.into_iter().map(UserResponse::from_db).collect()))
}
