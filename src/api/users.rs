use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{User, UserRow};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{SubjectAssignment, UserCreate, UserListQuery, UserResponse, UserUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:user_id/subjects", put(assign_subjects))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let rows = repositories::users::list(
        state.db(),
        &repositories::users::ListUsers { role: params.role, class_id: params.class_id },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let users = rows
        .into_iter()
        .filter_map(|row| match User::try_from(row) {
            Ok(user) => Some(UserResponse::from_db(user)),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unusable user row");
                None
            }
        })
        .collect();

    Ok(Json(users))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = load_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let uid = payload.uid.trim();
    let class_id = payload.class_id.as_deref().map(str::trim).filter(|value| !value.is_empty());
    match (payload.role, class_id) {
        (UserRole::Siswa, None) => {
            return Err(ApiError::UnprocessableEntity(
                "Students must belong to a class".to_string(),
            ));
        }
        (UserRole::Siswa, Some(class_id)) => ensure_class_exists(&state, class_id).await?,
        (_, Some(_)) => {
            return Err(ApiError::UnprocessableEntity(
                "Only students can be assigned to a class".to_string(),
            ));
        }
        (_, None) => {}
    }
    if payload.role != UserRole::Guru && !payload.subject_ids.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Only teachers can be assigned subjects".to_string(),
        ));
    }

    let existing = repositories::users::exists(state.db(), uid)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing {
        return Err(ApiError::Conflict("User with this uid already exists".to_string()));
    }

    let now = primitive_now_utc();
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: uid,
            email: payload.email.trim(),
            name: payload.name.trim(),
            role: payload.role,
            class_id,
            nis: payload.nis.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    if payload.role == UserRole::Guru && !payload.subject_ids.is_empty() {
        repositories::users::set_subjects(state.db(), uid, &payload.subject_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to assign subjects"))?;
    }

    let user = load_user(&state, uid).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        role = %user.role(),
        action = "user_create",
        "Admin created user"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = load_user(&state, &user_id).await?;
    if let Some(class_id) = payload.class_id.as_deref() {
        if current.role() != UserRole::Siswa {
            return Err(ApiError::UnprocessableEntity(
                "Only students can be assigned to a class".to_string(),
            ));
        }
        ensure_class_exists(&state, class_id).await?;
    }

    repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            email: payload.email.map(|value| value.trim().to_string()),
            name: payload.name.map(|value| value.trim().to_string()),
            class_id: payload.class_id,
            nis: payload.nis,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    let updated = load_user(&state, &user_id).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %updated.id,
        action = "user_update",
        "Admin updated user"
    );

    Ok(Json(UserResponse::from_db(updated)))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if user_id == admin.id {
        return Err(ApiError::UnprocessableEntity("Admins cannot delete themselves".to_string()));
    }

    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user_id,
        action = "user_delete",
        "Admin deleted user"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the subjects a teacher is qualified for.
async fn assign_subjects(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SubjectAssignment>,
) -> Result<Json<UserResponse>, ApiError> {
    let current = load_user(&state, &user_id).await?;
    if current.role() != UserRole::Guru {
        return Err(ApiError::UnprocessableEntity(
            "Only teachers can be assigned subjects".to_string(),
        ));
    }

    let mut subject_ids: Vec<String> = payload
        .subject_ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    subject_ids.sort();
    subject_ids.dedup();

    repositories::users::set_subjects(state.db(), &user_id, &subject_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign subjects"))?;

    let updated = load_user(&state, &user_id).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %updated.id,
        subjects = subject_ids.len(),
        action = "user_assign_subjects",
        "Admin updated teacher subjects"
    );

    Ok(Json(UserResponse::from_db(updated)))
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let row: UserRow = repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    User::try_from(row).map_err(|err| ApiError::UnprocessableEntity(err.to_string()))
}

async fn ensure_class_exists(state: &AppState, class_id: &str) -> Result<(), ApiError> {
    repositories::classes::find_by_id(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))
}
