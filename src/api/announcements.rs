use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::Audience;
use crate::repositories;
use crate::schemas::announcement::{AnnouncementCreate, AnnouncementListQuery, AnnouncementResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_announcements).post(create_announcement))
        .route("/:announcement_id", delete(delete_announcement))
}

/// Newest first, filtered to what the caller's role may read.
async fn list_announcements(
    Query(query): Query<AnnouncementListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnouncementResponse>>, ApiError> {
    query.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let audience = Audience::visible_to(user.role());
    let announcements = repositories::announcements::list_for(state.db(), audience, query.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list announcements"))?;

    Ok(Json(announcements.into_iter().map(AnnouncementResponse::from_db).collect()))
}

async fn create_announcement(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<AnnouncementCreate>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let announcement = repositories::announcements::create(
        state.db(),
        repositories::announcements::CreateAnnouncement {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            content: &payload.content,
            audience: payload.audience,
            author_id: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create announcement"))?;

    tracing::info!(
        author_id = %user.id,
        announcement_id = %announcement.id,
        audience = ?announcement.audience,
        "Announcement published"
    );

    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from_db(announcement))))
}

async fn delete_announcement(
    Path(announcement_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::announcements::delete(state.db(), &announcement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete announcement"))?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Announcement not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        action = "announcement_delete",
        announcement_id = %announcement_id,
        "Admin action"
    );

    Ok(StatusCode::NO_CONTENT)
}
