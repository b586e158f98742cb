use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{request::Parts, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{AcademicYear, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::print;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);
/// Admin or teacher.
pub(crate) struct CurrentStaff(pub(crate) User);
pub(crate) struct CurrentStudent(pub(crate) User);
/// Session for printable pages: a missing session redirects to login.
pub(crate) struct PageUser(pub(crate) User);

enum SessionFailure {
    Missing,
    Invalid,
    Error(ApiError),
}

async fn resolve_session(parts: &mut Parts, state: &AppState) -> Result<User, SessionFailure> {
    let State(app_state) = State::<AppState>::from_request_parts(parts, state)
        .await
        .map_err(|e| {
            SessionFailure::Error(ApiError::internal(e, "Failed to access application state"))
        })?;

    let jar = CookieJar::from_headers(&parts.headers);
    let cookie_name = &app_state.settings().security().cookie_name;
    let token = jar.get(cookie_name).map(|cookie| cookie.value().to_string());
    let Some(token) = token.filter(|value| !value.is_empty()) else {
        return Err(SessionFailure::Missing);
    };

    let claims = security::verify_session_token(&token, app_state.settings())
        .map_err(|_| SessionFailure::Invalid)?;

    let row = repositories::users::find_by_id(app_state.db(), &claims.uid)
        .await
        .map_err(|e| SessionFailure::Error(ApiError::internal(e, "Failed to load user")))?;
    let Some(row) = row else {
        return Err(SessionFailure::Invalid);
    };

    User::try_from(row).map_err(|err| {
        tracing::warn!(uid = %claims.uid, error = %err, "Session user has no usable role");
        SessionFailure::Invalid
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(parts, state).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(SessionFailure::Missing | SessionFailure::Invalid) => {
                Err(ApiError::Unauthorized("Invalid authentication credentials"))
            }
            Err(SessionFailure::Error(err)) => Err(err),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role() {
            UserRole::Admin => Ok(CurrentAdmin(user)),
            _ => Err(ApiError::Forbidden("Admin access required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role() {
            UserRole::Admin | UserRole::Guru => Ok(CurrentStaff(user)),
            UserRole::Siswa => Err(ApiError::Forbidden("Teacher access required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role() {
            UserRole::Siswa => Ok(CurrentStudent(user)),
            _ => Err(ApiError::Forbidden("Student access required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(parts, state).await {
            Ok(user) => Ok(PageUser(user)),
            Err(SessionFailure::Missing | SessionFailure::Invalid) => {
                Err(Redirect::to(&state.settings().api().login_path).into_response())
            }
            Err(SessionFailure::Error(err)) => Err(err.into_response()),
        }
    }
}

/// Plain HTML not-found page used by the print routes for both missing
/// records and role mismatches.
pub(crate) fn page_not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(print::render_not_found(what))).into_response()
}

/// Teachers may only write attendance and grades for lessons they are
/// scheduled to teach; admins are not restricted.
pub(crate) async fn require_teaching_assignment(
    state: &AppState,
    user: &User,
    academic_year_id: &str,
    class_id: &str,
    subject_id: &str,
) -> Result<(), ApiError> {
    match user.role() {
        UserRole::Admin => Ok(()),
        UserRole::Guru => {
            let bound = repositories::schedules::teaching_binding_exists(
                state.db(),
                academic_year_id,
                class_id,
                subject_id,
                &user.id,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check teaching assignment"))?;

            if bound {
                Ok(())
            } else {
                Err(ApiError::Forbidden("Not scheduled to teach this class and subject"))
            }
        }
        UserRole::Siswa => Err(ApiError::Forbidden("Teacher access required")),
    }
}

/// Class-wide views: admins, the homeroom teacher, or anyone teaching the
/// class in the year.
pub(crate) async fn can_view_class(
    state: &AppState,
    user: &User,
    academic_year_id: &str,
    class_id: &str,
) -> Result<bool, ApiError> {
    match user.role() {
        UserRole::Admin => Ok(true),
        UserRole::Guru if user.is_homeroom_of(class_id) => Ok(true),
        UserRole::Guru => repositories::schedules::teaches_class(
            state.db(),
            academic_year_id,
            class_id,
            &user.id,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check class access")),
        UserRole::Siswa => Ok(false),
    }
}

/// A student's own record, or a staff member allowed to see their class.
pub(crate) async fn can_view_student(
    state: &AppState,
    viewer: &User,
    student: &User,
    academic_year_id: &str,
) -> Result<bool, ApiError> {
    if viewer.id == student.id {
        return Ok(true);
    }
    let Some(class_id) = student.student_class_id() else {
        return Ok(false);
    };
    can_view_class(state, viewer, academic_year_id, class_id).await
}

/// Explicit year id, otherwise the active year.
pub(crate) async fn resolve_year(
    state: &AppState,
    academic_year_id: Option<&str>,
) -> Result<AcademicYear, ApiError> {
    let year = match academic_year_id {
        Some(id) => repositories::academic_years::find_by_id(state.db(), id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load academic year"))?,
        None => repositories::academic_years::find_active(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load active academic year"))?,
    };

    year.ok_or_else(|| match academic_year_id {
        Some(_) => ApiError::NotFound("Academic year not found".to_string()),
        None => ApiError::NotFound("No active academic year".to_string()),
    })
}

/// Loads a student by uid, failing with 404 for unknown or non-student ids.
pub(crate) async fn load_student(state: &AppState, uid: &str) -> Result<User, ApiError> {
    let row = repositories::users::find_by_id(state.db(), uid)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    match User::try_from(row) {
        Ok(user) if user.role() == UserRole::Siswa => Ok(user),
        _ => Err(ApiError::NotFound("Student not found".to_string())),
    }
}
