use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::config::Settings;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, SessionResponse};
use crate::schemas::user::UserResponse;

/// Max login attempts per uid per window.
const LOGIN_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let uid = payload.uid.trim();

    let rate_key = format!("rl:login:{uid}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let row = repositories::users::find_by_id(state.db(), uid)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("User is not registered"))?;

    let user = User::try_from(row).map_err(|err| {
        tracing::warn!(uid, error = %err, "Login refused for user without a usable role");
        ApiError::Forbidden("User has no recognized role")
    })?;

    let token = security::create_session_token(&user, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create session token"))?;
    let lifetime = security::session_lifetime(state.settings());
    let expires_at = OffsetDateTime::now_utc() + lifetime;

    tracing::info!(uid = %user.id, role = %user.role(), "User logged in");

    let jar = jar.add(session_cookie(state.settings(), token, lifetime));
    Ok((
        jar,
        Json(SessionResponse {
            user: UserResponse::from_db(user),
            expires_at: format_primitive(time::PrimitiveDateTime::new(
                expires_at.date(),
                expires_at.time(),
            )),
        }),
    ))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let name = state.settings().security().cookie_name.clone();
    (StatusCode::NO_CONTENT, jar.remove(Cookie::build((name, "")).path("/")))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

fn session_cookie(settings: &Settings, token: String, lifetime: time::Duration) -> Cookie<'static> {
    let security = settings.security();
    Cookie::build((security.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.cookie_secure)
        .max_age(lifetime)
        .build()
}
