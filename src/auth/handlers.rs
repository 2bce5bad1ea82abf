use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::{
    cookie::{clear_session_cookie, session_cookie},
    dto::{LoginRequest, MessageResponse, SignupRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{dto::UserResponse, repo as users_repo};
use crate::validation::{validate_login, validate_signup};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.username = payload.username.trim().to_lowercase();
    payload.email = payload.email.trim().to_lowercase();

    let errors = validate_signup(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if users_repo::username_or_email_taken(&state.db, &payload.username, &payload.email).await? {
        warn!(username = %payload.username, "signup with taken username or email");
        return Err(ApiError::Conflict("username or email already taken".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = users_repo::insert(
        &state.db,
        &payload.username,
        &payload.email,
        &hash,
        payload.full_name.trim(),
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let jar = jar.add(session_cookie(&state.config, token));

    info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.username = payload.username.trim().to_lowercase();

    let errors = validate_login(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // One generic message for both unknown user and bad password.
    let invalid = || ApiError::Unauthorized("invalid username or password".into());

    let user = users_repo::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login unknown username");
            invalid()
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let jar = jar.add(session_cookie(&state.config, token));

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((jar, Json(AuthResponse { user: user.into() })))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    // Stateless: the old token stays valid until expiry, only the cookie goes.
    let jar = jar.add(clear_session_cookie());
    (
        jar,
        Json(MessageResponse {
            message: "logged out successfully".into(),
        }),
    )
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = users_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user.into()))
}
