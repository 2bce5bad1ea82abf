use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::media::delete_hosted_image;
use crate::state::AppState;
use crate::users::dto::{FollowResponse, UpdateUserRequest, UserResponse};
use crate::users::repo::{self, FollowAction};
use crate::validation::{is_valid_password, validate_update, PASSWORD_RULE};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile/:username", get(get_profile))
        .route("/users/follow/:id", post(follow_unfollow))
        .route("/users/update", put(update_profile))
        .route("/users/suggested", get(get_suggested))
}

const SUGGESTED_LIMIT: i64 = 10;

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(_viewer): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repo::find_by_username(&state.db, &username.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn follow_unfollow(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let target_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("invalid user id".into()))?;
    if target_id == actor_id {
        return Err(ApiError::BadRequest(
            "you cannot follow/unfollow yourself".into(),
        ));
    }

    let action = repo::toggle_follow(&state.db, actor_id, target_id).await?;
    let message = match action {
        FollowAction::Followed => "user followed successfully",
        FollowAction::Unfollowed => "user unfollowed successfully",
    };
    info!(actor = %actor_id, target = %target_id, ?action, "follow toggled");
    Ok(Json(FollowResponse {
        message: message.into(),
        user_id: target_id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let errors = validate_update(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    if payload.current_password.is_some() || payload.new_password.is_some() {
        let (Some(current), Some(new)) = (&payload.current_password, &payload.new_password)
        else {
            return Err(ApiError::BadRequest(
                "both current and new passwords are required".into(),
            ));
        };
        if !verify_password(current, &user.password_hash)? {
            warn!(user_id = %user.id, "profile update with wrong current password");
            return Err(ApiError::BadRequest("current password is incorrect".into()));
        }
        if !is_valid_password(new) {
            return Err(ApiError::BadRequest(PASSWORD_RULE.into()));
        }
        user.password_hash = hash_password(new)?;
    }

    // A fresh image replaces the hosted one; the previous asset is deleted
    // from the media host first.
    if let Some(img) = payload.profile_img.as_deref().filter(|v| !v.is_empty()) {
        delete_hosted_image(state.media.as_ref(), Some(user.profile_img.as_str())).await?;
        user.profile_img = state.media.upload(img).await?;
    }
    if let Some(img) = payload.cover_img.as_deref().filter(|v| !v.is_empty()) {
        delete_hosted_image(state.media.as_ref(), Some(user.cover_img.as_str())).await?;
        user.cover_img = state.media.upload(img).await?;
    }

    // Identity fields ignore empty strings; bio and link treat an empty
    // string as "clear this field".
    if let Some(full_name) = payload.full_name.as_deref().map(str::trim) {
        if !full_name.is_empty() {
            user.full_name = full_name.to_string();
        }
    }
    if let Some(email) = payload.email.as_deref().map(str::trim) {
        if !email.is_empty() {
            user.email = email.to_lowercase();
        }
    }
    if let Some(username) = payload.username.as_deref().map(str::trim) {
        if !username.is_empty() {
            user.username = username.to_lowercase();
        }
    }
    if let Some(bio) = payload.bio.as_deref() {
        user.bio = bio.trim().to_string();
    }
    if let Some(link) = payload.link.as_deref() {
        user.link = link.trim().to_string();
    }

    let updated = repo::update(&state.db, &user).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn get_suggested(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let suggestions = repo::suggested(&state.db, &user, SUGGESTED_LIMIT).await?;
    Ok(Json(suggestions.into_iter().map(Into::into).collect()))
}
