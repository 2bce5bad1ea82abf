use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::dto::MessageResponse;
use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::media::delete_hosted_image;
use crate::posts::dto::{
    CommentRequest, CommentResponse, CreatePostRequest, LikesResponse, PostResponse,
};
use crate::posts::{repo, service};
use crate::state::AppState;
use crate::users::repo as users_repo;
use crate::validation::validate_post;

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/all", get(get_all))
        .route("/posts/likes/:id", get(get_liked))
        .route("/posts/following", get(get_following))
        .route("/posts/user/:username", get(get_by_username))
        .route("/posts/create", post(create))
        .route("/posts/like/:id", put(like_unlike))
        .route("/posts/comment/:id", patch(comment))
        .route("/posts/:id", delete(delete_post))
}

fn parse_post_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("invalid post id".into()))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let errors = validate_post(&payload);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let img_url = match payload.img.as_deref().filter(|v| !v.is_empty()) {
        Some(img) => Some(state.media.upload(img).await?),
        None => None,
    };
    let text = payload
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let created = repo::insert(&state.db, user_id, text, img_url.as_deref()).await?;
    info!(post_id = %created.id, user_id = %user_id, "post created");
    let response = service::hydrate_one(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let post_id = parse_post_id(&id)?;
    let post = repo::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
    if post.user_id != user_id {
        return Err(ApiError::Forbidden(
            "not allowed to delete this post".into(),
        ));
    }

    // Remove the hosted image first so the reference never outlives the asset.
    delete_hosted_image(state.media.as_ref(), post.img.as_deref()).await?;
    repo::delete(&state.db, post_id).await?;

    info!(post_id = %post_id, user_id = %user_id, "post deleted");
    Ok(Json(MessageResponse {
        message: "post deleted successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let post_id = parse_post_id(&id)?;
    let text = payload
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("comment text is required".into()))?;

    let post = repo::append_comment(&state.db, post_id, user_id, text).await?;
    let response = service::hydrate_one(&state.db, post).await?;
    Ok(Json(response.comments))
}

#[instrument(skip(state))]
pub async fn like_unlike(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikesResponse>, ApiError> {
    let post_id = parse_post_id(&id)?;
    let (likes, now_liked) = repo::toggle_like(&state.db, post_id, user_id).await?;
    info!(post_id = %post_id, user_id = %user_id, now_liked, "like toggled");
    Ok(Json(LikesResponse { likes }))
}

#[instrument(skip(state))]
pub async fn get_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = repo::list_all(&state.db).await?;
    Ok(Json(service::hydrate(&state.db, posts).await?))
}

#[instrument(skip(state))]
pub async fn get_liked(
    State(state): State<AppState>,
    AuthUser(_viewer): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let user_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest("invalid user id".into()))?;
    let user = users_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let posts = repo::list_in(&state.db, &user.liked_posts).await?;
    Ok(Json(service::hydrate(&state.db, posts).await?))
}

#[instrument(skip(state))]
pub async fn get_following(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let user = users_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let posts = repo::list_by_authors(&state.db, &user.following).await?;
    Ok(Json(service::hydrate(&state.db, posts).await?))
}

#[instrument(skip(state))]
pub async fn get_by_username(
    State(state): State<AppState>,
    AuthUser(_viewer): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let user = users_repo::find_by_username(&state.db, &username.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let posts = repo::list_by_author(&state.db, user.id).await?;
    Ok(Json(service::hydrate(&state.db, posts).await?))
}
