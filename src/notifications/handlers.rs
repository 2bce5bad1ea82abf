use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::dto::MessageResponse;
use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::notifications::dto::NotificationResponse;
use crate::notifications::repo;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list).delete(delete_all))
        .route("/notifications/:id", delete(delete_one))
}

/// Listing doubles as the read receipt: everything unread is marked read
/// once it has been handed to the client.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = repo::list_for_user(&state.db, user_id).await?;
    let marked = repo::mark_all_read(&state.db, user_id).await?;
    if marked > 0 {
        debug!(user_id = %user_id, marked, "notifications marked read");
    }
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn delete_one(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let notification_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("invalid notification id".into()))?;

    let notification = repo::find_by_id(&state.db, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("notification not found".into()))?;
    if notification.to_user != user_id {
        return Err(ApiError::Forbidden(
            "not allowed to delete this notification".into(),
        ));
    }

    repo::delete_by_id(&state.db, notification_id).await?;
    info!(notification_id = %notification_id, user_id = %user_id, "notification deleted");
    Ok(Json(MessageResponse {
        message: "notification deleted successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_all(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = repo::delete_all_for_user(&state.db, user_id).await?;
    info!(user_id = %user_id, removed, "all notifications deleted");
    Ok(Json(MessageResponse {
        message: "all notifications deleted successfully".into(),
    }))
}
