use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: String,
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: OffsetDateTime,
}

/// Notification joined with its sender's public identity, as listed to the
/// recipient.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationWithSender {
    pub id: Uuid,
    pub from_user: Uuid,
    pub kind: String,
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: OffsetDateTime,
    pub from_username: Option<String>,
    pub from_profile_img: Option<String>,
}

/// Insert inside a caller-owned transaction; follow/like/comment flows use
/// this so the notification commits or rolls back with the action itself.
pub async fn insert_notification_tx(
    tx: &mut Transaction<'_, Postgres>,
    from_user: Uuid,
    to_user: Uuid,
    kind: NotificationKind,
    post_id: Option<Uuid>,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO notifications (from_user, to_user, kind, post_id)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(from_user)
    .bind(to_user)
    .bind(kind.as_str())
    .bind(post_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_for_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<NotificationWithSender>, ApiError> {
    let rows = sqlx::query_as::<_, NotificationWithSender>(
        "SELECT n.id, n.from_user, n.kind, n.post_id, n.read, n.created_at,
                u.username AS from_username, u.profile_img AS from_profile_img
         FROM notifications n
         LEFT JOIN users u ON u.id = n.from_user
         WHERE n.to_user = $1
         ORDER BY n.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn mark_all_read(db: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    let result = sqlx::query("UPDATE notifications SET read = true WHERE to_user = $1 AND NOT read")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Notification>, ApiError> {
    let notification = sqlx::query_as::<_, Notification>(
        "SELECT id, from_user, to_user, kind, post_id, read, created_at
         FROM notifications
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(notification)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_all_for_user(db: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM notifications WHERE to_user = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_collection_values() {
        assert_eq!(NotificationKind::Follow.as_str(), "follow");
        assert_eq!(NotificationKind::Like.as_str(), "like");
        assert_eq!(NotificationKind::Comment.as_str(), "comment");
    }
}
