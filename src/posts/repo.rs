use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::notifications::repo::{insert_notification_tx, NotificationKind};

/// Comment embedded in the post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Post record: likers as a uuid array with set semantics, comments as an
/// embedded jsonb list.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Json<Vec<Comment>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const POST_COLUMNS: &str = "id, user_id, text, img, likes, comments, created_at, updated_at";

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    text: Option<&str>,
    img: Option<&str>,
) -> Result<Post, ApiError> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "INSERT INTO posts (user_id, text, img)
         VALUES ($1, $2, $3)
         RETURNING {POST_COLUMNS}"
    ))
    .bind(user_id)
    .bind(text)
    .bind(img)
    .fetch_one(db)
    .await?;
    Ok(post)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Post>, ApiError> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(post)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Append a comment and notify the post owner, in one transaction.
pub async fn append_comment(
    db: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    text: &str,
) -> Result<Post, ApiError> {
    let mut tx = db.begin().await?;

    let owner: Option<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
    let owner = owner.ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        user_id,
        text: text.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    let post = sqlx::query_as::<_, Post>(&format!(
        "UPDATE posts SET comments = comments || $2, updated_at = now()
         WHERE id = $1
         RETURNING {POST_COLUMNS}"
    ))
    .bind(post_id)
    .bind(Json(&comment))
    .fetch_one(&mut *tx)
    .await?;

    if owner != user_id {
        insert_notification_tx(&mut tx, user_id, owner, NotificationKind::Comment, Some(post_id))
            .await?;
    }

    tx.commit().await?;
    Ok(post)
}

/// Toggle the caller's membership in the post's liker set, mirror the change
/// into the user's liked-posts list and notify the owner on a fresh like.
/// Returns the updated liker list and whether the post is now liked.
pub async fn toggle_like(
    db: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<(Vec<Uuid>, bool), ApiError> {
    let mut tx = db.begin().await?;

    let row: Option<(Uuid, Vec<Uuid>)> =
        sqlx::query_as("SELECT user_id, likes FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (owner, likes) = row.ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    let now_liked = !likes.contains(&user_id);
    let likes: Vec<Uuid> = if now_liked {
        let likes: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE posts SET likes = array_append(likes, $2), updated_at = now()
             WHERE id = $1
             RETURNING likes",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE users SET liked_posts = array_append(liked_posts, $2), updated_at = now()
             WHERE id = $1 AND NOT liked_posts @> ARRAY[$2]",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        if owner != user_id {
            insert_notification_tx(&mut tx, user_id, owner, NotificationKind::Like, Some(post_id))
                .await?;
        }
        likes
    } else {
        let likes: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE posts SET likes = array_remove(likes, $2), updated_at = now()
             WHERE id = $1
             RETURNING likes",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE users SET liked_posts = array_remove(liked_posts, $2), updated_at = now()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        likes
    };

    tx.commit().await?;
    Ok((likes, now_liked))
}

pub async fn list_all(db: &PgPool) -> Result<Vec<Post>, ApiError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(posts)
}

pub async fn list_by_author(db: &PgPool, author_id: Uuid) -> Result<Vec<Post>, ApiError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(author_id)
    .fetch_all(db)
    .await?;
    Ok(posts)
}

pub async fn list_by_authors(db: &PgPool, author_ids: &[Uuid]) -> Result<Vec<Post>, ApiError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE user_id = ANY($1) ORDER BY created_at DESC"
    ))
    .bind(author_ids)
    .fetch_all(db)
    .await?;
    Ok(posts)
}

pub async fn list_in(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Post>, ApiError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1) ORDER BY created_at DESC"
    ))
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(posts)
}
