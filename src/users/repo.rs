use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::notifications::repo::{insert_notification_tx, NotificationKind};

/// User record. The follow graph and the liked-posts mirror are stored
/// denormalized on the row itself, as uuid arrays with set semantics.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: String,
    pub cover_img: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, bio, link, \
     profile_img, cover_img, followers, following, liked_posts, created_at, updated_at";

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn username_or_email_taken(
    db: &PgPool,
    username: &str,
    email: &str,
) -> Result<bool, ApiError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
    )
    .bind(username)
    .bind(email)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

pub async fn insert(
    db: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    full_name: &str,
) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password_hash, full_name)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Persist every mutable profile field of an already-loaded user.
pub async fn update(db: &PgPool, user: &User) -> Result<User, ApiError> {
    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users
         SET username = $2, email = $3, password_hash = $4, full_name = $5,
             bio = $6, link = $7, profile_img = $8, cover_img = $9, updated_at = now()
         WHERE id = $1
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(&user.bio)
    .bind(&user.link)
    .bind(&user.profile_img)
    .bind(&user.cover_img)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Followed,
    Unfollowed,
}

/// Toggle the follow relation between actor and target. Both sides of the
/// denormalized pair and the follow notification are written in one
/// transaction, and the array updates are idempotent set operations.
pub async fn toggle_follow(
    db: &PgPool,
    actor_id: Uuid,
    target_id: Uuid,
) -> Result<FollowAction, ApiError> {
    let mut tx = db.begin().await?;

    let rows: Vec<(Uuid, Vec<Uuid>)> = sqlx::query_as(
        "SELECT id, following FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(vec![actor_id, target_id])
    .fetch_all(&mut *tx)
    .await?;

    let actor_following = rows
        .iter()
        .find(|(id, _)| *id == actor_id)
        .map(|(_, following)| following.clone())
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if !rows.iter().any(|(id, _)| *id == target_id) {
        return Err(ApiError::NotFound("user not found".into()));
    }

    let action = if actor_following.contains(&target_id) {
        sqlx::query(
            "UPDATE users SET followers = array_remove(followers, $1), updated_at = now()
             WHERE id = $2",
        )
        .bind(actor_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE users SET following = array_remove(following, $1), updated_at = now()
             WHERE id = $2",
        )
        .bind(target_id)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;
        FollowAction::Unfollowed
    } else {
        sqlx::query(
            "UPDATE users SET followers = array_append(followers, $1), updated_at = now()
             WHERE id = $2 AND NOT followers @> ARRAY[$1]",
        )
        .bind(actor_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE users SET following = array_append(following, $1), updated_at = now()
             WHERE id = $2 AND NOT following @> ARRAY[$1]",
        )
        .bind(target_id)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;
        insert_notification_tx(&mut tx, actor_id, target_id, NotificationKind::Follow, None)
            .await?;
        FollowAction::Followed
    };

    tx.commit().await?;
    Ok(action)
}

/// A bounded random sample of users the caller does not already follow.
pub async fn suggested(db: &PgPool, user: &User, limit: i64) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE id <> $1 AND NOT (id = ANY($2))
         ORDER BY random()
         LIMIT $3"
    ))
    .bind(user.id)
    .bind(&user.following)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(db: &PgPool, username: &str) -> Uuid {
        insert(
            db,
            username,
            &format!("{username}@example.com"),
            "$argon2id$stub",
            "Test User",
        )
        .await
        .unwrap()
        .id
    }

    async fn follow_notifications(db: &PgPool, to_user: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM notifications WHERE to_user = $1 AND kind = 'follow'",
        )
        .bind(to_user)
        .fetch_one(db)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn follow_then_unfollow_restores_both_sides(db: PgPool) {
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let action = toggle_follow(&db, alice, bob).await.unwrap();
        assert_eq!(action, FollowAction::Followed);
        let a = find_by_id(&db, alice).await.unwrap().unwrap();
        let b = find_by_id(&db, bob).await.unwrap().unwrap();
        assert_eq!(a.following, vec![bob]);
        assert_eq!(b.followers, vec![alice]);

        let action = toggle_follow(&db, alice, bob).await.unwrap();
        assert_eq!(action, FollowAction::Unfollowed);
        let a = find_by_id(&db, alice).await.unwrap().unwrap();
        let b = find_by_id(&db, bob).await.unwrap().unwrap();
        assert!(a.following.is_empty());
        assert!(b.followers.is_empty());
    }

    #[sqlx::test]
    async fn follow_notifies_the_target_exactly_once(db: PgPool) {
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        toggle_follow(&db, alice, bob).await.unwrap();
        assert_eq!(follow_notifications(&db, bob).await, 1);
        assert_eq!(follow_notifications(&db, alice).await, 0);

        // unfollow adds nothing
        toggle_follow(&db, alice, bob).await.unwrap();
        assert_eq!(follow_notifications(&db, bob).await, 1);
    }

    #[sqlx::test]
    async fn follow_rejects_a_missing_target(db: PgPool) {
        let alice = seed_user(&db, "alice").await;
        let err = toggle_follow(&db, alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
