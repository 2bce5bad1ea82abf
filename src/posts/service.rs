//! Read-time resolution of author references. Posts store bare user IDs;
//! every read path looks the referenced users up in one batch and shapes
//! the response DTOs from the pair.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::posts::dto::{CommentResponse, PostResponse};
use crate::posts::repo::Post;
use crate::users::dto::UserRef;
use crate::users::repo as users_repo;

pub async fn hydrate(db: &PgPool, posts: Vec<Post>) -> Result<Vec<PostResponse>, ApiError> {
    let mut ids: Vec<Uuid> = posts
        .iter()
        .flat_map(|p| {
            std::iter::once(p.user_id).chain(p.comments.0.iter().map(|c| c.user_id))
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let authors: HashMap<Uuid, UserRef> = users_repo::find_many(db, &ids)
        .await?
        .iter()
        .map(|u| (u.id, UserRef::from(u)))
        .collect();

    Ok(assemble(posts, &authors))
}

pub async fn hydrate_one(db: &PgPool, post: Post) -> Result<PostResponse, ApiError> {
    let mut hydrated = hydrate(db, vec![post]).await?;
    hydrated
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("hydration dropped a post")))
}

/// Pure assembly step: pair each post and comment with its author reference.
/// Dangling references (a deleted author) resolve to `None`.
pub fn assemble(posts: Vec<Post>, authors: &HashMap<Uuid, UserRef>) -> Vec<PostResponse> {
    posts
        .into_iter()
        .map(|post| PostResponse {
            id: post.id,
            user: authors.get(&post.user_id).cloned(),
            text: post.text,
            img: post.img,
            likes: post.likes,
            comments: post
                .comments
                .0
                .into_iter()
                .map(|c| CommentResponse {
                    id: c.id,
                    user: authors.get(&c.user_id).cloned(),
                    text: c.text,
                    created_at: c.created_at,
                })
                .collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::repo::Comment;
    use sqlx::types::Json;
    use time::macros::datetime;

    fn user_ref(id: Uuid, username: &str) -> UserRef {
        UserRef {
            id,
            username: username.into(),
            full_name: username.to_uppercase(),
            profile_img: "".into(),
        }
    }

    fn post(author: Uuid, comment_author: Option<Uuid>) -> Post {
        let comments = comment_author
            .map(|user_id| {
                vec![Comment {
                    id: Uuid::new_v4(),
                    user_id,
                    text: "nice".into(),
                    created_at: datetime!(2024-01-02 00:00 UTC),
                }]
            })
            .unwrap_or_default();
        Post {
            id: Uuid::new_v4(),
            user_id: author,
            text: Some("hello".into()),
            img: None,
            likes: vec![],
            comments: Json(comments),
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn assemble_resolves_post_and_comment_authors() {
        let author = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let mut authors = HashMap::new();
        authors.insert(author, user_ref(author, "alice"));
        authors.insert(commenter, user_ref(commenter, "bob"));

        let out = assemble(vec![post(author, Some(commenter))], &authors);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].user.as_ref().unwrap().username, "alice");
        assert_eq!(out[0].comments.len(), 1);
        assert_eq!(out[0].comments[0].user.as_ref().unwrap().username, "bob");
    }

    #[test]
    fn assemble_leaves_dangling_authors_unresolved() {
        let out = assemble(vec![post(Uuid::new_v4(), None)], &HashMap::new());
        assert_eq!(out.len(), 1);
        assert!(out[0].user.is_none());
    }

    #[test]
    fn assemble_keeps_likes_and_text() {
        let author = Uuid::new_v4();
        let liker = Uuid::new_v4();
        let mut p = post(author, None);
        p.likes = vec![liker];
        let out = assemble(vec![p], &HashMap::new());
        assert_eq!(out[0].likes, vec![liker]);
        assert_eq!(out[0].text.as_deref(), Some("hello"));
    }
}
