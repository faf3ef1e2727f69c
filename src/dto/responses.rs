use crate::{
    models::{Comment, Follow, Post, User},
    store::Store,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

// Author references render as usernames, which live in the users table, so
// every renderer takes the store.

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub image: Option<String>,
    pub group: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn render(post: Post, store: &Store) -> Self {
        Self {
            id: post.id,
            author: store.username(post.author_id),
            text: post.text,
            image: post.image,
            group: post.group_id,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub post: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn render(comment: Comment, store: &Store) -> Self {
        Self {
            id: comment.id,
            author: store.username(comment.author_id),
            post: comment.post_id,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub user: String,
    pub following: String,
}

impl FollowResponse {
    pub fn render(follow: &Follow, store: &Store) -> Self {
        Self {
            user: store.username(follow.user_id),
            following: store.username(follow.following_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
