use crate::models::{Comment, Follow, Group, NewGroup, NewPost, Post, User};
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("group slug {0} is already taken")]
    SlugTaken(String),
    #[error("post {0} does not exist")]
    PostNotFound(i64),
    #[error("user {user_id} already follows {following_id}")]
    AlreadyFollowing { user_id: i64, following_id: i64 },
    #[error("user {0} cannot follow themselves")]
    SelfFollow(i64),
}

/// Monotonic id source for one table. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// In-process tables for every entity the API serves.
///
/// Each table is a `DashMap` keyed by id. Unique constraints live in side indexes
/// (`usernames`, `slugs`, `follow_pairs`) and are claimed through the `entry` API, so
/// the check and the insert happen under the same shard lock.
#[derive(Debug, Default)]
pub struct Store {
    users: DashMap<i64, User>,
    usernames: DashMap<String, i64>,
    groups: DashMap<i64, Group>,
    slugs: DashMap<String, i64>,
    posts: DashMap<i64, Post>,
    comments: DashMap<i64, Comment>,
    follows: DashMap<i64, Follow>,
    follow_pairs: DashMap<(i64, i64), i64>,
    user_ids: Sequence,
    group_ids: Sequence,
    post_ids: Sequence,
    comment_ids: Sequence,
    follow_ids: Sequence,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: String,
    ) -> Result<User, StoreError> {
        match self.usernames.entry(username.to_string()) {
            Entry::Occupied(_) => Err(StoreError::UsernameTaken(username.to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.user_ids.next(),
                    username: username.to_string(),
                    email: email.to_string(),
                    hashed_password,
                    date_joined: Utc::now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.users.get(&id).map(|user| user.clone())
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.usernames.get(username)?;
        self.user(id)
    }

    /// Username for rendering author references.
    pub fn username(&self, id: i64) -> String {
        self.users
            .get(&id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn create_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        match self.slugs.entry(group.slug.clone()) {
            Entry::Occupied(_) => Err(StoreError::SlugTaken(group.slug)),
            Entry::Vacant(slot) => {
                let group = Group {
                    id: self.group_ids.next(),
                    title: group.title,
                    slug: group.slug,
                    description: group.description,
                };
                self.groups.insert(group.id, group.clone());
                slot.insert(group.id);
                Ok(group)
            }
        }
    }

    pub fn group(&self, id: i64) -> Option<Group> {
        self.groups.get(&id).map(|group| group.clone())
    }

    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.iter().map(|entry| entry.value().clone()).collect();
        groups.sort_by_key(|group| group.id);
        groups
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub fn create_post(&self, new: NewPost) -> Post {
        let post = Post {
            id: self.post_ids.next(),
            author_id: new.author_id,
            text: new.text,
            image: new.image,
            group_id: new.group_id,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        post
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        self.posts.get(&id).map(|post| post.clone())
    }

    /// All posts, newest first.
    pub fn posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.iter().map(|entry| entry.value().clone()).collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts
    }

    pub fn update_post(&self, id: i64, apply: impl FnOnce(&mut Post)) -> Option<Post> {
        let mut post = self.posts.get_mut(&id)?;
        apply(&mut *post);
        Some(post.clone())
    }

    /// Removes the post and every comment under it.
    pub fn delete_post(&self, id: i64) -> Option<Post> {
        let (_, post) = self.posts.remove(&id)?;
        self.comments.retain(|_, comment| comment.post_id != id);
        Some(post)
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, StoreError> {
        // The parent stays read-locked until the comment is in, so a concurrent
        // delete_post either runs first (and we fail) or sweeps this comment too.
        let parent = self
            .posts
            .get(&post_id)
            .ok_or(StoreError::PostNotFound(post_id))?;

        let comment = Comment {
            id: self.comment_ids.next(),
            author_id,
            post_id: parent.id,
            text,
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        drop(parent);

        Ok(comment)
    }

    pub fn comments_for(&self, post_id: i64) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| entry.post_id == post_id)
            .map(|entry| entry.value().clone())
            .collect();
        comments.sort_by_key(|comment| comment.id);
        comments
    }

    /// A comment, only if it sits under `post_id`.
    pub fn comment(&self, post_id: i64, id: i64) -> Option<Comment> {
        self.comments
            .get(&id)
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| comment.clone())
    }

    pub fn update_comment(&self, id: i64, text: String) -> Option<Comment> {
        let mut comment = self.comments.get_mut(&id)?;
        comment.text = text;
        Some(comment.clone())
    }

    pub fn delete_comment(&self, id: i64) -> Option<Comment> {
        self.comments.remove(&id).map(|(_, comment)| comment)
    }

    // ------------------------------------------------------------------
    // Follows
    // ------------------------------------------------------------------

    pub fn create_follow(&self, user_id: i64, following_id: i64) -> Result<Follow, StoreError> {
        if user_id == following_id {
            return Err(StoreError::SelfFollow(user_id));
        }

        match self.follow_pairs.entry((user_id, following_id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyFollowing {
                user_id,
                following_id,
            }),
            Entry::Vacant(slot) => {
                let follow = Follow {
                    id: self.follow_ids.next(),
                    user_id,
                    following_id,
                };
                self.follows.insert(follow.id, follow.clone());
                slot.insert(follow.id);
                Ok(follow)
            }
        }
    }

    /// Outgoing follows of `user_id`, oldest first.
    pub fn follows_of(&self, user_id: i64) -> Vec<Follow> {
        let mut follows: Vec<Follow> = self
            .follows
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        follows.sort_by_key(|follow| follow.id);
        follows
    }
}
