mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::{Group, NewGroup};
pub use post::{NewPost, Post};
pub use user::User;

/// Records that belong to a single user and may only be changed by them.
pub trait Authored {
    fn author_id(&self) -> i64;
}
