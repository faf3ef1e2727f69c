use super::Authored;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub text: String,
    pub image: Option<String>,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}
