use super::Authored;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}
