use serde::{Deserialize, Serialize};

/// A community posts can be filed under. Groups are never written through the API.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Seed entry for a group, as found in the groups file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}
