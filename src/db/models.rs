use serde::{Deserialize, Serialize};

/// Reference data owned by the external identity subsystem; this crate
/// only reads usernames and holds foreign keys to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_staff: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub published_at: String,
    pub author_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub published_at: String,
}
