use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const MAX_POST_LENGTH: usize = 140;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub author: Uuid,
    pub content: String,
    /// Name of the author's circle the post is restricted to, if any.
    pub circle: Option<String>,
    /// Normalized topic labels used by shield filtering.
    pub topics: Vec<String>,
    pub created: DateTime<Utc>,
}

impl Post {
    pub fn new(author: Uuid, content: String, circle: Option<String>, topics: Vec<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            author,
            content,
            circle,
            topics,
            created: Utc::now(),
        }
    }

    pub fn view(&self, author: &str) -> PostView {
        PostView {
            id: self.id,
            author: author.to_string(),
            content: self.content.clone(),
            circle: self.circle.clone(),
            topics: self.topics.clone(),
            created: self.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: String,
    pub content: String,
    pub circle: Option<String>,
    pub topics: Vec<String>,
    pub created: DateTime<Utc>,
}

/// True when the post advertises a topic the reader shields against. Both
/// sides are normalized at the boundary, so plain equality is enough.
pub fn blocked_by_shield(topics: &[String], shielded: &[String]) -> bool {
    topics.iter().any(|topic| shielded.contains(topic))
}
