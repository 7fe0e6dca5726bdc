use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A one-way edge: `follower` sees `followee` in their feed.
#[derive(Debug, Clone)]
pub struct Follow {
    pub id: Uuid,
    pub follower: Uuid,
    pub followee: Uuid,
    pub created: DateTime<Utc>,
}

impl Follow {
    pub fn new(follower: Uuid, followee: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            follower,
            followee,
            created: Utc::now(),
        }
    }

    pub fn view(&self, follower: &str, followee: &str) -> FollowView {
        FollowView {
            id: self.id,
            follower: follower.to_string(),
            followee: followee.to_string(),
            created: self.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowView {
    pub id: Uuid,
    pub follower: String,
    pub followee: String,
    pub created: DateTime<Utc>,
}
