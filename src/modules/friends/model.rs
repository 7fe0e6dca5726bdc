use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A confirmed two-way relation; the pair is unordered.
#[derive(Debug, Clone)]
pub struct Friendship {
    pub id: Uuid,
    pub users: [Uuid; 2],
    pub created: DateTime<Utc>,
}

impl Friendship {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            users: [a, b],
            created: Utc::now(),
        }
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.users.contains(&user)
    }

    pub fn pairs(&self, a: Uuid, b: Uuid) -> bool {
        self.involves(a) && self.involves(b) && a != b
    }

    /// The counterpart of `user` in the pair; falls back to the first slot
    /// for a user outside the pair.
    pub fn other(&self, user: Uuid) -> Uuid {
        if self.users[0] == user {
            self.users[1]
        } else {
            self.users[0]
        }
    }

    pub fn view(&self, users: [String; 2]) -> FriendshipView {
        FriendshipView {
            id: self.id,
            users,
            created: self.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendshipView {
    pub id: Uuid,
    pub users: [String; 2],
    pub created: DateTime<Utc>,
}

/// A pending, directional offer to become friends.
#[derive(Debug, Clone)]
pub struct FriendRequest {
    pub id: Uuid,
    pub requester: Uuid,
    pub requestee: Uuid,
    pub created: DateTime<Utc>,
}

impl FriendRequest {
    pub fn new(requester: Uuid, requestee: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            requester,
            requestee,
            created: Utc::now(),
        }
    }

    pub fn between(&self, a: Uuid, b: Uuid) -> bool {
        (self.requester == a && self.requestee == b)
            || (self.requester == b && self.requestee == a)
    }

    pub fn view(&self, requester: &str, requestee: &str) -> FriendRequestView {
        FriendRequestView {
            id: self.id,
            requester: requester.to_string(),
            requestee: requestee.to_string(),
            created: self.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestView {
    pub id: Uuid,
    pub requester: String,
    pub requestee: String,
    pub created: DateTime<Utc>,
}

/// Where two users stand, from the point of view of the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FriendStatus {
    #[serde(rename = "friends")]
    Friends,
    #[serde(rename = "request sent")]
    RequestSent,
    #[serde(rename = "request received")]
    RequestReceived,
    #[serde(rename = "none")]
    None,
}
