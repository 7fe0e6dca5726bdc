// Store port for follow edges.

use async_trait::async_trait;
use std::cmp::Reverse;
use uuid::Uuid;

use crate::modules::follows::model::Follow;
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Fails with `Duplicate` when the edge already exists.
    async fn insert(&self, follow: Follow) -> Result<Follow, StoreError>;
    async fn find(&self, follower: Uuid, followee: Uuid) -> Option<Follow>;
    /// Edges where the user is the follower, newest first.
    async fn list_following(&self, follower: Uuid) -> Vec<Follow>;
    /// Edges where the user is the followee, newest first.
    async fn list_followers(&self, followee: Uuid) -> Vec<Follow>;
    async fn delete(&self, follower: Uuid, followee: Uuid) -> bool;
    /// Drops every edge touching the user, in either direction.
    async fn delete_by_user(&self, user: Uuid) -> usize;
}

pub struct MemoryFollowStore {
    rows: MemoryCollection<Follow>,
}

impl MemoryFollowStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }

    fn newest_first(mut follows: Vec<Follow>) -> Vec<Follow> {
        follows.sort_by_key(|follow| Reverse(follow.created));
        follows
    }
}

#[async_trait]
impl FollowStore for MemoryFollowStore {
    async fn insert(&self, follow: Follow) -> Result<Follow, StoreError> {
        let follower = follow.follower;
        let followee = follow.followee;
        self.rows
            .insert_unique(follow.id, follow, |existing| {
                existing.follower == follower && existing.followee == followee
            })
            .await
    }

    async fn find(&self, follower: Uuid, followee: Uuid) -> Option<Follow> {
        self.rows
            .find_one(|follow| follow.follower == follower && follow.followee == followee)
            .await
    }

    async fn list_following(&self, follower: Uuid) -> Vec<Follow> {
        Self::newest_first(self.rows.find(|follow| follow.follower == follower).await)
    }

    async fn list_followers(&self, followee: Uuid) -> Vec<Follow> {
        Self::newest_first(self.rows.find(|follow| follow.followee == followee).await)
    }

    async fn delete(&self, follower: Uuid, followee: Uuid) -> bool {
        self.rows
            .remove_where(|follow| follow.follower == follower && follow.followee == followee)
            .await
            > 0
    }

    async fn delete_by_user(&self, user: Uuid) -> usize {
        self.rows
            .remove_where(|follow| follow.follower == user || follow.followee == user)
            .await
    }
}
