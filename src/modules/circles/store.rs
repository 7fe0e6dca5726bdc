// Store port for private circles.

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::circles::model::Circle;
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait CircleStore: Send + Sync {
    /// Fails with `Duplicate` when the owner already has a circle with the name.
    async fn insert(&self, circle: Circle) -> Result<Circle, StoreError>;
    async fn find(&self, owner: Uuid, name: &str) -> Option<Circle>;
    async fn list_by_owner(&self, owner: Uuid) -> Vec<Circle>;
    /// Adds the member when absent, removes them when present.
    async fn toggle_member(&self, owner: Uuid, name: &str, member: Uuid)
    -> Result<Circle, StoreError>;
    /// Drops the member from every circle the owner has.
    async fn remove_member(&self, owner: Uuid, member: Uuid) -> usize;
    /// Drops the member from every circle of every owner.
    async fn remove_member_everywhere(&self, member: Uuid) -> usize;
    async fn delete(&self, owner: Uuid, name: &str) -> bool;
    async fn delete_by_owner(&self, owner: Uuid) -> usize;
}

pub struct MemoryCircleStore {
    rows: MemoryCollection<Circle>,
}

impl MemoryCircleStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }

    async fn strip_member<P>(&self, member: Uuid, applies: P) -> usize
    where
        P: Fn(&Circle) -> bool,
    {
        let affected = self
            .rows
            .find(|circle| applies(circle) && circle.has_member(member))
            .await;
        let mut stripped = 0;
        for circle in affected {
            if self
                .rows
                .modify(&circle.id, |row| row.members.retain(|m| *m != member))
                .await
                .is_ok()
            {
                stripped += 1;
            }
        }
        stripped
    }
}

#[async_trait]
impl CircleStore for MemoryCircleStore {
    async fn insert(&self, circle: Circle) -> Result<Circle, StoreError> {
        let owner = circle.owner;
        let name = circle.name.clone();
        self.rows
            .insert_unique(circle.id, circle, |existing| {
                existing.owner == owner && existing.name == name
            })
            .await
    }

    async fn find(&self, owner: Uuid, name: &str) -> Option<Circle> {
        self.rows
            .find_one(|circle| circle.owner == owner && circle.name == name)
            .await
    }

    async fn list_by_owner(&self, owner: Uuid) -> Vec<Circle> {
        let mut circles = self.rows.find(|circle| circle.owner == owner).await;
        circles.sort_by(|a, b| a.name.cmp(&b.name));
        circles
    }

    async fn toggle_member(
        &self,
        owner: Uuid,
        name: &str,
        member: Uuid,
    ) -> Result<Circle, StoreError> {
        let circle = self.find(owner, name).await.ok_or(StoreError::NotFound)?;
        self.rows
            .modify(&circle.id, |row| {
                if row.has_member(member) {
                    row.members.retain(|m| *m != member);
                } else {
                    row.members.push(member);
                }
            })
            .await
    }

    async fn remove_member(&self, owner: Uuid, member: Uuid) -> usize {
        self.strip_member(member, |circle| circle.owner == owner).await
    }

    async fn remove_member_everywhere(&self, member: Uuid) -> usize {
        self.strip_member(member, |_| true).await
    }

    async fn delete(&self, owner: Uuid, name: &str) -> bool {
        self.rows
            .remove_where(|circle| circle.owner == owner && circle.name == name)
            .await
            > 0
    }

    async fn delete_by_owner(&self, owner: Uuid) -> usize {
        self.rows.remove_where(|circle| circle.owner == owner).await
    }
}
