// Store port for anxiety shields.

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::shields::model::Shield;
use crate::shared::infrastructure::memory::MemoryCollection;

#[async_trait]
pub trait ShieldStore: Send + Sync {
    /// Returns the user's shield, creating an empty one on first touch.
    async fn ensure(&self, owner: Uuid) -> Shield;
    async fn find_by_owner(&self, owner: Uuid) -> Option<Shield>;
    /// Adds the topic when absent, removes it when present.
    async fn toggle_topic(&self, owner: Uuid, topic: String) -> Shield;
    async fn delete_by_owner(&self, owner: Uuid) -> usize;
}

pub struct MemoryShieldStore {
    rows: MemoryCollection<Shield>,
}

impl MemoryShieldStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl ShieldStore for MemoryShieldStore {
    async fn ensure(&self, owner: Uuid) -> Shield {
        if let Some(shield) = self.find_by_owner(owner).await {
            return shield;
        }
        let shield = Shield::new(owner);
        self.rows.insert(shield.id, shield).await
    }

    async fn find_by_owner(&self, owner: Uuid) -> Option<Shield> {
        self.rows.find_one(|shield| shield.owner == owner).await
    }

    async fn toggle_topic(&self, owner: Uuid, topic: String) -> Shield {
        let shield = self.ensure(owner).await;
        self.rows
            .modify(&shield.id, |row| {
                if row.topics.contains(&topic) {
                    row.topics.retain(|t| *t != topic);
                } else {
                    row.topics.push(topic);
                }
            })
            .await
            .unwrap_or(shield)
    }

    async fn delete_by_owner(&self, owner: Uuid) -> usize {
        self.rows.remove_where(|shield| shield.owner == owner).await
    }
}
