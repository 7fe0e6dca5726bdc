// Store port for weekly goals.

use async_trait::async_trait;
use std::cmp::Reverse;
use uuid::Uuid;

use crate::modules::goals::model::{Goal, GoalKind};
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Fails with `Duplicate` when the owner already has a goal for the
    /// category. The check and the insert run under one lock, so two
    /// concurrent creates cannot both get through.
    async fn insert(&self, goal: Goal) -> Result<Goal, StoreError>;
    async fn get(&self, id: Uuid) -> Option<Goal>;
    async fn find_by_category(&self, category: Uuid) -> Option<Goal>;
    async fn list_by_owner(&self, owner: Uuid) -> Vec<Goal>;
    async fn list_by_owners(&self, owners: &[Uuid]) -> Vec<Goal>;
    async fn update(
        &self,
        id: Uuid,
        hours: Option<f64>,
        kind: Option<GoalKind>,
        private: Option<bool>,
    ) -> Result<Goal, StoreError>;
    async fn delete(&self, id: Uuid) -> bool;
    async fn delete_by_category(&self, category: Uuid) -> usize;
    async fn delete_by_owner(&self, owner: Uuid) -> usize;
}

pub struct MemoryGoalStore {
    rows: MemoryCollection<Goal>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }

    fn newest_first(mut goals: Vec<Goal>) -> Vec<Goal> {
        goals.sort_by_key(|goal| Reverse(goal.created));
        goals
    }
}

#[async_trait]
impl GoalStore for MemoryGoalStore {
    async fn insert(&self, goal: Goal) -> Result<Goal, StoreError> {
        let owner = goal.owner;
        let category = goal.category;
        self.rows
            .insert_unique(goal.id, goal, |existing| {
                existing.owner == owner && existing.category == category
            })
            .await
    }

    async fn get(&self, id: Uuid) -> Option<Goal> {
        self.rows.get(&id).await
    }

    async fn find_by_category(&self, category: Uuid) -> Option<Goal> {
        self.rows.find_one(|goal| goal.category == category).await
    }

    async fn list_by_owner(&self, owner: Uuid) -> Vec<Goal> {
        Self::newest_first(self.rows.find(|goal| goal.owner == owner).await)
    }

    async fn list_by_owners(&self, owners: &[Uuid]) -> Vec<Goal> {
        Self::newest_first(self.rows.find(|goal| owners.contains(&goal.owner)).await)
    }

    async fn update(
        &self,
        id: Uuid,
        hours: Option<f64>,
        kind: Option<GoalKind>,
        private: Option<bool>,
    ) -> Result<Goal, StoreError> {
        self.rows
            .modify(&id, move |goal| {
                if let Some(hours) = hours {
                    goal.hours = hours;
                }
                if let Some(kind) = kind {
                    goal.kind = kind;
                }
                if let Some(private) = private {
                    goal.private = private;
                }
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.rows.remove(&id).await
    }

    async fn delete_by_category(&self, category: Uuid) -> usize {
        self.rows.remove_where(|goal| goal.category == category).await
    }

    async fn delete_by_owner(&self, owner: Uuid) -> usize {
        self.rows.remove_where(|goal| goal.owner == owner).await
    }
}

#[cfg(test)]
mod goal_store_tests {
    use super::*;
    use rstest::rstest;

    fn goal(owner: Uuid, category: Uuid) -> Goal {
        Goal::new(owner, category, 5.0, GoalKind::Goal, false)
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_allow_one_goal_per_category() {
        let store = MemoryGoalStore::new();
        let ada = Uuid::now_v7();
        let reading = Uuid::now_v7();
        store.insert(goal(ada, reading)).await.expect("first goal");
        let result = store.insert(goal(ada, reading)).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_allow_goals_in_different_categories() {
        let store = MemoryGoalStore::new();
        let ada = Uuid::now_v7();
        store.insert(goal(ada, Uuid::now_v7())).await.expect("first");
        store.insert(goal(ada, Uuid::now_v7())).await.expect("second");
        assert_eq!(store.list_by_owner(ada).await.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_update_only_the_provided_fields() {
        let store = MemoryGoalStore::new();
        let ada = Uuid::now_v7();
        let created = store.insert(goal(ada, Uuid::now_v7())).await.expect("insert");
        let updated = store
            .update(created.id, Some(8.0), None, Some(true))
            .await
            .expect("update");
        assert_eq!(updated.hours, 8.0);
        assert_eq!(updated.kind, GoalKind::Goal);
        assert!(updated.private);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_goals_for_a_set_of_owners() {
        let store = MemoryGoalStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        store.insert(goal(ada, Uuid::now_v7())).await.expect("ada");
        store.insert(goal(grace, Uuid::now_v7())).await.expect("grace");
        store
            .insert(goal(stranger, Uuid::now_v7()))
            .await
            .expect("stranger");
        assert_eq!(store.list_by_owners(&[ada, grace]).await.len(), 2);
    }
}
