// Store port for user-scoped categories.

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::categories::model::Category;
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with `Duplicate` when the owner already has a category with the name.
    async fn insert(&self, category: Category) -> Result<Category, StoreError>;
    async fn get(&self, id: Uuid) -> Option<Category>;
    async fn find_by_name(&self, owner: Uuid, name: &str) -> Option<Category>;
    async fn list_by_owner(&self, owner: Uuid) -> Vec<Category>;
    async fn rename(&self, id: Uuid, owner: Uuid, name: String) -> Result<Category, StoreError>;
    async fn delete(&self, id: Uuid) -> bool;
    async fn delete_by_owner(&self, owner: Uuid) -> usize;
}

pub struct MemoryCategoryStore {
    rows: MemoryCollection<Category>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn insert(&self, category: Category) -> Result<Category, StoreError> {
        let owner = category.owner;
        let name = category.name.clone();
        self.rows
            .insert_unique(category.id, category, |existing| {
                existing.owner == owner && existing.name == name
            })
            .await
    }

    async fn get(&self, id: Uuid) -> Option<Category> {
        self.rows.get(&id).await
    }

    async fn find_by_name(&self, owner: Uuid, name: &str) -> Option<Category> {
        self.rows
            .find_one(|category| category.owner == owner && category.name == name)
            .await
    }

    async fn list_by_owner(&self, owner: Uuid) -> Vec<Category> {
        let mut categories = self.rows.find(|category| category.owner == owner).await;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    async fn rename(&self, id: Uuid, owner: Uuid, name: String) -> Result<Category, StoreError> {
        let taken = name.clone();
        self.rows
            .modify_unique(
                &id,
                move |category| category.name = name,
                move |other| other.owner == owner && other.name == taken,
            )
            .await
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.rows.remove(&id).await
    }

    async fn delete_by_owner(&self, owner: Uuid) -> usize {
        self.rows.remove_where(|category| category.owner == owner).await
    }
}

#[cfg(test)]
mod category_store_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_scope_name_uniqueness_to_the_owner() {
        let store = MemoryCategoryStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        store
            .insert(Category::new(ada, "Reading".to_string()))
            .await
            .expect("ada's category");
        store
            .insert(Category::new(grace, "Reading".to_string()))
            .await
            .expect("same name for another owner");
        let result = store.insert(Category::new(ada, "Reading".to_string())).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_an_owners_categories_sorted_by_name() {
        let store = MemoryCategoryStore::new();
        let ada = Uuid::now_v7();
        for name in ["Writing", "Admin", "Reading"] {
            store
                .insert(Category::new(ada, name.to_string()))
                .await
                .expect("insert");
        }
        let names: Vec<String> = store
            .list_by_owner(ada)
            .await
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["Admin", "Reading", "Writing"]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_refuse_renaming_onto_an_existing_name() {
        let store = MemoryCategoryStore::new();
        let ada = Uuid::now_v7();
        let reading = store
            .insert(Category::new(ada, "Reading".to_string()))
            .await
            .expect("insert");
        store
            .insert(Category::new(ada, "Writing".to_string()))
            .await
            .expect("insert");
        let result = store.rename(reading.id, ada, "Writing".to_string()).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }
}
