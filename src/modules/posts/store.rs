// Store port for posts.

use async_trait::async_trait;
use std::cmp::Reverse;
use uuid::Uuid;

use crate::modules::posts::model::Post;
use crate::shared::infrastructure::memory::MemoryCollection;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> Post;
    async fn get(&self, id: Uuid) -> Option<Post>;
    async fn list_all(&self) -> Vec<Post>;
    async fn list_by_author(&self, author: Uuid) -> Vec<Post>;
    async fn list_by_authors(&self, authors: &[Uuid]) -> Vec<Post>;
    async fn delete(&self, id: Uuid) -> bool;
    async fn delete_by_author(&self, author: Uuid) -> usize;
    /// Drops the posts an author restricted to one of their circles.
    async fn delete_in_circle(&self, author: Uuid, circle: &str) -> usize;
}

pub struct MemoryPostStore {
    rows: MemoryCollection<Post>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }

    fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
        posts.sort_by_key(|post| Reverse(post.created));
        posts
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, post: Post) -> Post {
        self.rows.insert(post.id, post).await
    }

    async fn get(&self, id: Uuid) -> Option<Post> {
        self.rows.get(&id).await
    }

    async fn list_all(&self) -> Vec<Post> {
        Self::newest_first(self.rows.find(|_| true).await)
    }

    async fn list_by_author(&self, author: Uuid) -> Vec<Post> {
        Self::newest_first(self.rows.find(|post| post.author == author).await)
    }

    async fn list_by_authors(&self, authors: &[Uuid]) -> Vec<Post> {
        Self::newest_first(self.rows.find(|post| authors.contains(&post.author)).await)
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.rows.remove(&id).await
    }

    async fn delete_by_author(&self, author: Uuid) -> usize {
        self.rows.remove_where(|post| post.author == author).await
    }

    async fn delete_in_circle(&self, author: Uuid, circle: &str) -> usize {
        self.rows
            .remove_where(|post| {
                post.author == author && post.circle.as_deref() == Some(circle)
            })
            .await
    }
}
