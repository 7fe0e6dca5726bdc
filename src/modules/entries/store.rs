// Store port for time entries, plus the per-owner write lock.
//
// Purpose
// - Persist entries and answer the windowed queries the routes need.
//
// Responsibilities
// - Serialize each owner's overlap-check-then-write sequences through
//   `OwnerLocks` so concurrent writes cannot break the no-overlap rule.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::modules::entries::model::Entry;
use crate::modules::entries::overlap::{TimeRange, matches_window};
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn insert(&self, entry: Entry) -> Entry;
    async fn get(&self, id: Uuid) -> Option<Entry>;
    /// All of the owner's entries that match the optional category and the
    /// inclusive time window, ordered by start time.
    async fn list(
        &self,
        owner: Uuid,
        category: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<Entry>;
    async fn update(
        &self,
        id: Uuid,
        category: Uuid,
        range: TimeRange,
        tag: Option<String>,
    ) -> Result<Entry, StoreError>;
    async fn resize(&self, id: Uuid, range: TimeRange) -> Result<Entry, StoreError>;
    async fn delete(&self, id: Uuid) -> bool;
    async fn delete_by_category(&self, category: Uuid) -> usize;
    async fn delete_by_owner(&self, owner: Uuid) -> usize;
}

/// One async mutex per owner. A guard must be held across an owner's whole
/// check-then-write sequence; lock entries are created on first use and
/// discarded when the owner's account is deleted.
pub struct OwnerLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, owner: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            Arc::clone(locks.entry(owner).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        lock.lock_owned().await
    }

    /// Removes an owner's lock entry once nothing holds or awaits it. While
    /// a guard or waiter keeps its own handle alive this is a no-op, so a
    /// discarded owner can never end up with two live locks.
    pub async fn discard(&self, owner: Uuid) {
        let mut locks = self.inner.lock().await;
        if locks
            .get(&owner)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&owner);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

pub struct MemoryEntryStore {
    rows: MemoryCollection<Entry>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn insert(&self, entry: Entry) -> Entry {
        self.rows.insert(entry.id, entry).await
    }

    async fn get(&self, id: Uuid) -> Option<Entry> {
        self.rows.get(&id).await
    }

    async fn list(
        &self,
        owner: Uuid,
        category: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<Entry> {
        let mut entries = self
            .rows
            .find(|entry| {
                entry.owner == owner
                    && category.is_none_or(|category| entry.category == category)
                    && matches_window(entry.range(), from, until)
            })
            .await;
        entries.sort_by_key(|entry| entry.start);
        entries
    }

    async fn update(
        &self,
        id: Uuid,
        category: Uuid,
        range: TimeRange,
        tag: Option<String>,
    ) -> Result<Entry, StoreError> {
        self.rows
            .modify(&id, move |entry| {
                entry.category = category;
                entry.start = range.start;
                entry.end = range.end;
                entry.tag = tag;
            })
            .await
    }

    async fn resize(&self, id: Uuid, range: TimeRange) -> Result<Entry, StoreError> {
        self.rows
            .modify(&id, move |entry| {
                entry.start = range.start;
                entry.end = range.end;
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.rows.remove(&id).await
    }

    async fn delete_by_category(&self, category: Uuid) -> usize {
        self.rows.remove_where(|entry| entry.category == category).await
    }

    async fn delete_by_owner(&self, owner: Uuid) -> usize {
        self.rows.remove_where(|entry| entry.owner == owner).await
    }
}

#[cfg(test)]
mod entry_store_tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 17, hour, 0, 0).unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange {
            start: at(start),
            end: at(end),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_entries_ordered_by_start() {
        let store = MemoryEntryStore::new();
        let owner = Uuid::now_v7();
        let category = Uuid::now_v7();
        for (start, end) in [(13, 14), (9, 10), (11, 12)] {
            store
                .insert(Entry::new(owner, category, range(start, end), None))
                .await;
        }
        let starts: Vec<DateTime<Utc>> = store
            .list(owner, None, None, None)
            .await
            .into_iter()
            .map(|entry| entry.start)
            .collect();
        assert_eq!(starts, vec![at(9), at(11), at(13)]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_filter_the_list_by_category_and_window() {
        let store = MemoryEntryStore::new();
        let owner = Uuid::now_v7();
        let reading = Uuid::now_v7();
        let writing = Uuid::now_v7();
        store
            .insert(Entry::new(owner, reading, range(9, 10), None))
            .await;
        store
            .insert(Entry::new(owner, writing, range(10, 11), None))
            .await;
        store
            .insert(Entry::new(owner, reading, range(15, 16), None))
            .await;

        let matched = store
            .list(owner, Some(reading), Some(at(8)), Some(at(12)))
            .await;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].start, at(9));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_leak_entries_across_owners() {
        let store = MemoryEntryStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        let category = Uuid::now_v7();
        store
            .insert(Entry::new(ada, category, range(9, 10), None))
            .await;
        assert!(store.list(grace, None, None, None).await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_resize_an_entry_in_place() {
        let store = MemoryEntryStore::new();
        let owner = Uuid::now_v7();
        let entry = store
            .insert(Entry::new(owner, Uuid::now_v7(), range(9, 12), None))
            .await;
        let resized = store.resize(entry.id, range(9, 10)).await.expect("resize");
        assert_eq!(resized.end, at(10));
        assert_eq!(resized.id, entry.id);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_cascade_deletes_by_category() {
        let store = MemoryEntryStore::new();
        let owner = Uuid::now_v7();
        let reading = Uuid::now_v7();
        store
            .insert(Entry::new(owner, reading, range(9, 10), None))
            .await;
        store
            .insert(Entry::new(owner, reading, range(11, 12), None))
            .await;
        store
            .insert(Entry::new(owner, Uuid::now_v7(), range(13, 14), None))
            .await;
        assert_eq!(store.delete_by_category(reading).await, 2);
        assert_eq!(store.list(owner, None, None, None).await.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_hand_out_independent_locks_per_owner() {
        let locks = OwnerLocks::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        let held = locks.acquire(ada).await;
        // A different owner must not block.
        let other = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(grace))
            .await
            .expect("independent owner lock");
        drop(other);
        drop(held);
        // The same owner can lock again after release.
        let again = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(ada))
            .await
            .expect("reacquire after release");
        drop(again);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_discard_an_owners_lock_only_once_idle() {
        let locks = OwnerLocks::new();
        let ada = Uuid::now_v7();
        let held = locks.acquire(ada).await;
        locks.discard(ada).await;
        assert_eq!(locks.len().await, 1);
        drop(held);
        locks.discard(ada).await;
        assert_eq!(locks.len().await, 0);
        // Discarding an owner that never locked is harmless.
        locks.discard(Uuid::now_v7()).await;
    }
}
