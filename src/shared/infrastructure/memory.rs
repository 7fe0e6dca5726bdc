// In memory implementation of the record collections behind the store ports.
//
// Purpose
// - Support route handler tests and local development without a database.
//
// Responsibilities
// - Hold one record type per collection, keyed by id.
// - Run uniqueness checks and the matching write under a single lock guard.

use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record violates a uniqueness rule")]
    Duplicate,
}

pub struct MemoryCollection<T: Clone + Send + Sync + 'static> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone + Send + Sync + 'static> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, id: Uuid, row: T) -> T {
        let mut guard = self.rows.write().await;
        guard.insert(id, row.clone());
        row
    }

    /// Inserts only when no existing row matches `conflicts`.
    pub async fn insert_unique<P>(&self, id: Uuid, row: T, conflicts: P) -> Result<T, StoreError>
    where
        P: Fn(&T) -> bool,
    {
        let mut guard = self.rows.write().await;
        if guard.values().any(|existing| conflicts(existing)) {
            return Err(StoreError::Duplicate);
        }
        guard.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get(&self, id: &Uuid) -> Option<T> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn find_one<P>(&self, matches: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.read().await.values().find(|row| matches(row)).cloned()
    }

    pub async fn find<P>(&self, matches: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| matches(row))
            .cloned()
            .collect()
    }

    pub async fn modify<F>(&self, id: &Uuid, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T),
    {
        let mut guard = self.rows.write().await;
        let row = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        apply(row);
        Ok(row.clone())
    }

    /// Like `modify`, but refuses the change when another row matches `conflicts`.
    pub async fn modify_unique<F, P>(&self, id: &Uuid, apply: F, conflicts: P) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T),
        P: Fn(&T) -> bool,
    {
        let mut guard = self.rows.write().await;
        if !guard.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        if guard.iter().any(|(other, row)| other != id && conflicts(row)) {
            return Err(StoreError::Duplicate);
        }
        let row = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        apply(row);
        Ok(row.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.rows.write().await.remove(id).is_some()
    }

    /// Removes every row matching `matches`; returns how many were dropped.
    pub async fn remove_where<P>(&self, matches: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut guard = self.rows.write().await;
        let before = guard.len();
        guard.retain(|_, row| !matches(row));
        before - guard.len()
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }
}
