// Store ports for accounts and their login sessions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::users::model::{Session, User};
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the username is taken, ignoring case.
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn get(&self, id: Uuid) -> Option<User>;
    async fn find_by_username(&self, username: &str) -> Option<User>;
    async fn update(
        &self,
        id: Uuid,
        username: Option<String>,
        password_hash: Option<String>,
    ) -> Result<User, StoreError>;
    async fn delete(&self, id: Uuid) -> bool;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> Session;
    async fn get(&self, token: Uuid) -> Option<Session>;
    async fn delete(&self, token: Uuid) -> bool;
    async fn delete_for_user(&self, user_id: Uuid) -> usize;
}

pub struct MemoryUserStore {
    rows: MemoryCollection<User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let username = user.username.clone();
        self.rows
            .insert_unique(user.id, user, |existing| {
                existing.username.eq_ignore_ascii_case(&username)
            })
            .await
    }

    async fn get(&self, id: Uuid) -> Option<User> {
        self.rows.get(&id).await
    }

    async fn find_by_username(&self, username: &str) -> Option<User> {
        self.rows
            .find_one(|user| user.username.eq_ignore_ascii_case(username))
            .await
    }

    async fn update(
        &self,
        id: Uuid,
        username: Option<String>,
        password_hash: Option<String>,
    ) -> Result<User, StoreError> {
        match username {
            Some(name) => {
                let taken = name.clone();
                self.rows
                    .modify_unique(
                        &id,
                        move |user| {
                            user.username = name;
                            if let Some(hash) = password_hash {
                                user.password_hash = hash;
                            }
                        },
                        move |other| other.username.eq_ignore_ascii_case(&taken),
                    )
                    .await
            }
            None => {
                self.rows
                    .modify(&id, move |user| {
                        if let Some(hash) = password_hash {
                            user.password_hash = hash;
                        }
                    })
                    .await
            }
        }
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.rows.remove(&id).await
    }
}

pub struct MemorySessionStore {
    rows: MemoryCollection<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            rows: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> Session {
        self.rows.insert(session.token, session).await
    }

    async fn get(&self, token: Uuid) -> Option<Session> {
        self.rows.get(&token).await
    }

    async fn delete(&self, token: Uuid) -> bool {
        self.rows.remove(&token).await
    }

    async fn delete_for_user(&self, user_id: Uuid) -> usize {
        self.rows.remove_where(|session| session.user_id == user_id).await
    }
}
