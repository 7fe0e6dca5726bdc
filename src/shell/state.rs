use std::sync::Arc;

use crate::modules::categories::store::{CategoryStore, MemoryCategoryStore};
use crate::modules::circles::store::{CircleStore, MemoryCircleStore};
use crate::modules::entries::store::{EntryStore, MemoryEntryStore, OwnerLocks};
use crate::modules::follows::store::{FollowStore, MemoryFollowStore};
use crate::modules::friends::store::{FriendStore, MemoryFriendStore};
use crate::modules::goals::store::{GoalStore, MemoryGoalStore};
use crate::modules::posts::store::{MemoryPostStore, PostStore};
use crate::modules::shields::store::{MemoryShieldStore, ShieldStore};
use crate::modules::users::store::{
    MemorySessionStore, MemoryUserStore, SessionStore, UserStore,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub entries: Arc<dyn EntryStore>,
    pub goals: Arc<dyn GoalStore>,
    pub posts: Arc<dyn PostStore>,
    pub follows: Arc<dyn FollowStore>,
    pub friends: Arc<dyn FriendStore>,
    pub circles: Arc<dyn CircleStore>,
    pub shields: Arc<dyn ShieldStore>,
    pub entry_locks: Arc<OwnerLocks>,
}

impl AppState {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            categories: Arc::new(MemoryCategoryStore::new()),
            entries: Arc::new(MemoryEntryStore::new()),
            goals: Arc::new(MemoryGoalStore::new()),
            posts: Arc::new(MemoryPostStore::new()),
            follows: Arc::new(MemoryFollowStore::new()),
            friends: Arc::new(MemoryFriendStore::new()),
            circles: Arc::new(MemoryCircleStore::new()),
            shields: Arc::new(MemoryShieldStore::new()),
            entry_locks: Arc::new(OwnerLocks::new()),
        }
    }
}
