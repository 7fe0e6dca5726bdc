// Store port for friendships and their pending requests.
//
// The two record kinds travel together: every route that settles a request
// also touches the friendship set, so one port keeps that wiring in one
// place.

use async_trait::async_trait;
use std::cmp::Reverse;
use uuid::Uuid;

use crate::modules::friends::model::{FriendRequest, Friendship};
use crate::shared::infrastructure::memory::{MemoryCollection, StoreError};

#[async_trait]
pub trait FriendStore: Send + Sync {
    /// Fails with `Duplicate` when the pair is already friends.
    async fn insert_friendship(&self, friendship: Friendship) -> Result<Friendship, StoreError>;
    async fn find_friendship(&self, a: Uuid, b: Uuid) -> Option<Friendship>;
    async fn list_friendships(&self, user: Uuid) -> Vec<Friendship>;
    async fn delete_friendship(&self, a: Uuid, b: Uuid) -> bool;

    /// Fails with `Duplicate` when a request already links the pair in
    /// either direction.
    async fn insert_request(&self, request: FriendRequest) -> Result<FriendRequest, StoreError>;
    async fn find_request(&self, requester: Uuid, requestee: Uuid) -> Option<FriendRequest>;
    async fn list_requests(&self, user: Uuid) -> Vec<FriendRequest>;
    async fn delete_request(&self, requester: Uuid, requestee: Uuid) -> bool;

    /// Drops every friendship and request touching the user.
    async fn delete_by_user(&self, user: Uuid) -> usize;
}

pub struct MemoryFriendStore {
    friendships: MemoryCollection<Friendship>,
    requests: MemoryCollection<FriendRequest>,
}

impl MemoryFriendStore {
    pub fn new() -> Self {
        Self {
            friendships: MemoryCollection::new(),
            requests: MemoryCollection::new(),
        }
    }
}

#[async_trait]
impl FriendStore for MemoryFriendStore {
    async fn insert_friendship(&self, friendship: Friendship) -> Result<Friendship, StoreError> {
        let [a, b] = friendship.users;
        self.friendships
            .insert_unique(friendship.id, friendship, |existing| existing.pairs(a, b))
            .await
    }

    async fn find_friendship(&self, a: Uuid, b: Uuid) -> Option<Friendship> {
        self.friendships
            .find_one(|friendship| friendship.pairs(a, b))
            .await
    }

    async fn list_friendships(&self, user: Uuid) -> Vec<Friendship> {
        let mut friendships = self
            .friendships
            .find(|friendship| friendship.involves(user))
            .await;
        friendships.sort_by_key(|friendship| Reverse(friendship.created));
        friendships
    }

    async fn delete_friendship(&self, a: Uuid, b: Uuid) -> bool {
        self.friendships
            .remove_where(|friendship| friendship.pairs(a, b))
            .await
            > 0
    }

    async fn insert_request(&self, request: FriendRequest) -> Result<FriendRequest, StoreError> {
        let requester = request.requester;
        let requestee = request.requestee;
        self.requests
            .insert_unique(request.id, request, |existing| {
                existing.between(requester, requestee)
            })
            .await
    }

    async fn find_request(&self, requester: Uuid, requestee: Uuid) -> Option<FriendRequest> {
        self.requests
            .find_one(|request| request.requester == requester && request.requestee == requestee)
            .await
    }

    async fn list_requests(&self, user: Uuid) -> Vec<FriendRequest> {
        let mut requests = self
            .requests
            .find(|request| request.requester == user || request.requestee == user)
            .await;
        requests.sort_by_key(|request| Reverse(request.created));
        requests
    }

    async fn delete_request(&self, requester: Uuid, requestee: Uuid) -> bool {
        self.requests
            .remove_where(|request| {
                request.requester == requester && request.requestee == requestee
            })
            .await
            > 0
    }

    async fn delete_by_user(&self, user: Uuid) -> usize {
        let friendships = self
            .friendships
            .remove_where(|friendship| friendship.involves(user))
            .await;
        let requests = self
            .requests
            .remove_where(|request| request.requester == user || request.requestee == user)
            .await;
        friendships + requests
    }
}

#[cfg(test)]
mod friend_store_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_find_a_friendship_in_either_order() {
        let store = MemoryFriendStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        store
            .insert_friendship(Friendship::new(ada, grace))
            .await
            .expect("insert");
        assert!(store.find_friendship(grace, ada).await.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_second_friendship_for_the_pair() {
        let store = MemoryFriendStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        store
            .insert_friendship(Friendship::new(ada, grace))
            .await
            .expect("insert");
        let result = store.insert_friendship(Friendship::new(grace, ada)).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_counter_request_while_one_is_pending() {
        let store = MemoryFriendStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        store
            .insert_request(FriendRequest::new(ada, grace))
            .await
            .expect("insert");
        let result = store.insert_request(FriendRequest::new(grace, ada)).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_only_delete_a_request_by_its_direction() {
        let store = MemoryFriendStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        store
            .insert_request(FriendRequest::new(ada, grace))
            .await
            .expect("insert");
        assert!(!store.delete_request(grace, ada).await);
        assert!(store.delete_request(ada, grace).await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_drop_all_relations_of_a_deleted_user() {
        let store = MemoryFriendStore::new();
        let ada = Uuid::now_v7();
        let grace = Uuid::now_v7();
        let hopper = Uuid::now_v7();
        store
            .insert_friendship(Friendship::new(ada, grace))
            .await
            .expect("friendship");
        store
            .insert_request(FriendRequest::new(hopper, ada))
            .await
            .expect("request");
        assert_eq!(store.delete_by_user(ada).await, 2);
        assert!(store.list_friendships(grace).await.is_empty());
        assert!(store.list_requests(hopper).await.is_empty());
    }
}
