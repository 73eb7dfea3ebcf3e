//! User store collaborator consulted by the auth interceptor.

use crate::RpcError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Persisted user as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }
}

/// Store lookup failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),

    #[error("user store query failed: {0}")]
    Query(String),
}

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        RpcError::internal(err)
    }
}

/// Lookup of users by id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no user has this id.
    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// `HashMap`-backed store for tests and local wiring.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.write().insert(user.id.clone(), user);
    }

    pub fn remove(&self, id: &str) -> Option<UserRecord> {
        self.users.write().remove(id)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().get(id).cloned())
    }
}
