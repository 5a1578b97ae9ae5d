use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// A row as the remote item store holds it: an opaque blob plus the
/// timestamps the client supplied on write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: i64,
    pub data: Vec<u8>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// An item not yet assigned a remote id, as sent on `create_item`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRemoteItem {
    pub data: Vec<u8>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// The token the authenticator currently holds, shared by value with every
/// [`RemoteItemClient`] built over it. A single writer (the authenticator),
/// many readers (every outbound call) — see design note in the top-level
/// crate docs.
#[derive(Clone, Default)]
pub struct SharedToken(Arc<RwLock<String>>);

impl SharedToken {
    pub fn new() -> Self {
        SharedToken(Arc::new(RwLock::new(String::new())))
    }

    pub fn get(&self) -> String {
        self.0.read().unwrap().clone()
    }

    pub fn set(&self, token: String) {
        *self.0.write().unwrap() = token;
    }

    pub fn clear(&self) {
        self.set(String::new());
    }

    pub fn is_set(&self) -> bool {
        !self.get().is_empty()
    }
}

/// The authenticated RPC contract to the remote item store. Transport
/// (request/response framing, token propagation) is an implementation
/// detail behind this trait: see [`crate::http::HttpItemClient`] for a real
/// one and [`crate::memory::InMemoryRemoteStore`] for a reference one used
/// by tests and the bundled demo.
#[async_trait]
pub trait RemoteItemClient: Send + Sync {
    async fn create_item(&self, item: NewRemoteItem, deadline: Duration) -> Result<i64>;
    async fn get_item(&self, id: i64, deadline: Duration) -> Result<RemoteItem>;
    async fn update_item(&self, item: RemoteItem, deadline: Duration) -> Result<()>;
    async fn delete_item(&self, id: i64, deadline: Duration) -> Result<()>;
    async fn list_items(&self, deadline: Duration) -> Result<Vec<RemoteItem>>;

    /// Unauthenticated: registers a new user. Fails `AlreadyExists`.
    async fn register(&self, login: &str, password: &str, deadline: Duration) -> Result<()>;
    /// Unauthenticated: logs a user in, returning the session token.
    /// Fails `InvalidCredentials` on a bad login/password pair.
    async fn login(&self, login: &str, password: &str, deadline: Duration) -> Result<String>;
}
