//! An in-process reference remote item store: the same surface a real
//! server exposes, scoped per user and guarded by a single reader-writer
//! lock the same way [`store::LocalStore`](../../store/index.html) is.
//! Used by the bundled demo and by integration tests so the reconciler can
//! be exercised without a real network service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::client::{NewRemoteItem, RemoteItem, RemoteItemClient, SharedToken};
use crate::error::{Error, Result};

struct User {
    id: i64,
    password: String,
}

#[derive(Default)]
struct State {
    next_user_id: i64,
    users: HashMap<String, User>,
    sessions: HashMap<String, i64>,
    next_item_id: i64,
    items: HashMap<(i64, i64), RemoteItem>,
}

pub struct InMemoryRemoteStore {
    token: SharedToken,
    state: Arc<RwLock<State>>,
}

impl InMemoryRemoteStore {
    /// `token` is the [`SharedToken`] an [`crate::Authenticator`] built over
    /// this store writes into on login; this store reads the same cell to
    /// resolve the calling user on every item-service request.
    pub fn new(token: SharedToken) -> Self {
        InMemoryRemoteStore {
            token,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Another authenticated session against the same backing data,
    /// reading a different token cell. Models a second device talking to
    /// the same server.
    pub fn with_token(&self, token: SharedToken) -> Self {
        InMemoryRemoteStore {
            token,
            state: Arc::clone(&self.state),
        }
    }

    fn current_user_id(&self) -> Result<i64> {
        let token = self.token.get();
        if token.is_empty() {
            return Err(Error::Unauthenticated);
        }
        self.state
            .read()
            .unwrap()
            .sessions
            .get(&token)
            .copied()
            .ok_or(Error::Unauthenticated)
    }
}

#[async_trait]
impl RemoteItemClient for InMemoryRemoteStore {
    async fn create_item(&self, item: NewRemoteItem, _deadline: Duration) -> Result<i64> {
        let user_id = self.current_user_id()?;
        let mut state = self.state.write().unwrap();
        let id = state.next_item_id;
        state.next_item_id += 1;
        state.items.insert(
            (user_id, id),
            RemoteItem {
                id,
                data: item.data,
                create_time: item.create_time,
                update_time: item.update_time,
            },
        );
        Ok(id)
    }

    async fn get_item(&self, id: i64, _deadline: Duration) -> Result<RemoteItem> {
        let user_id = self.current_user_id()?;
        self.state
            .read()
            .unwrap()
            .items
            .get(&(user_id, id))
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn update_item(&self, item: RemoteItem, _deadline: Duration) -> Result<()> {
        let user_id = self.current_user_id()?;
        let mut state = self.state.write().unwrap();
        let slot = state
            .items
            .get_mut(&(user_id, item.id))
            .ok_or(Error::NotFound)?;
        slot.data = item.data;
        slot.create_time = item.create_time;
        slot.update_time = item.update_time;
        Ok(())
    }

    async fn delete_item(&self, id: i64, _deadline: Duration) -> Result<()> {
        let user_id = self.current_user_id()?;
        self.state
            .write()
            .unwrap()
            .items
            .remove(&(user_id, id))
            .map(|_| ())
            .ok_or(Error::NotFound)
    }

    async fn list_items(&self, _deadline: Duration) -> Result<Vec<RemoteItem>> {
        let user_id = self.current_user_id()?;
        Ok(self
            .state
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn register(&self, login: &str, password: &str, _deadline: Duration) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.users.contains_key(login) {
            return Err(Error::AlreadyExists);
        }
        let id = state.next_user_id;
        state.next_user_id += 1;
        state.users.insert(
            login.to_string(),
            User {
                id,
                password: password.to_string(),
            },
        );
        Ok(())
    }

    async fn login(&self, login: &str, password: &str, _deadline: Duration) -> Result<String> {
        let mut state = self.state.write().unwrap();
        let user = state.users.get(login).ok_or(Error::UserNotFound)?;
        if user.password != password {
            return Err(Error::InvalidCredentials);
        }
        let user_id = user.id;
        let token = Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), user_id);
        Ok(token)
    }
}
