//! The in-process local item store: a keyed map of [`LocalItem`] rows with
//! tombstone semantics, guarded by a single reader-writer lock.

mod error;

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use item::Item;
use uuid::Uuid;

pub use error::{Error, Result};

/// A row in the local store: an item plus the bookkeeping the reconciler
/// needs to match it against the remote store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalItem {
    pub id: String,
    /// Zero means "not yet known on the server".
    pub remote_id: i64,
    pub body: Item,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub delete_mark: bool,
}

impl LocalItem {
    /// A freshly-created row: no remote id yet, not tombstoned, both
    /// timestamps set to `now`.
    pub fn new(body: Item, now: DateTime<Utc>) -> Self {
        LocalItem {
            id: String::new(),
            remote_id: 0,
            body,
            create_time: now,
            update_time: now,
            delete_mark: false,
        }
    }
}

/// A partial update to a [`LocalItem`]. Only `Some` fields are written;
/// `id` identifies the row and is never itself mutated.
#[derive(Clone, Debug, Default)]
pub struct UpdateItem {
    pub id: String,
    pub remote_id: Option<i64>,
    pub body: Option<Item>,
    pub update_time: Option<DateTime<Utc>>,
    pub delete_mark: Option<bool>,
}

impl UpdateItem {
    pub fn new(id: impl Into<String>) -> Self {
        UpdateItem {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn remote_id(mut self, remote_id: i64) -> Self {
        self.remote_id = Some(remote_id);
        self
    }

    pub fn body(mut self, body: Item) -> Self {
        self.body = Some(body);
        self
    }

    pub fn update_time(mut self, update_time: DateTime<Utc>) -> Self {
        self.update_time = Some(update_time);
        self
    }

    pub fn delete_mark(mut self, delete_mark: bool) -> Self {
        self.delete_mark = Some(delete_mark);
        self
    }
}

fn apply_update(item: &mut LocalItem, patch: UpdateItem) {
    if let Some(remote_id) = patch.remote_id {
        item.remote_id = remote_id;
    }
    if let Some(body) = patch.body {
        item.body = body;
    }
    if let Some(update_time) = patch.update_time {
        item.update_time = update_time;
    }
    if let Some(delete_mark) = patch.delete_mark {
        item.delete_mark = delete_mark;
    }
}

/// Keyed store of local items. Readers take a shared lock, writers an
/// exclusive one; no operation blocks on I/O.
#[derive(Default)]
pub struct LocalStore {
    items: RwLock<HashMap<String, LocalItem>>,
}

impl LocalStore {
    pub fn new() -> Self {
        LocalStore::default()
    }

    /// Assigns a fresh id, stores a copy of `item`, and returns the id.
    /// Never fails.
    pub fn create_item(&self, mut item: LocalItem) -> String {
        let id = Uuid::new_v4().to_string();
        item.id = id.clone();
        tracing::trace!(item_id = %id, "create_item");
        self.items.write().unwrap().insert(id.clone(), item);
        id
    }

    pub fn get_item(&self, id: &str) -> Result<LocalItem> {
        self.items
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Snapshot copy of all rows, including tombstoned ones. Iteration order
    /// is unspecified.
    pub fn list_items(&self) -> Vec<LocalItem> {
        self.items.read().unwrap().values().cloned().collect()
    }

    pub fn update_item(&self, patch: UpdateItem) -> Result<()> {
        let mut items = self.items.write().unwrap();
        let item = items
            .get_mut(&patch.id)
            .ok_or_else(|| Error::ItemNotFound(patch.id.clone()))?;
        tracing::trace!(item_id = %patch.id, "update_item");
        apply_update(item, patch);
        Ok(())
    }

    /// Physically removes the row. Contrast with setting `delete_mark`,
    /// which leaves the row in place as a tombstone.
    pub fn delete_item(&self, id: &str) -> Result<()> {
        tracing::trace!(item_id = %id, "delete_item");
        self.items
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    pub fn clear(&self) {
        self.items.write().unwrap().clear();
    }
}
