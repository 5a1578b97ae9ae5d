//! One pass of bidirectional convergence between the local store and a
//! remote item store: classify, purge, download, compare, upload.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use remote::{NewRemoteItem, RemoteItem, RemoteItemClient, Result};
use store::{LocalItem, LocalStore, UpdateItem};

fn millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Runs reconciliation passes against one remote store.
///
/// Per-row failures (a single failed upload, download or delete) are logged
/// and swallowed: the pass continues and the row is retried on the next
/// call. The only error this returns is a failure to list the remote store
/// at all, which aborts the pass outright since there is nothing left to
/// converge against.
pub struct Reconciler<C: RemoteItemClient> {
    local: Arc<LocalStore>,
    remote: Arc<C>,
    request_timeout: Duration,
}

impl<C: RemoteItemClient> Reconciler<C> {
    pub fn new(local: Arc<LocalStore>, remote: Arc<C>, request_timeout: Duration) -> Self {
        Reconciler {
            local,
            remote,
            request_timeout,
        }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn remote(&self) -> &C {
        &self.remote
    }

    pub async fn reconcile(&self) -> Result<()> {
        let (to_purge, to_upload, mut to_compare) = self.classify();

        for row in &to_purge {
            if let Err(e) = self.local.delete_item(&row.id) {
                tracing::warn!(item_id = %row.id, error = %e, "failed to purge never-uploaded tombstone");
            }
        }

        let remote_items = self.remote.list_items(self.request_timeout).await?;

        for r in &remote_items {
            match to_compare.remove(&r.id) {
                None => self.download(r).await,
                Some(l) => self.compare_and_act(l, r).await,
            }
        }

        // Anything left in `to_compare` has a remote_id that did not appear
        // in this pass's remote listing: another device deleted it.
        for (_, l) in to_compare {
            if let Err(e) = self.local.delete_item(&l.id) {
                tracing::warn!(item_id = %l.id, error = %e, "failed to delete row missing from remote");
            }
        }

        for row in to_upload {
            self.upload(row).await;
        }

        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn classify(&self) -> (Vec<LocalItem>, Vec<LocalItem>, HashMap<i64, LocalItem>) {
        let mut to_purge = Vec::new();
        let mut to_upload = Vec::new();
        let mut to_compare = HashMap::new();

        for item in self.local.list_items() {
            if item.remote_id == 0 && item.delete_mark {
                to_purge.push(item);
            } else if item.remote_id == 0 {
                to_upload.push(item);
            } else {
                to_compare.insert(item.remote_id, item);
            }
        }

        (to_purge, to_upload, to_compare)
    }

    async fn download(&self, r: &RemoteItem) {
        let body = match ::item::decode(&r.data) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(remote_id = r.id, error = %e, "dropping undecodable remote row");
                return;
            }
        };
        let mut row = LocalItem::new(body, r.create_time);
        row.remote_id = r.id;
        row.update_time = r.update_time;
        self.local.create_item(row);
    }

    async fn compare_and_act(&self, l: LocalItem, r: &RemoteItem) {
        match millis(l.update_time).cmp(&millis(r.update_time)) {
            std::cmp::Ordering::Equal => {}
            std::cmp::Ordering::Less => {
                let body = match ::item::decode(&r.data) {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::error!(item_id = %l.id, error = %e, "dropping undecodable remote update");
                        return;
                    }
                };
                let patch = UpdateItem::new(l.id.clone())
                    .remote_id(r.id)
                    .body(body)
                    .update_time(r.update_time);
                if let Err(e) = self.local.update_item(patch) {
                    tracing::warn!(item_id = %l.id, error = %e, "failed to apply remote update locally");
                }
            }
            std::cmp::Ordering::Greater if l.delete_mark => {
                match self.remote.delete_item(r.id, self.request_timeout).await {
                    Ok(()) => {
                        if let Err(e) = self.local.delete_item(&l.id) {
                            tracing::warn!(item_id = %l.id, error = %e, "failed to delete local row after remote delete");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(remote_id = r.id, error = %e, "failed to delete remote row, retrying next pass");
                    }
                }
            }
            std::cmp::Ordering::Greater => {
                let pushed = RemoteItem {
                    id: r.id,
                    data: ::item::encode(&l.body),
                    create_time: l.create_time,
                    update_time: l.update_time,
                };
                if let Err(e) = self.remote.update_item(pushed, self.request_timeout).await {
                    tracing::warn!(item_id = %l.id, error = %e, "failed to push local update, retrying next pass");
                }
            }
        }
    }

    async fn upload(&self, row: LocalItem) {
        let new_item = NewRemoteItem {
            data: ::item::encode(&row.body),
            create_time: row.create_time,
            update_time: row.update_time,
        };
        match self.remote.create_item(new_item, self.request_timeout).await {
            Ok(remote_id) => {
                let patch = UpdateItem::new(row.id.clone()).remote_id(remote_id);
                if let Err(e) = self.local.update_item(patch) {
                    tracing::warn!(item_id = %row.id, error = %e, "failed to record remote_id after upload");
                }
            }
            Err(e) => {
                tracing::warn!(item_id = %row.id, error = %e, "failed to upload new local row, retrying next pass");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::item::{Item, ItemBody, Note};
    use remote::{InMemoryRemoteStore, SharedToken};
    use std::collections::HashMap as StdHashMap;

    fn note(name: &str) -> Item {
        Item::new(
            ItemBody::Note(Note {
                name: name.into(),
                body: "b".into(),
            }),
            StdHashMap::new(),
        )
    }

    async fn logged_in_store() -> (InMemoryRemoteStore, SharedToken) {
        let token = SharedToken::new();
        let remote = InMemoryRemoteStore::new(token.clone());
        remote.register("alice", "pw", Duration::from_secs(1)).await.unwrap();
        let tok = remote.login("alice", "pw", Duration::from_secs(1)).await.unwrap();
        token.set(tok);
        (remote, token)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn uploads_new_local_row() {
        let (remote, _token) = logged_in_store().await;
        let local = Arc::new(LocalStore::new());
        let now = Utc::now();
        let id = local.create_item(LocalItem::new(note("n"), now));

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        let row = reconciler.local().get_item(&id).unwrap();
        assert_ne!(row.remote_id, 0);
        assert_eq!(reconciler.remote().list_items(Duration::from_secs(1)).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn downloads_new_remote_row() {
        let (remote, _token) = logged_in_store().await;
        remote
            .create_item(
                NewRemoteItem {
                    data: ::item::encode(&note("n")),
                    create_time: Utc::now(),
                    update_time: Utc::now(),
                },
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let local = Arc::new(LocalStore::new());
        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        let rows = reconciler.local().list_items();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].remote_id, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_newer_wins() {
        let (remote, _token) = logged_in_store().await;
        let t1 = Utc::now() - chrono::Duration::seconds(10);
        let remote_id = remote
            .create_item(
                NewRemoteItem {
                    data: ::item::encode(&note("old")),
                    create_time: t1,
                    update_time: t1,
                },
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let local = Arc::new(LocalStore::new());
        let t2 = Utc::now();
        let mut row = LocalItem::new(note("new"), t1);
        row.remote_id = remote_id;
        row.update_time = t2;
        let id = local.create_item(row);

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        let remote_row = reconciler.remote().get_item(remote_id, Duration::from_secs(1)).await.unwrap();
        let decoded = ::item::decode(&remote_row.data).unwrap();
        assert_eq!(decoded.display_name(), "new");
        assert_eq!(reconciler.local().get_item(&id).unwrap().update_time.timestamp_millis(), t2.timestamp_millis());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remote_newer_wins() {
        let (remote, _token) = logged_in_store().await;
        let t2 = Utc::now();
        let remote_id = remote
            .create_item(
                NewRemoteItem {
                    data: ::item::encode(&note("fresh")),
                    create_time: t2,
                    update_time: t2,
                },
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let local = Arc::new(LocalStore::new());
        let t1 = t2 - chrono::Duration::seconds(10);
        let mut row = LocalItem::new(note("stale"), t1);
        row.remote_id = remote_id;
        row.update_time = t1;
        let id = local.create_item(row);

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        let got = reconciler.local().get_item(&id).unwrap();
        assert_eq!(got.body.display_name(), "fresh");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tombstone_propagates_and_removes_both_rows() {
        let (remote, _token) = logged_in_store().await;
        let t_remote = Utc::now() - chrono::Duration::seconds(10);
        let remote_id = remote
            .create_item(
                NewRemoteItem {
                    data: ::item::encode(&note("n")),
                    create_time: t_remote,
                    update_time: t_remote,
                },
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let local = Arc::new(LocalStore::new());
        let mut row = LocalItem::new(note("n"), t_remote);
        row.remote_id = remote_id;
        row.update_time = Utc::now();
        row.delete_mark = true;
        let id = local.create_item(row);

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        assert!(reconciler.local().get_item(&id).is_err());
        assert!(reconciler.remote().get_item(remote_id, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn never_uploaded_delete_is_purged_without_any_rpc() {
        let (remote, _token) = logged_in_store().await;
        let local = Arc::new(LocalStore::new());
        let mut row = LocalItem::new(note("n"), Utc::now());
        row.delete_mark = true;
        let id = local.create_item(row);

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        assert!(reconciler.local().get_item(&id).is_err());
        assert!(reconciler.remote().list_items(Duration::from_secs(1)).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remote_deleted_row_is_removed_locally() {
        let (remote, _token) = logged_in_store().await;
        let local = Arc::new(LocalStore::new());
        let mut row = LocalItem::new(note("n"), Utc::now());
        row.remote_id = 999;
        row.update_time = Utc::now();
        let id = local.create_item(row);

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();

        assert!(reconciler.local().get_item(&id).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconcile_twice_with_no_edits_is_a_no_op() {
        let (remote, _token) = logged_in_store().await;
        let local = Arc::new(LocalStore::new());
        local.create_item(LocalItem::new(note("n"), Utc::now()));

        let reconciler = Reconciler::new(local, Arc::new(remote), Duration::from_secs(1));
        reconciler.reconcile().await.unwrap();
        let after_first = reconciler.local().list_items();

        reconciler.reconcile().await.unwrap();
        let after_second = reconciler.local().list_items();

        assert_eq!(after_first, after_second);
    }
}
