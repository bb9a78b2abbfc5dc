//! In-memory notification store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::NotificationQuery;
use crate::ports::NotificationStore;
use pickup_types::{
    CoreError, CoreResult, IdentityId, Notification, NotificationId, Timestamp,
};

struct Entry {
    /// Insertion sequence; breaks creation-time ties.
    seq: u64,
    notification: Notification,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<NotificationId, Entry>,
    next_seq: u64,
}

impl Inner {
    fn sorted_matches(&self, query: &NotificationQuery) -> Vec<&Entry> {
        let mut hits: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| query.matches(&e.notification))
            .collect();
        hits.sort_by_key(|e| Reverse((e.notification.created_at, e.seq)));
        hits
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    inner: RwLock<Inner>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> CoreResult<Notification> {
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&notification.id) {
            return Err(CoreError::conflict("notification id already exists"));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            notification.id,
            Entry {
                seq,
                notification: notification.clone(),
            },
        );
        Ok(notification)
    }

    async fn get(&self, id: NotificationId) -> CoreResult<Option<Notification>> {
        Ok(self
            .inner
            .read()
            .entries
            .get(&id)
            .map(|e| e.notification.clone()))
    }

    async fn query(
        &self,
        query: &NotificationQuery,
        skip: usize,
        limit: usize,
    ) -> CoreResult<(Vec<Notification>, usize)> {
        let inner = self.inner.read();
        let hits = inner.sorted_matches(query);
        let total = hits.len();
        let page = hits
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|e| e.notification.clone())
            .collect();
        Ok((page, total))
    }

    async fn count(&self, query: &NotificationQuery) -> CoreResult<usize> {
        Ok(self
            .inner
            .read()
            .entries
            .values()
            .filter(|e| query.matches(&e.notification))
            .count())
    }

    async fn exists(&self, query: &NotificationQuery) -> CoreResult<bool> {
        Ok(self
            .inner
            .read()
            .entries
            .values()
            .any(|e| query.matches(&e.notification)))
    }

    async fn mark_read(
        &self,
        ids: &[NotificationId],
        recipient: IdentityId,
        at: Timestamp,
    ) -> CoreResult<usize> {
        let mut inner = self.inner.write();
        let mut matched = 0;
        for id in dedup(ids) {
            if let Some(entry) = inner.entries.get_mut(&id) {
                if entry.notification.is_recipient(recipient) {
                    entry.notification.mark_read(at);
                    matched += 1;
                }
            }
        }
        Ok(matched)
    }

    async fn delete(&self, ids: &[NotificationId], party: IdentityId) -> CoreResult<usize> {
        let mut inner = self.inner.write();
        let mut removed = 0;
        for id in dedup(ids) {
            let owned = inner
                .entries
                .get(&id)
                .map(|e| e.notification.involves(party))
                .unwrap_or(false);
            if owned && inner.entries.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn dedup(ids: &[NotificationId]) -> Vec<NotificationId> {
    let mut out = ids.to_vec();
    out.sort();
    out.dedup();
    out
}
