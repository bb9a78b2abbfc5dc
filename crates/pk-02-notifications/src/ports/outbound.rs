//! Outbound (Driven) ports for the notification ledger.

use async_trait::async_trait;

use crate::domain::{NotificationQuery, NotificationView, PartySummary, StudentSummary};
use pickup_types::{
    CoreResult, IdentityId, Notification, NotificationId, Party, StudentId, Timestamp,
};

/// Persistent notification records.
///
/// Listings are ordered by creation time descending; entries with equal
/// timestamps come back in reverse insertion order.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> CoreResult<Notification>;

    async fn get(&self, id: NotificationId) -> CoreResult<Option<Notification>>;

    /// One page of matches plus the total match count.
    async fn query(
        &self,
        query: &NotificationQuery,
        skip: usize,
        limit: usize,
    ) -> CoreResult<(Vec<Notification>, usize)>;

    async fn count(&self, query: &NotificationQuery) -> CoreResult<usize>;

    async fn exists(&self, query: &NotificationQuery) -> CoreResult<bool>;

    /// Mark every listed entry addressed to `recipient` as read at `at`.
    /// Entries already read keep their first `read_at`. Returns how many
    /// listed entries belong to `recipient`.
    async fn mark_read(
        &self,
        ids: &[NotificationId],
        recipient: IdentityId,
        at: Timestamp,
    ) -> CoreResult<usize>;

    /// Delete every listed entry that `party` sent or received. Returns the
    /// number removed.
    async fn delete(&self, ids: &[NotificationId], party: IdentityId) -> CoreResult<usize>;
}

/// Resolves notification endpoints and related students for display.
#[async_trait]
pub trait Directory: Send + Sync {
    /// `None` unless an identity with this id exists and holds this role.
    async fn party(&self, party: Party) -> CoreResult<Option<PartySummary>>;

    async fn student(&self, id: StudentId) -> CoreResult<Option<StudentSummary>>;
}

/// Pushes freshly written notifications to live listeners.
pub trait NotificationPublisher: Send + Sync {
    /// Returns the number of live connections reached.
    fn publish(&self, recipient: IdentityId, view: &NotificationView) -> CoreResult<usize>;
}

/// Out-of-band delivery for recipients without a live connection.
pub trait OfflineRelay: Send + Sync {
    fn relay(&self, recipient: IdentityId, view: &NotificationView);
}
