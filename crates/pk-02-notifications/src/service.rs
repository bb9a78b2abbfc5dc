//! Notification ledger service.
//!
//! Every send is two explicit steps: the ledger write, then the fan-out
//! push. A failed push is logged and never undoes the write; the record
//! stays queryable for the recipient's next listing.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    Content, ListFilter, NotificationDraft, NotificationPage, NotificationQuery, NotificationView,
    PageRequest, PartySummary, StudentSummary, DEFAULT_PAGE_LIMIT, MAX_BATCH_SIZE, MAX_PAGE_LIMIT,
};
use crate::ports::{Directory, NotificationPublisher, NotificationStore};
use pickup_types::{
    CoreError, CoreResult, IdentityId, Notification, NotificationId, NotificationType, Party,
    Role, StudentId, TimeSource, Timestamp,
};

#[derive(Debug, Clone, Copy)]
pub struct LedgerLimits {
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    pub max_batch_size: usize,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

pub struct NotificationLedger {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn Directory>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn TimeSource>,
    limits: LedgerLimits,
}

impl NotificationLedger {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        directory: Arc<dyn Directory>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            directory,
            publisher,
            clock,
            limits: LedgerLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: LedgerLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> LedgerLimits {
        self.limits
    }

    /// Create one notification and push it to the recipient.
    ///
    /// # Errors
    /// - `Validation`: blank title or message, or a role that cannot take
    ///   part in messaging
    /// - `NotFound`: sender or recipient does not resolve under its role
    pub async fn send(
        &self,
        sender: Party,
        recipient: Party,
        draft: NotificationDraft,
    ) -> CoreResult<NotificationView> {
        let content = draft.validate()?;
        let sender = self.resolve_party(sender).await?;
        let recipient = self.resolve_party(recipient).await?;
        self.create(sender, recipient, &content).await
    }

    /// Send the same content to several recipients. Recipients that do not
    /// resolve under their role are skipped.
    pub async fn send_many(
        &self,
        sender: Party,
        recipients: &[Party],
        draft: NotificationDraft,
    ) -> CoreResult<Vec<NotificationView>> {
        if recipients.is_empty() {
            return Err(CoreError::invalid("recipients", "Recipient IDs array is required"));
        }
        self.check_batch(recipients.len())?;
        let content = draft.validate()?;
        let sender = self.resolve_party(sender).await?;

        let mut created = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if !recipient.role.is_notification_party() {
                continue;
            }
            let Some(summary) = self.directory.party(*recipient).await? else {
                debug!(recipient = %recipient.id, "Skipping unresolvable recipient");
                continue;
            };
            created.push(self.create(sender.clone(), summary, &content).await?);
        }

        info!(
            sender = %sender.id,
            requested = recipients.len(),
            created = created.len(),
            "Multi-recipient send"
        );
        Ok(created)
    }

    async fn resolve_party(&self, party: Party) -> CoreResult<PartySummary> {
        if !party.role.is_notification_party() {
            return Err(CoreError::invalid(
                "role",
                format!("{} cannot send or receive notifications", party.role),
            ));
        }
        self.directory
            .party(party)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("{} not found", party.role)))
    }

    async fn create(
        &self,
        sender: PartySummary,
        recipient: PartySummary,
        content: &Content,
    ) -> CoreResult<NotificationView> {
        let notification = Notification {
            id: NotificationId::new(),
            sender: sender.id,
            sender_role: sender.role,
            recipient: recipient.id,
            recipient_role: recipient.role,
            title: content.title.clone(),
            message: content.message.clone(),
            kind: content.kind,
            priority: content.priority,
            is_read: false,
            read_at: None,
            related_student: content.related_student,
            created_at: self.clock.now(),
        };
        let notification = self.store.insert(notification).await?;
        debug!(
            notification_id = %notification.id,
            sender = %notification.sender,
            recipient = %notification.recipient,
            kind = ?notification.kind,
            "Notification stored"
        );

        let student = self.student_summary(notification.related_student).await;
        let view = NotificationView::new(notification, sender, recipient, student);
        self.publish(&view);
        Ok(view)
    }

    fn publish(&self, view: &NotificationView) {
        match self.publisher.publish(view.recipient.id, view) {
            Ok(reached) => debug!(notification_id = %view.id, reached, "Fan-out complete"),
            Err(e) => warn!(
                notification_id = %view.id,
                error = %e,
                "Fan-out failed; notification remains in ledger"
            ),
        }
    }

    async fn student_summary(&self, id: Option<StudentId>) -> Option<StudentSummary> {
        let id = id?;
        match self.directory.student(id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(student_id = %id, error = %e, "Could not resolve related student");
                None
            }
        }
    }

    async fn populate(&self, n: Notification) -> NotificationView {
        let sender = self.summary_or_bare(n.sender_party()).await;
        let recipient = self.summary_or_bare(n.recipient_party()).await;
        let student = self.student_summary(n.related_student).await;
        NotificationView::new(n, sender, recipient, student)
    }

    async fn summary_or_bare(&self, party: Party) -> PartySummary {
        match self.directory.party(party).await {
            Ok(Some(summary)) => summary,
            Ok(None) => PartySummary::bare(party),
            Err(e) => {
                warn!(identity = %party.id, error = %e, "Could not resolve party");
                PartySummary::bare(party)
            }
        }
    }

    /// Notifications the caller sent or received, newest first.
    pub async fn list_for_user(
        &self,
        caller: IdentityId,
        filter: ListFilter,
        page: PageRequest,
    ) -> CoreResult<NotificationPage> {
        let mut query = NotificationQuery::involving(caller);
        query.kind = filter.kind;
        query.is_read = filter.is_read;
        self.list(query, page, None).await
    }

    /// Notifications addressed to `caller` under its role, with the unread
    /// count for that inbox.
    pub async fn list_inbox(
        &self,
        caller: Party,
        filter: ListFilter,
        page: PageRequest,
    ) -> CoreResult<NotificationPage> {
        let mut query = NotificationQuery::inbox(caller);
        query.kind = filter.kind;
        query.is_read = filter.is_read;

        let mut unread_query = NotificationQuery::inbox(caller);
        unread_query.kind = filter.kind;
        unread_query.is_read = Some(false);
        let unread = self.store.count(&unread_query).await?;

        self.list(query, page, Some(unread)).await
    }

    async fn list(
        &self,
        query: NotificationQuery,
        page: PageRequest,
        unread: Option<usize>,
    ) -> CoreResult<NotificationPage> {
        let limit = match page.limit {
            Some(0) | None => self.limits.default_page_limit,
            Some(n) => n.min(self.limits.max_page_limit),
        };
        let skip = page.skip.unwrap_or(0);

        let (rows, total) = self.store.query(&query, skip, limit).await?;
        let mut items = Vec::with_capacity(rows.len());
        for n in rows {
            items.push(self.populate(n).await);
        }
        Ok(NotificationPage {
            items,
            total,
            unread,
        })
    }

    async fn load(&self, id: NotificationId) -> CoreResult<Notification> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Notification not found"))
    }

    /// # Errors
    /// - `NotFound`: no such notification
    /// - `Forbidden`: caller is neither sender nor recipient
    pub async fn get(&self, id: NotificationId, caller: IdentityId) -> CoreResult<NotificationView> {
        let n = self.load(id).await?;
        if !n.involves(caller) {
            return Err(CoreError::forbidden(
                "Access denied. You can only access your own notifications.",
            ));
        }
        Ok(self.populate(n).await)
    }

    /// Idempotent; the first `readAt` is kept.
    ///
    /// # Errors
    /// - `NotFound`: no such notification
    /// - `Forbidden`: caller is not the recipient
    pub async fn mark_read(
        &self,
        id: NotificationId,
        caller: IdentityId,
    ) -> CoreResult<NotificationView> {
        let n = self.load(id).await?;
        if !n.is_recipient(caller) {
            return Err(CoreError::forbidden(
                "Access denied. You can only mark your own notifications as read.",
            ));
        }
        self.store.mark_read(&[id], caller, self.clock.now()).await?;
        let n = self.load(id).await?;
        Ok(self.populate(n).await)
    }

    /// Mark the listed notifications addressed to the caller as read;
    /// every other id is skipped. Returns how many the caller owned.
    pub async fn mark_many_read(
        &self,
        ids: &[NotificationId],
        caller: IdentityId,
    ) -> CoreResult<usize> {
        self.check_batch(ids.len())?;
        let count = self.store.mark_read(ids, caller, self.clock.now()).await?;
        debug!(caller = %caller, requested = ids.len(), count, "Marked notifications read");
        Ok(count)
    }

    /// # Errors
    /// - `NotFound`: no such notification
    /// - `Forbidden`: caller is neither sender nor recipient
    pub async fn delete(&self, id: NotificationId, caller: IdentityId) -> CoreResult<()> {
        let n = self.load(id).await?;
        if !n.involves(caller) {
            return Err(CoreError::forbidden(
                "Access denied. You can only delete your own notifications.",
            ));
        }
        self.store.delete(&[id], caller).await?;
        Ok(())
    }

    /// Delete the listed notifications the caller sent or received.
    pub async fn delete_many(&self, ids: &[NotificationId], caller: IdentityId) -> CoreResult<usize> {
        self.check_batch(ids.len())?;
        self.store.delete(ids, caller).await
    }

    /// True when a `school_reached` notification about `student` reached
    /// `educator` (as Educator) at or after `since`.
    pub async fn school_reached_since(
        &self,
        educator: IdentityId,
        student: StudentId,
        since: Timestamp,
    ) -> CoreResult<bool> {
        let mut query = NotificationQuery::inbox(Party::new(educator, Role::Educator));
        query.kind = Some(NotificationType::SchoolReached);
        query.related_student = Some(student);
        query.created_since = Some(since);
        self.store.exists(&query).await
    }

    fn check_batch(&self, len: usize) -> CoreResult<()> {
        if len > self.limits.max_batch_size {
            return Err(CoreError::invalid(
                "notificationIds",
                format!("At most {} ids per request", self.limits.max_batch_size),
            ));
        }
        Ok(())
    }
}
