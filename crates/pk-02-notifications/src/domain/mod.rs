//! Ledger inputs, queries and populated views.

use serde::{Deserialize, Serialize};

use pickup_types::{
    CoreError, CoreResult, IdentityId, Notification, NotificationId, NotificationType, Party,
    Priority, Role, StudentId, Timestamp,
};

/// Default page size when the caller supplies none.
pub const DEFAULT_PAGE_LIMIT: usize = 50;
/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: usize = 200;
/// Largest id list accepted by batch operations.
pub const MAX_BATCH_SIZE: usize = 500;

/// Caller-supplied notification content.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub related_student: Option<StudentId>,
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: NotificationType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn about(mut self, student: StudentId) -> Self {
        self.related_student = Some(student);
        self
    }

    pub fn kind_or_default(&self) -> NotificationType {
        self.kind.unwrap_or_default()
    }

    /// Title and message must both be non-blank.
    pub(crate) fn validate(&self) -> CoreResult<Content> {
        let title = self.title.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match (title, message) {
            (Some(title), Some(message)) => Ok(Content {
                title: title.to_string(),
                message: message.to_string(),
                kind: self.kind.unwrap_or_default(),
                priority: self.priority.unwrap_or_default(),
                related_student: self.related_student,
            }),
            (t, m) => {
                let mut missing = Vec::new();
                if t.is_none() {
                    missing.push("title");
                }
                if m.is_none() {
                    missing.push("message");
                }
                Err(CoreError::missing_fields(missing))
            }
        }
    }
}

/// Validated draft.
#[derive(Debug, Clone)]
pub(crate) struct Content {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub priority: Priority,
    pub related_student: Option<StudentId>,
}

/// Which side of a notification a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Caller is sender or recipient.
    Involving,
    /// Caller is recipient and resolves as the given role.
    Inbox(Role),
}

/// Store-level predicate.
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub party: IdentityId,
    pub scope: FeedScope,
    pub kind: Option<NotificationType>,
    pub is_read: Option<bool>,
    pub related_student: Option<StudentId>,
    /// Inclusive lower bound on creation time.
    pub created_since: Option<Timestamp>,
}

impl NotificationQuery {
    pub fn involving(party: IdentityId) -> Self {
        Self {
            party,
            scope: FeedScope::Involving,
            kind: None,
            is_read: None,
            related_student: None,
            created_since: None,
        }
    }

    pub fn inbox(party: Party) -> Self {
        Self {
            scope: FeedScope::Inbox(party.role),
            ..Self::involving(party.id)
        }
    }

    pub fn matches(&self, n: &Notification) -> bool {
        let side = match self.scope {
            FeedScope::Involving => n.involves(self.party),
            FeedScope::Inbox(role) => n.recipient == self.party && n.recipient_role == role,
        };
        side && self.kind.map_or(true, |k| n.kind == k)
            && self.is_read.map_or(true, |r| n.is_read == r)
            && self
                .related_student
                .map_or(true, |s| n.related_student == Some(s))
            && self.created_since.map_or(true, |t| n.created_at >= t)
    }
}

/// Caller-facing listing filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    pub kind: Option<NotificationType>,
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl PageRequest {
    pub fn new(limit: usize, skip: usize) -> Self {
        Self {
            limit: Some(limit),
            skip: Some(skip),
        }
    }
}

/// Display fields of a notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: IdentityId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

impl PartySummary {
    /// Reference whose record could not be resolved.
    pub fn bare(party: Party) -> Self {
        Self {
            id: party.id,
            role: party.role,
            full_name: String::new(),
            email: String::new(),
        }
    }

    pub fn party(&self) -> Party {
        Party::new(self.id, self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: StudentId,
    pub full_name: String,
}

/// A notification with its references resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: NotificationId,
    pub sender: PartySummary,
    #[serde(rename = "senderModel")]
    pub sender_role: Role,
    pub recipient: PartySummary,
    #[serde(rename = "recipientModel")]
    pub recipient_role: Role,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_student: Option<StudentSummary>,
    pub created_at: Timestamp,
}

impl NotificationView {
    pub fn new(
        n: Notification,
        sender: PartySummary,
        recipient: PartySummary,
        related_student: Option<StudentSummary>,
    ) -> Self {
        Self {
            id: n.id,
            sender,
            sender_role: n.sender_role,
            recipient,
            recipient_role: n.recipient_role,
            title: n.title,
            message: n.message,
            kind: n.kind,
            priority: n.priority,
            is_read: n.is_read,
            read_at: n.read_at,
            related_student,
            created_at: n.created_at,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub items: Vec<NotificationView>,
    /// Matches before pagination.
    pub total: usize,
    /// Unread entries addressed to the caller; only for inbox listings.
    pub unread: Option<usize>,
}
