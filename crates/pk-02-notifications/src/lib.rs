//! # Notification Ledger (pk-02)
//!
//! Append-only record of directed messages between Guardians and Educators,
//! plus the live-connection registry that pushes new entries to the
//! recipient in real time.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryNotificationStore, LoggingRelay            │
//! │  fanout.rs - ConnectionRegistry (implements NotificationPublisher)
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - NotificationStore, Directory,              │
//! │                      NotificationPublisher, OfflineRelay        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service.rs - NotificationLedger                                │
//! │  domain/    - drafts, queries, populated views, pages           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Send Path
//!
//! ```text
//! send(sender, recipient, draft)
//!   ├─ validate draft (title, message)
//!   ├─ resolve both parties through Directory (id + role)
//!   ├─ NotificationStore::insert          ← the committed fact
//!   └─ NotificationPublisher::publish     ← best effort, never rolls back
//! ```
//!
//! ## Access Rules
//!
//! | Operation | Allowed caller |
//! |-----------|----------------|
//! | `get`, `delete`, `delete_many` | sender or recipient |
//! | `mark_read`, `mark_many_read` | recipient only |
//! | `list_for_user` | rows where caller is sender or recipient |
//! | `list_inbox` | rows where caller is recipient under its role |
//!
//! Listings are newest first; equal timestamps fall back to reverse
//! insertion order.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod fanout;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryNotificationStore, LoggingRelay};
pub use domain::{
    FeedScope, ListFilter, NotificationDraft, NotificationPage, NotificationQuery,
    NotificationView, PageRequest, PartySummary, StudentSummary,
};
pub use fanout::{ConnectionId, ConnectionRegistry};
pub use ports::{Directory, NotificationPublisher, NotificationStore, OfflineRelay};
pub use service::{LedgerLimits, NotificationLedger};
