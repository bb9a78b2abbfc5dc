//! Ports for the notification ledger.

pub mod outbound;

pub use outbound::{Directory, NotificationPublisher, NotificationStore, OfflineRelay};
