//! Offline relay that only records the miss.

use tracing::debug;

use crate::domain::NotificationView;
use crate::ports::OfflineRelay;
use pickup_types::IdentityId;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRelay;

impl OfflineRelay for LoggingRelay {
    fn relay(&self, recipient: IdentityId, view: &NotificationView) {
        debug!(
            recipient = %recipient,
            notification_id = %view.id,
            kind = ?view.kind,
            "Recipient offline; notification kept in ledger only"
        );
    }
}
