//! Adapters implementing the ledger's outbound ports.

pub mod memory;
pub mod relay;

pub use memory::InMemoryNotificationStore;
pub use relay::LoggingRelay;
