//! Real-time notification channel.

pub mod handler;

pub use handler::{ws_upgrade, ClientFrame, ServerFrame, WebSocketSession};
