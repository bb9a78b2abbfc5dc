//! Middleware stack for the gateway.
//!
//! Layer order: Request → Tracing → CORS → Redact → (per group) Auth → Handler

pub mod auth;
pub mod cors;
pub mod redact;
pub mod tracing;

pub use auth::AuthLayer;
pub use cors::create_cors_layer;
pub use redact::redact_internal_errors;
pub use tracing::TracingLayer;
