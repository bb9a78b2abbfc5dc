//! PK-04 API Gateway - HTTP and WebSocket surface of the pickup service.
//!
//! Every client action enters here: account signup and login, guardian and
//! educator profile management, student roster edits, the release flow, and
//! the notification inbox. New notifications are pushed over the WebSocket
//! channel as they are committed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API GATEWAY (pk-04)                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐        ┌──────────────────────────┐       │
//! │  │   REST  /api/*           │        │   WebSocket  /ws         │       │
//! │  │   Port 5000              │        │   join / leave frames    │       │
//! │  └────────────┬─────────────┘        └────────────┬─────────────┘       │
//! │               │                                   │                     │
//! │  ┌────────────┴───────────────────────────────────┴─────────────┐       │
//! │  │                     Middleware Stack                         │       │
//! │  │  Tracing → CORS → Body limit → Redact → Auth (per group)     │       │
//! │  └────────────────────────────┬─────────────────────────────────┘       │
//! │                               │                                         │
//! │  ┌────────────────────────────┴─────────────────────────────────┐       │
//! │  │  AppState: AccountService, RosterService, AuthGuard,         │       │
//! │  │            ConnectionRegistry                                │       │
//! │  └────────────────────────────┬─────────────────────────────────┘       │
//! └───────────────────────────────┼─────────────────────────────────────────┘
//!                                 │
//!     ┌───────────────────────────┼───────────────────────────┐
//!     ▼                           ▼                           ▼
//! pk-01-identity           pk-03-roster               pk-02-notifications
//! ```
//!
//! # Route Groups
//!
//! | Prefix | Caller |
//! |--------|--------|
//! | `/api/auth` | public, except `GET /me` |
//! | `/api/parents` | Guardian |
//! | `/api/teachers` | Educator |
//! | `/api/notifications` | any authenticated identity |
//! | `/api/users` | any authenticated identity |
//!
//! Every JSON reply is wrapped in an [`Envelope`]: `{"success": true, ...}`
//! on success, `{"success": false, "message": ...}` on failure. In
//! production the message of a 5xx reply is replaced by a generic one.
//!
//! # Usage
//!
//! ```ignore
//! use pk_04_api_gateway::{ApiGatewayService, AppState, GatewayConfig};
//! use pickup_types::SystemTimeSource;
//!
//! let state = AppState::in_memory(GatewayConfig::default(), Arc::new(SystemTimeSource));
//! let mut service = ApiGatewayService::new(state)?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod ws;

pub use domain::{
    ApiError, ApiResult, ConfigError, Envelope, Environment, GatewayConfig, GatewayError,
};
pub use middleware::{create_cors_layer, redact_internal_errors, AuthLayer, TracingLayer};
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;
pub use ws::{ClientFrame, ServerFrame, WebSocketSession};
