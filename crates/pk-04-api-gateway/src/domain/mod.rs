//! Domain types for the gateway: configuration, errors and the response
//! envelope.

pub mod config;
pub mod error;
pub mod response;

pub use config::{
    AuthConfig, ConfigError, CorsConfig, Environment, GatewayConfig, HttpConfig, LimitsConfig,
    WebSocketConfig,
};
pub use error::{ApiError, ApiResult, GatewayError, InternalFailure, GENERIC_INTERNAL_MESSAGE};
pub use response::Envelope;
