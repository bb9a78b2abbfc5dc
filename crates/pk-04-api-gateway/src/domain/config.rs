//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub use pk_01_identity::DEVELOPMENT_TOKEN_SECRET;

/// Minimum JWT secret length accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub websocket: WebSocketConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
    pub cors: CorsConfig,
    pub environment: Environment,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit("max_body_bytes cannot be 0".into()));
        }
        if self.limits.default_page_limit == 0 || self.limits.max_page_limit == 0 {
            return Err(ConfigError::InvalidLimit("page limits cannot be 0".into()));
        }
        if self.limits.default_page_limit > self.limits.max_page_limit {
            return Err(ConfigError::InvalidLimit(
                "default_page_limit exceeds max_page_limit".into(),
            ));
        }
        if self.limits.max_batch_size == 0 {
            return Err(ConfigError::InvalidLimit("max_batch_size cannot be 0".into()));
        }

        if self.websocket.enabled && !self.websocket.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "websocket path must start with '/': {}",
                self.websocket.path
            )));
        }
        if self.websocket.buffer_size == 0 {
            return Err(ConfigError::InvalidLimit("websocket buffer_size cannot be 0".into()));
        }
        if self.websocket.ping_interval.is_zero() {
            return Err(ConfigError::Invalid("websocket ping_interval cannot be 0".into()));
        }

        if self.cors.enabled
            && self.cors.allow_credentials
            && self.cors.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(ConfigError::Invalid(
                "cors credentials cannot be combined with a wildcard origin".into(),
            ));
        }

        if self.auth.token_ttl.as_secs() == 0 {
            return Err(ConfigError::Invalid("token_ttl cannot be 0".into()));
        }
        if self.auth.hash_iterations == 0 {
            return Err(ConfigError::Invalid("hash_iterations cannot be 0".into()));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::WeakSecret("jwt_secret is empty".into()));
        }
        if self.environment.is_production() && self.auth.uses_development_secret() {
            return Err(ConfigError::WeakSecret(
                "the built-in development jwt_secret cannot be used in production".into(),
            ));
        }
        if self.environment.is_production()
            && self.auth.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN
        {
            return Err(ConfigError::WeakSecret(format!(
                "jwt_secret must be at least {} bytes in production",
                MIN_PRODUCTION_SECRET_LEN
            )));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Deployment mode. Production hides internal error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::Invalid(format!("unknown environment: {}", other))),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    /// Port (default: 5000)
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Real-time channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    pub enabled: bool,
    /// Route the upgrade is served on
    pub path: String,
    /// Outbound events buffered per connection
    pub buffer_size: usize,
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    /// A join must carry a token whose subject is the joined identity
    pub require_token: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/ws".to_string(),
            buffer_size: 64,
            ping_interval: Duration::from_secs(30),
            require_token: true,
        }
    }
}

/// Credential configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
    /// PBKDF2 rounds for new password hashes
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_TOKEN_SECRET.to_string(),
            issuer: "pickup".to_string(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            hash_iterations: 100_000,
        }
    }
}

impl AuthConfig {
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_TOKEN_SECRET
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_ttl", &self.token_ttl)
            .field("hash_iterations", &self.hash_iterations)
            .finish()
    }
}

/// Listing and batch limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    /// Max ids (or recipients) per batch request
    pub max_batch_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 50,
            max_page_limit: 200,
            max_batch_size: 500,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache, seconds
    pub max_age: u64,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age: 86400,
            allow_credentials: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("http port cannot be 0")]
    InvalidPort,
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("weak secret: {0}")]
    WeakSecret(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Human-readable `Duration` (de)serialization: `"500ms"`, `"30s"`, `"5m"`,
/// `"2h"`, `"7d"`, or a bare number of seconds.
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        let number = |n: &str| n.trim().parse::<u64>().map_err(|_| "invalid duration number");

        if let Some(ms) = s.strip_suffix("ms") {
            number(ms).map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            number(secs).map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            number(mins).map(|m| Duration::from_secs(m * 60))
        } else if let Some(hours) = s.strip_suffix('h') {
            number(hours).map(|h| Duration::from_secs(h * 3600))
        } else if let Some(days) = s.strip_suffix('d') {
            number(days).map(|d| Duration::from_secs(d * 86_400))
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
