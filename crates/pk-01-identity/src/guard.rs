//! Bearer credentials and access checks.
//!
//! `TokenIssuer` signs and verifies HS256 tokens; `AuthGuard` turns an
//! `Authorization` header into a `Caller` and enforces role and ownership
//! rules. Expiry is checked against the injected `TimeSource`, not the
//! library clock, so tests can move time.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::ports::IdentityStore;
use pickup_types::{CoreError, CoreResult, Identity, IdentityId, Party, Role, TimeSource};

/// Default token validity: seven days.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Signing key used when none is configured. Publicly known; never valid
/// in production.
pub const DEVELOPMENT_TOKEN_SECRET: &str = "development-only-secret-change-me";

/// Prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: DEVELOPMENT_TOKEN_SECRET.to_string(),
            issuer: "pickup".to_string(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// Signed token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub struct TokenIssuer {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: Arc<dyn TimeSource>,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig, clock: Arc<dyn TimeSource>) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn issue(&self, identity: &Identity) -> CoreResult<String> {
        let iat = self.clock.now().timestamp();
        let ttl = i64::try_from(self.config.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: identity.id.to_string(),
            role: identity.role(),
            iat,
            exp: iat.saturating_add(ttl),
            iss: self.config.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CoreError::Internal(format!("token signing failed: {}", e)))
    }

    /// Check signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> CoreResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            CoreError::Unauthenticated("Invalid token".to_string())
        })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(CoreError::Unauthenticated("Token has expired".to_string()));
        }
        Ok(data.claims)
    }
}

/// The authenticated party behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: IdentityId,
    pub role: Role,
}

impl Caller {
    pub fn party(&self) -> Party {
        Party::new(self.id, self.role)
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Resolves bearer credentials and enforces access rules.
pub struct AuthGuard {
    issuer: Arc<TokenIssuer>,
    store: Arc<dyn IdentityStore>,
}

impl AuthGuard {
    pub fn new(issuer: Arc<TokenIssuer>, store: Arc<dyn IdentityStore>) -> Self {
        Self { issuer, store }
    }

    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Authenticate an `Authorization` header value.
    ///
    /// # Errors
    /// - `Unauthenticated`: header absent, not `Bearer <token>`, or the token
    ///   fails verification
    /// - `IdentityNotFound`: the subject is no longer stored
    pub async fn authenticate(&self, authorization: Option<&str>) -> CoreResult<Caller> {
        let token = authorization
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CoreError::Unauthenticated("No token provided, authorization denied".to_string())
            })?;
        self.authenticate_token(token).await
    }

    pub async fn authenticate_token(&self, token: &str) -> CoreResult<Caller> {
        let claims = self.issuer.verify(token)?;
        let id = IdentityId::parse(&claims.sub)
            .map_err(|_| CoreError::Unauthenticated("Invalid token".to_string()))?;

        let identity = self
            .store
            .get(id)
            .await?
            .ok_or(CoreError::IdentityNotFound)?;

        if identity.role() != claims.role {
            return Err(CoreError::Unauthenticated("Invalid token".to_string()));
        }

        Ok(Caller {
            id,
            role: identity.role(),
        })
    }

    /// Fails `Forbidden` unless the caller's role is in `allowed`.
    pub fn require_role(&self, caller: &Caller, allowed: &[Role]) -> CoreResult<()> {
        if allowed.contains(&caller.role) {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "Access denied. {} role is not permitted",
                caller.role
            )))
        }
    }

    /// Fails `Forbidden` unless `resource_id` is the caller's own id.
    pub fn check_ownership(&self, caller: &Caller, resource_id: &str) -> CoreResult<()> {
        match IdentityId::parse(resource_id) {
            Ok(id) if id == caller.id => Ok(()),
            _ => Err(CoreError::forbidden(
                "Access denied. You can only access your own resources",
            )),
        }
    }
}
