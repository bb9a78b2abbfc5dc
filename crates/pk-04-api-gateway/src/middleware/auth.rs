//! Bearer authentication middleware.
//!
//! Resolves the `Authorization` header through the [`AuthGuard`], rejects
//! callers outside the route group's role set, and hands the resolved
//! [`Caller`] to handlers as a request extension.

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::domain::error::ApiError;
use pickup_types::Role;
use pk_01_identity::{AuthGuard, Caller};

/// Authentication layer
#[derive(Clone)]
pub struct AuthLayer {
    guard: Arc<AuthGuard>,
    roles: Arc<[Role]>,
}

impl AuthLayer {
    /// Any authenticated role.
    pub fn new(guard: Arc<AuthGuard>) -> Self {
        Self {
            guard,
            roles: Arc::from(Vec::new()),
        }
    }

    /// Restrict to the given roles.
    pub fn require(guard: Arc<AuthGuard>, roles: &[Role]) -> Self {
        Self {
            guard,
            roles: Arc::from(roles.to_vec()),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            guard: Arc::clone(&self.guard),
            roles: Arc::clone(&self.roles),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    guard: Arc<AuthGuard>,
    roles: Arc<[Role]>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let guard = Arc::clone(&self.guard);
        let roles = Arc::clone(&self.roles);
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let caller = match guard.authenticate(authorization.as_deref()).await {
                Ok(caller) => caller,
                Err(e) => {
                    debug!(path = %req.uri().path(), error = %e, "Authentication failed");
                    return Ok(ApiError::from(e).into_response());
                }
            };

            if !roles.is_empty() {
                if let Err(e) = guard.require_role(&caller, &roles) {
                    warn!(
                        identity = %caller.id,
                        role = %caller.role,
                        path = %req.uri().path(),
                        "Role not permitted"
                    );
                    return Ok(ApiError::from(e).into_response());
                }
            }

            req.extensions_mut().insert::<Caller>(caller);
            inner.call(req).await
        })
    }
}
