//! # Pickup Node
//!
//! Entry point for the pickup coordination backend.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, else `PICKUP_LOG_LEVEL`, else `info`)
//! 2. Load configuration: defaults, then the JSON file named by
//!    `PICKUP_CONFIG`, then environment overrides
//! 3. Validate configuration (production refuses weak secrets)
//! 4. Wire the in-memory services and bind the listener
//! 5. Serve until Ctrl+C, then shut down gracefully
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PICKUP_HTTP_HOST` | `http.host` |
//! | `PICKUP_HTTP_PORT`, `PORT` | `http.port` |
//! | `PICKUP_JWT_SECRET`, `SECRET` | `auth.jwt_secret` |
//! | `PICKUP_TOKEN_TTL` | `auth.token_ttl` (`"7d"`, `"12h"`, ...) |
//! | `PICKUP_ENV`, `NODE_ENV` | `environment` |

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pickup_types::SystemTimeSource;
use pk_04_api_gateway::domain::config::humantime_serde::parse_duration;
use pk_04_api_gateway::{ApiGatewayService, AppState, GatewayConfig};

/// First set variable among `names`.
fn first_of(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
}

/// Apply environment overrides on top of `config`.
fn apply_env_overrides(
    config: &mut GatewayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(host) = first_of(&lookup, &["PICKUP_HTTP_HOST"]) {
        config.http.host = host
            .trim()
            .parse()
            .with_context(|| format!("invalid PICKUP_HTTP_HOST: {}", host))?;
    }
    if let Some(port) = first_of(&lookup, &["PICKUP_HTTP_PORT", "PORT"]) {
        config.http.port = port
            .trim()
            .parse()
            .with_context(|| format!("invalid port: {}", port))?;
    }
    if let Some(secret) = first_of(&lookup, &["PICKUP_JWT_SECRET", "SECRET"]) {
        config.auth.jwt_secret = secret;
        info!("Loaded JWT secret from environment");
    }
    if let Some(ttl) = first_of(&lookup, &["PICKUP_TOKEN_TTL"]) {
        config.auth.token_ttl = parse_duration(&ttl)
            .map_err(|e| anyhow::anyhow!("invalid PICKUP_TOKEN_TTL {:?}: {}", ttl, e))?;
    }
    if let Some(env) = first_of(&lookup, &["PICKUP_ENV", "NODE_ENV"]) {
        config.environment = env.parse()?;
    }
    Ok(())
}

/// Load configuration from the optional JSON file and the environment.
fn load_config() -> Result<GatewayConfig> {
    let mut config = match std::env::var("PICKUP_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            let config: GatewayConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path))?;
            info!(path = %path, "Loaded configuration file");
            config
        }
        Err(_) => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    if config.auth.uses_development_secret() {
        warn!(
            environment = ?config.environment,
            "Using the built-in development JWT secret; set PICKUP_JWT_SECRET"
        );
    }
    Ok(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(std::env::var("PICKUP_LOG_LEVEL").unwrap_or_else(|_| "info".into()))
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = load_config()?;
    let state = AppState::in_memory(config, Arc::new(SystemTimeSource));
    let mut service = ApiGatewayService::new(state).context("invalid configuration")?;

    let listener = service.bind().await?;
    let shutdown = service
        .shutdown_handle()
        .context("shutdown handle already taken")?;
    let server = tokio::spawn(async move { service.serve(listener).await });

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Initiating graceful shutdown...");
    let _ = shutdown.send(());
    server.await.context("server task panicked")??;

    info!("Shutdown complete");
    Ok(())
}
