//! Environment-driven configuration.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8090";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub engine: EngineConfig,
}

/// Delegation settings for the pricing facade.
///
/// When `remote_url` is set, calculations are delegated to that pricing
/// engine instance and served locally only when it is unreachable.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub remote_url: Option<String>,
    pub remote_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        let remote_url = env::var("PRICING_ENGINE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let remote_timeout = match env::var("PRICING_ENGINE_TIMEOUT_MS") {
            Ok(value) => Duration::from_millis(
                value
                    .parse()
                    .context("PRICING_ENGINE_TIMEOUT_MS is not a number")?,
            ),
            Err(_) => Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        };

        Ok(Self {
            database_url,
            bind_addr,
            engine: EngineConfig {
                remote_url,
                remote_timeout,
            },
        })
    }
}
