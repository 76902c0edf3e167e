//! Configuration for the session coordinator server.
//!
//! For now this is intentionally simple: you can either use defaults
//! or override via a few environment variables:
//!
//! - `COORD_BIND_ADDR`       (default: "0.0.0.0")
//! - `COORD_PORT`            (default: "9090")
//! - `COORD_MAX_CLIENTS`     (default: "1024")
//! - `COORD_STORE_TIMEOUT_MS`(default: "2000")
//! - `COORD_AUTH_TIMEOUT_MS` (default: "5000")
//! - `COORD_AUTH_TOKENS`     (default: "", `token=userId,...`)
//! - `COORD_SEED_MATCH`      (default: unset, `playerXId,playerOId`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected sessions.
    pub max_clients: usize,

    /// Deadline for any single durable-store call. A move whose append
    /// misses this deadline is not applied in memory.
    pub store_timeout: Duration,

    /// How long a fresh connection gets to complete the auth handshake.
    pub auth_timeout: Duration,

    /// Pre-shared token spec for the static verifier.
    pub auth_tokens: String,

    /// Optionally create one match at startup (standalone play).
    pub seed_match: Option<(u64, u64)>,
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to reasonable defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("COORD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = read_env_or_default("COORD_PORT", 9090u16)?;
        let max_clients = read_env_or_default("COORD_MAX_CLIENTS", 1024usize)?;
        let store_timeout_ms = read_env_or_default("COORD_STORE_TIMEOUT_MS", 2000u64)?;
        let auth_timeout_ms = read_env_or_default("COORD_AUTH_TIMEOUT_MS", 5000u64)?;
        let auth_tokens = env::var("COORD_AUTH_TOKENS").unwrap_or_default();

        let seed_match = match env::var("COORD_SEED_MATCH") {
            Ok(spec) => Some(parse_seed_match(&spec)?),
            Err(_) => None,
        };

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            store_timeout: Duration::from_millis(store_timeout_ms),
            auth_timeout: Duration::from_millis(auth_timeout_ms),
            auth_tokens,
            seed_match,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_seed_match(spec: &str) -> anyhow::Result<(u64, u64)> {
    let (x, o) = spec
        .split_once(',')
        .context("COORD_SEED_MATCH wants `playerXId,playerOId`")?;
    Ok((x.trim().parse()?, o.trim().parse()?))
}

fn read_env_or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().with_context(|| format!("parsing {key}")),
        Err(_) => Ok(default),
    }
}
