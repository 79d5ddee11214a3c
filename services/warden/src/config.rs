use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

// Service configuration sourced from WARDEN_* environment variables, with an
// optional YAML override file pointed at by WARDEN_CONFIG.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub token: TokenConfig,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    8
}

fn default_acquire_timeout_ms() -> u64 {
    3_000
}

/// Bearer-token verification settings. Exactly one key source is required:
/// the identity provider's JWKS endpoint or a fixed Ed25519 public key PEM.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub leeway_secs: u64,
    pub jwks_url: Option<String>,
    pub jwks_refresh_secs: u64,
    pub public_key_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WardenConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    cache_ttl_secs: Option<u64>,
    postgres: Option<PostgresConfig>,
    token: Option<TokenConfigOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenConfigOverride {
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: Option<u64>,
    jwks_url: Option<String>,
    jwks_refresh_secs: Option<u64>,
    public_key_path: Option<String>,
}

impl WardenConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("WARDEN_BIND", "0.0.0.0:8443")
            .parse()
            .with_context(|| "parse WARDEN_BIND")?;
        let metrics_bind = env_or("WARDEN_METRICS_BIND", "0.0.0.0:9102")
            .parse()
            .with_context(|| "parse WARDEN_METRICS_BIND")?;
        let storage = parse_backend(&env_or("WARDEN_STORAGE", "memory"))?;
        let postgres = match std::env::var("WARDEN_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parsed("WARDEN_PG_MAX_CONNECTIONS", default_max_connections())?,
                acquire_timeout_ms: env_parsed(
                    "WARDEN_PG_ACQUIRE_TIMEOUT_MS",
                    default_acquire_timeout_ms(),
                )?,
            }),
            Err(_) => None,
        };
        let cache_ttl = Duration::from_secs(env_parsed("WARDEN_CACHE_TTL_SECS", 600)?);
        let token = TokenConfig {
            issuer: env_or("WARDEN_TOKEN_ISSUER", "https://idp.local"),
            audience: env_or("WARDEN_TOKEN_AUDIENCE", "warden"),
            leeway_secs: env_parsed("WARDEN_TOKEN_LEEWAY_SECS", 60)?,
            jwks_url: std::env::var("WARDEN_JWKS_URL").ok(),
            jwks_refresh_secs: env_parsed("WARDEN_JWKS_REFRESH_SECS", 3_600)?,
            public_key_path: std::env::var("WARDEN_TOKEN_PUBLIC_KEY").ok(),
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            token,
            cache_ttl,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            let override_cfg: WardenConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse warden config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.storage {
                config.storage = parse_backend(&value)?;
            }
            if let Some(value) = override_cfg.cache_ttl_secs {
                config.cache_ttl = Duration::from_secs(value);
            }
            if let Some(value) = override_cfg.postgres {
                config.postgres = Some(value);
            }
            if let Some(token) = override_cfg.token {
                if let Some(value) = token.issuer {
                    config.token.issuer = value;
                }
                if let Some(value) = token.audience {
                    config.token.audience = value;
                }
                if let Some(value) = token.leeway_secs {
                    config.token.leeway_secs = value;
                }
                if let Some(value) = token.jwks_url {
                    config.token.jwks_url = Some(value);
                }
                if let Some(value) = token.jwks_refresh_secs {
                    config.token.jwks_refresh_secs = value;
                }
                if let Some(value) = token.public_key_path {
                    config.token.public_key_path = Some(value);
                }
            }
        }
        Ok(config)
    }
}

fn parse_backend(value: &str) -> Result<StorageBackend> {
    match value.to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "postgres" => Ok(StorageBackend::Postgres),
        other => bail!("unknown storage backend: {other}"),
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value.parse().with_context(|| format!("parse {name}")),
        Err(_) => Ok(default),
    }
}
