//! Verification-key fetching from the identity provider's JWKS endpoint.
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use warden_authz::{jwks_to_keys, AuthzError, AuthzResult, Jwks, KeyStore, VerificationKey};

struct CachedKeys {
    keys: Vec<VerificationKey>,
    expires_at: Instant,
}

/// Key store that fetches the provider's JWKS document over HTTP and caches
/// the converted keys with a TTL. A fetch failure surfaces as `Unavailable`,
/// never as a denial.
pub struct RemoteJwksKeyStore {
    url: String,
    client: reqwest::Client,
    ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl RemoteJwksKeyStore {
    pub fn new(url: String, ttl: Duration) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Seed the cache without a fetch; used at startup and by tests.
    pub async fn prime(&self, jwks: &Jwks) -> AuthzResult<()> {
        let keys = jwks_to_keys(jwks)?;
        *self.cached.write().await = Some(CachedKeys {
            keys,
            expires_at: Instant::now() + self.ttl,
        });
        Ok(())
    }

    async fn refresh(&self) -> AuthzResult<Vec<VerificationKey>> {
        let jwks: Jwks = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthzError::Unavailable(format!("fetch jwks: {err}")))?
            .json()
            .await
            .map_err(|err| AuthzError::Unavailable(format!("decode jwks: {err}")))?;
        let keys = jwks_to_keys(&jwks)?;
        *self.cached.write().await = Some(CachedKeys {
            keys: keys.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(keys)
    }
}

#[async_trait]
impl KeyStore for RemoteJwksKeyStore {
    async fn verification_keys(&self) -> AuthzResult<Vec<VerificationKey>> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.keys.clone());
                }
            }
        }
        self.refresh().await
    }
}
