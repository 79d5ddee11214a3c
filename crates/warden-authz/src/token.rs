//! Bearer-token verification against the identity provider's key material.
//!
//! # Purpose
//! Implements [`TokenValidator`](crate::claims::TokenValidator) on top of
//! JWT verification. Verification keys come through the [`KeyStore`] seam so
//! deployments can serve them from a fixed PEM or from the provider's JWKS
//! endpoint.
//!
//! # Key invariants
//! - Tokens are EdDSA/Ed25519 only; RSA and HMAC algorithms are rejected
//!   before any signature check.
//! - Issuer, audience, and expiry (with configurable leeway) are always
//!   enforced.
use crate::claims::{AccessClaims, TokenValidator};
use crate::errors::{AuthzError, AuthzResult};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One verification key, optionally tagged with the provider's key id.
#[derive(Clone)]
pub struct VerificationKey {
    pub kid: Option<String>,
    pub decoding_key: DecodingKey,
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

/// Source of verification keys. Implementations may be fixed key material or
/// a remote JWKS document cached with a TTL.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn verification_keys(&self) -> AuthzResult<Vec<VerificationKey>>;
}

/// Fixed key material, for tests and single-key deployments.
pub struct StaticKeyStore {
    keys: Vec<VerificationKey>,
}

impl StaticKeyStore {
    pub fn new(keys: Vec<VerificationKey>) -> Self {
        Self { keys }
    }

    /// Build from an Ed25519 public key in PEM form.
    pub fn from_ed_pem(pem: &[u8]) -> AuthzResult<Self> {
        let decoding_key = DecodingKey::from_ed_pem(pem)
            .map_err(|err| AuthzError::Internal(anyhow::Error::new(err).context("parse ed25519 pem")))?;
        Ok(Self::new(vec![VerificationKey {
            kid: None,
            decoding_key,
        }]))
    }
}

#[async_trait]
impl KeyStore for StaticKeyStore {
    async fn verification_keys(&self) -> AuthzResult<Vec<VerificationKey>> {
        Ok(self.keys.clone())
    }
}

/// JWKS entry for an OKP/Ed25519 key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub kid: String,
    pub x: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Convert a JWKS document into decoding keys, skipping entries that are not
/// OKP/Ed25519.
pub fn jwks_to_keys(jwks: &Jwks) -> AuthzResult<Vec<VerificationKey>> {
    let mut keys = Vec::with_capacity(jwks.keys.len());
    for key in &jwks.keys {
        if key.kty != "OKP" || key.crv != "Ed25519" {
            tracing::debug!(kid = %key.kid, kty = %key.kty, "skipping non-ed25519 jwks entry");
            continue;
        }
        let decoding_key = DecodingKey::from_ed_components(&key.x)
            .map_err(|err| AuthzError::Internal(anyhow::Error::new(err).context("decode jwks key")))?;
        keys.push(VerificationKey {
            kid: Some(key.kid.clone()),
            decoding_key,
        });
    }
    Ok(keys)
}

/// Token validator enforcing issuer, audience, and expiry over EdDSA
/// signatures.
pub struct JwtTokenValidator {
    issuer: String,
    audience: String,
    leeway: u64,
    keys: Arc<dyn KeyStore>,
}

impl JwtTokenValidator {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        leeway: u64,
        keys: Arc<dyn KeyStore>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway,
            keys,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = self.leeway;
        validation
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> AuthzResult<AccessClaims> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|err| AuthzError::Unauthenticated(format!("malformed token: {err}")))?;
        if header.alg != Algorithm::EdDSA {
            return Err(AuthzError::Unauthenticated(format!(
                "unsupported token algorithm {:?}",
                header.alg
            )));
        }

        // Key-store failures are infrastructure problems, not identity
        // problems; they keep their own taxonomy.
        let keys = self.keys.verification_keys().await?;
        let key = match header.kid.as_deref() {
            Some(kid) => keys
                .iter()
                .find(|key| key.kid.as_deref() == Some(kid))
                .or_else(|| keys.first()),
            None => keys.first(),
        }
        .ok_or_else(|| AuthzError::Unavailable("no verification keys configured".to_string()))?;

        let decoded =
            jsonwebtoken::decode::<AccessClaims>(token, &key.decoding_key, &self.validation())
                .map_err(|err| AuthzError::Unauthenticated(format!("invalid token: {err}")))?;
        Ok(decoded.claims)
    }
}
