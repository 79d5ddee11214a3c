//! Identity claims and the validator seam to the external identity provider.
use crate::errors::AuthzResult;
use crate::types::PrincipalId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Claims carried by a validated bearer credential.
///
/// `sub` is the stable subject identifier: the decimal principal id. The
/// optional `username` and `roles` claims are informational extras for
/// handlers; authorization itself resolves grants from the stores, not from
/// token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl AccessClaims {
    /// Parse the subject claim into a principal id. `None` when the claim is
    /// absent or not a decimal id.
    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.sub.trim().parse::<i64>().ok().map(PrincipalId::new)
    }
}

/// Verifies a bearer credential against the identity provider and yields
/// identity claims. The provider is an external collaborator; it is consumed
/// through this seam, never reimplemented.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> AuthzResult<AccessClaims>;
}
