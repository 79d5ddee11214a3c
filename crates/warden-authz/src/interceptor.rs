//! The call-path authorization gate.
//!
//! # Purpose
//! Runs once per inbound call, before dispatch: classifies the call as
//! public or protected, authenticates the bearer credential, consults the
//! permission cache (populating it on miss via the resolver), and renders an
//! allow/deny decision plus the derived authorized-for-others flag that
//! handlers use for self-vs-target checks.
//!
//! # How it fits
//! The gate is transport-agnostic: callers hand it the call's full method
//! name and a [`CallMetadata`] view of the call metadata. Unary and streaming
//! calls run the same path; a stream is decided once at establishment, not
//! per message.
use crate::cache::PermissionCache;
use crate::catalog::PublicMethods;
use crate::claims::{AccessClaims, TokenValidator};
use crate::errors::{AuthzError, AuthzResult};
use crate::resolver::PermissionResolver;
use crate::types::PrincipalId;
use std::collections::HashMap;
use std::sync::Arc;

/// Case-insensitive metadata key carrying the bearer credential.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";

/// Required scheme prefix, matched literally.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Case-insensitive view of a call's metadata.
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    entries: HashMap<String, String>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut metadata = Self::new();
        for (key, value) in pairs {
            metadata.insert(key, value);
        }
        metadata
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Extract the bearer token from call metadata. Absence or a wrong scheme is
/// a hard authentication failure, never silently treated as anonymous.
pub fn bearer_token(metadata: &CallMetadata) -> AuthzResult<&str> {
    let value = metadata
        .get(AUTHORIZATION_METADATA_KEY)
        .ok_or_else(|| AuthzError::Unauthenticated("missing authorization metadata".to_string()))?;
    let token = value.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AuthzError::Unauthenticated("authorization scheme must be Bearer".to_string())
    })?;
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthzError::Unauthenticated("empty bearer token".to_string()));
    }
    Ok(token)
}

/// The per-call decision attached to the call context for downstream
/// handlers.
#[derive(Debug, Clone)]
pub struct AuthzContext {
    principal: Option<PrincipalId>,
    authorized_for_others: bool,
    claims: Option<AccessClaims>,
}

impl AuthzContext {
    fn public() -> Self {
        Self {
            principal: None,
            authorized_for_others: false,
            claims: None,
        }
    }

    fn service(claims: AccessClaims) -> Self {
        Self {
            principal: Some(PrincipalId::SYSTEM),
            authorized_for_others: true,
            claims: Some(claims),
        }
    }

    fn for_principal(principal: PrincipalId, others: bool, claims: AccessClaims) -> Self {
        Self {
            principal: Some(principal),
            authorized_for_others: others,
            claims: Some(claims),
        }
    }

    /// The authenticated caller, absent on public calls.
    pub fn principal(&self) -> Option<PrincipalId> {
        self.principal
    }

    /// Whether the matched grant authorizes actions against any target.
    pub fn authorized_for_others(&self) -> bool {
        self.authorized_for_others
    }

    pub fn claims(&self) -> Option<&AccessClaims> {
        self.claims.as_ref()
    }

    /// Self-vs-target check: a principal may always act on itself, even with
    /// zero grants; acting on anyone else requires the others flag.
    pub fn may_act_on(&self, target: PrincipalId) -> bool {
        match self.principal {
            Some(own) if own == target => true,
            _ => self.authorized_for_others,
        }
    }
}

/// Classifies, authenticates, and authorizes every inbound call.
pub struct AuthorizationGate {
    public: PublicMethods,
    validator: Arc<dyn TokenValidator>,
    resolver: PermissionResolver,
    cache: Arc<PermissionCache>,
}

impl AuthorizationGate {
    pub fn new(
        public: PublicMethods,
        validator: Arc<dyn TokenValidator>,
        resolver: PermissionResolver,
        cache: Arc<PermissionCache>,
    ) -> Self {
        Self {
            public,
            validator,
            resolver,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    /// Render the allow/deny decision for one call.
    pub async fn authorize(
        &self,
        full_method: &str,
        metadata: &CallMetadata,
    ) -> AuthzResult<AuthzContext> {
        if self.public.contains(full_method) {
            return Ok(AuthzContext::public());
        }

        let decision = self.check_protected(full_method, metadata).await;
        match &decision {
            Ok(_) => metrics::counter!("warden_authz_allowed_total").increment(1),
            Err(AuthzError::Unauthenticated(_)) => {
                metrics::counter!("warden_authz_unauthenticated_total").increment(1);
            }
            Err(AuthzError::PermissionDenied(_)) => {
                metrics::counter!("warden_authz_denied_total").increment(1);
            }
            Err(_) => {}
        }
        decision
    }

    async fn check_protected(
        &self,
        full_method: &str,
        metadata: &CallMetadata,
    ) -> AuthzResult<AuthzContext> {
        let token = bearer_token(metadata)?;
        let claims = self.validator.validate(token).await?;
        let principal = claims.principal_id().ok_or_else(|| {
            AuthzError::Unauthenticated("subject claim missing or malformed".to_string())
        })?;

        if principal.is_system() {
            return Ok(AuthzContext::service(claims));
        }

        let permissions = match self.cache.get(principal) {
            Some(cached) => cached,
            None => {
                let resolved = self.resolver.resolve(principal).await?;
                self.cache.insert(principal, &resolved);
                resolved
            }
        };

        match permissions.lookup(full_method) {
            Some(others) => {
                tracing::debug!(%principal, method = full_method, others, "call authorized");
                Ok(AuthzContext::for_principal(principal, others, claims))
            }
            None => Err(AuthzError::PermissionDenied(full_method.to_string())),
        }
    }
}
