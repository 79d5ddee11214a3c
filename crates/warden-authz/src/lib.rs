//! Warden authn/authz primitives shared by the gate and its admin service.
//!
//! # Purpose
//! Centralizes the permission model (catalog derivation, grant resolution,
//! caching), bearer-token verification, and the call-path authorization
//! interceptor used in front of every protected RPC method.
//!
//! # How it fits
//! Services register their RPC methods at startup to derive the permission
//! catalog, the bootstrapper reconciles the super-administrator role against
//! that catalog, and the [`AuthorizationGate`] runs once per inbound call to
//! render an allow/deny decision plus the authorized-for-others flag.
//!
//! # Key invariants
//! - Permission identifiers are exactly `"/<service>/<method>"`, matching the
//!   RPC framework's own full-method naming.
//! - The catalog is an immutable snapshot computed once per process, after
//!   every service has registered.
//! - The effective `others` flag is the OR of every grant source; it never
//!   downgrades once true.
//! - Tokens are EdDSA/Ed25519 only; RSA/HS algorithms are rejected.

pub mod bootstrap;
pub mod cache;
pub mod catalog;
pub mod claims;
pub mod errors;
pub mod interceptor;
pub mod resolver;
pub mod store;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{BootstrapReport, Bootstrapper, SUPER_ADMIN_ROLE};
pub use cache::{PermissionCache, DEFAULT_CACHE_TTL};
pub use catalog::{MethodRegistry, PermissionCatalog, PublicMethods};
pub use claims::{AccessClaims, TokenValidator};
pub use errors::{AuthzError, AuthzResult};
pub use interceptor::{
    AuthorizationGate, AuthzContext, CallMetadata, AUTHORIZATION_METADATA_KEY, BEARER_PREFIX,
};
pub use resolver::PermissionResolver;
pub use store::{
    NewPrincipal, NewRole, PermissionStore, PrincipalStore, RoleStore, StoreError, StoreResult,
};
pub use token::{jwks_to_keys, Jwk, Jwks, JwtTokenValidator, KeyStore, StaticKeyStore, VerificationKey};
pub use types::{
    EffectivePermissions, Principal, PrincipalGrant, PrincipalId, Role, RoleGrant, RoleId,
};
