//! Persistence contracts for roles, principals, and permission grants.
//!
//! # Purpose
//! The relational layer is an external collaborator; the gate consumes it
//! only through these CRUD traits. Implementations live with the service
//! (in-memory for development and tests, Postgres for production).
//!
//! # Error mapping
//! `NotFound` is a normal outcome (folded to "no grants" during resolution).
//! `Unavailable` and `Unexpected` must surface to the call as an internal
//! failure, never silently treated as an empty grant set.
use crate::types::{Principal, PrincipalGrant, PrincipalId, Role, RoleGrant, RoleId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Input for role creation; ids are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
}

/// Input for principal creation; ids are assigned by the store and never 0
/// (0 is the reserved service identity).
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: String,
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create_role(&self, role: NewRole) -> StoreResult<Role>;
    async fn role_by_name(&self, name: &str) -> StoreResult<Role>;
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
    async fn delete_role(&self, role_id: RoleId) -> StoreResult<()>;
    async fn roles_for_principal(&self, principal_id: PrincipalId) -> StoreResult<Vec<Role>>;
    async fn assign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> StoreResult<()>;
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn create_principal(&self, principal: NewPrincipal) -> StoreResult<Principal>;
    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal>;
    async fn list_principals(&self) -> StoreResult<Vec<Principal>>;
    async fn principal_count(&self) -> StoreResult<u64>;
}

/// Source of truth for permission grants attached to roles and to individual
/// principals.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn add_role_grant(&self, grant: RoleGrant) -> StoreResult<()>;
    async fn remove_role_grant(&self, role_id: RoleId, permission: &str) -> StoreResult<()>;
    async fn list_role_grants(&self, role_id: RoleId) -> StoreResult<Vec<RoleGrant>>;
    async fn clear_role_grants(&self, role_id: RoleId) -> StoreResult<()>;

    async fn add_principal_grant(&self, grant: PrincipalGrant) -> StoreResult<()>;
    async fn remove_principal_grant(
        &self,
        principal_id: PrincipalId,
        permission: &str,
    ) -> StoreResult<()>;
    async fn list_principal_grants(
        &self,
        principal_id: PrincipalId,
    ) -> StoreResult<Vec<PrincipalGrant>>;
    async fn clear_principal_grants(&self, principal_id: PrincipalId) -> StoreResult<()>;
}
