//! Effective permission resolution for a principal.
//!
//! # Purpose
//! Computes the effective permission map by merging role-derived grants and
//! direct principal grants. Resolution is uncached; the cache layers on top.
//!
//! # Key invariants
//! - The fold is an OR-merge: a grant with `others=false` never downgrades a
//!   previously folded `true`, so ordering of grant application is irrelevant.
//! - The system identity (principal id 0) bypasses the stores entirely and
//!   receives every catalog permission with `others=true`.
//! - A store `NotFound` folds to "no grants"; any other store failure is
//!   surfaced, never swallowed into an empty map.
use crate::catalog::PermissionCatalog;
use crate::errors::AuthzResult;
use crate::store::{PermissionStore, RoleStore, StoreError, StoreResult};
use crate::types::{EffectivePermissions, PrincipalId};
use std::sync::Arc;

#[derive(Clone)]
pub struct PermissionResolver {
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
    catalog: PermissionCatalog,
}

impl PermissionResolver {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        permissions: Arc<dyn PermissionStore>,
        catalog: PermissionCatalog,
    ) -> Self {
        Self {
            roles,
            permissions,
            catalog,
        }
    }

    /// Resolve the effective permission map for one principal.
    pub async fn resolve(&self, principal: PrincipalId) -> AuthzResult<EffectivePermissions> {
        if principal.is_system() {
            return Ok(self.system_permissions());
        }

        let mut resolved = EffectivePermissions::new();
        let roles = empty_on_not_found(self.roles.roles_for_principal(principal).await)?;
        for role in roles {
            let grants = empty_on_not_found(self.permissions.list_role_grants(role.id).await)?;
            for grant in grants {
                resolved.grant(grant.permission, grant.others);
            }
        }

        let direct = empty_on_not_found(self.permissions.list_principal_grants(principal).await)?;
        for grant in direct {
            resolved.grant(grant.permission, grant.others);
        }

        Ok(resolved)
    }

    fn system_permissions(&self) -> EffectivePermissions {
        let mut all = EffectivePermissions::new();
        for permission in self.catalog.iter() {
            all.grant(permission, true);
        }
        all
    }
}

fn empty_on_not_found<T: Default>(result: StoreResult<T>) -> Result<T, StoreError> {
    match result {
        Err(StoreError::NotFound(_)) => Ok(T::default()),
        other => other,
    }
}
