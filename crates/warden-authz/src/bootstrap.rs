//! Startup reconciliation of the super-administrator role.
//!
//! # Purpose
//! Idempotently guarantees that a role named "Super Admin" exists and holds
//! every catalog permission with the others override, and that at least one
//! principal exists to hold it. Runs once at startup, after the catalog
//! snapshot is computed.
//!
//! # Failure semantics
//! Grant reconciliation is at-least-effort, not transactional: a single
//! grant-creation failure is logged and skipped so the remaining grants are
//! still reconciled. Only the inability to ensure the role itself aborts the
//! run.
use crate::catalog::PermissionCatalog;
use crate::errors::{AuthzError, AuthzResult};
use crate::store::{NewPrincipal, NewRole, PermissionStore, PrincipalStore, RoleStore, StoreError};
use crate::types::{Role, RoleGrant};
use std::collections::HashSet;
use std::sync::Arc;

/// Name of the distinguished bootstrap role.
pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

/// Username of the seed principal created when the principal store is empty.
pub const SEED_ADMIN_USERNAME: &str = "admin";

/// Outcome summary for startup logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub grants_created: usize,
    pub grants_failed: usize,
    pub seeded_admin: bool,
}

pub struct Bootstrapper {
    roles: Arc<dyn RoleStore>,
    principals: Arc<dyn PrincipalStore>,
    permissions: Arc<dyn PermissionStore>,
    catalog: PermissionCatalog,
}

impl Bootstrapper {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        principals: Arc<dyn PrincipalStore>,
        permissions: Arc<dyn PermissionStore>,
        catalog: PermissionCatalog,
    ) -> Self {
        Self {
            roles,
            principals,
            permissions,
            catalog,
        }
    }

    /// Reconcile the super-admin role and seed principal. Safe to run on
    /// every startup; running twice produces the same grant set as once.
    pub async fn run(&self) -> AuthzResult<BootstrapReport> {
        let role = self.ensure_super_admin_role().await?;
        let mut report = BootstrapReport::default();

        // Pre-read the role's current grant set so reconciliation never
        // duplicates an existing (role, permission) row.
        let existing: HashSet<String> = self
            .permissions
            .list_role_grants(role.id)
            .await
            .map_err(AuthzError::from)?
            .into_iter()
            .map(|grant| grant.permission)
            .collect();

        for permission in self.catalog.iter() {
            if existing.contains(permission) {
                continue;
            }
            let grant = RoleGrant {
                role_id: role.id,
                permission: permission.to_string(),
                others: true,
            };
            match self.permissions.add_role_grant(grant).await {
                Ok(()) => report.grants_created += 1,
                // A concurrent bootstrap already created it.
                Err(StoreError::Conflict(_)) => {}
                Err(err) => {
                    tracing::warn!(
                        role = %role.name,
                        permission,
                        error = %err,
                        "failed to create bootstrap grant; continuing"
                    );
                    report.grants_failed += 1;
                }
            }
        }

        report.seeded_admin = self.ensure_seed_principal(&role).await;
        Ok(report)
    }

    async fn ensure_super_admin_role(&self) -> AuthzResult<Role> {
        match self.roles.role_by_name(SUPER_ADMIN_ROLE).await {
            Ok(role) => Ok(role),
            Err(StoreError::NotFound(_)) => {
                match self
                    .roles
                    .create_role(NewRole {
                        name: SUPER_ADMIN_ROLE.to_string(),
                    })
                    .await
                {
                    Ok(role) => Ok(role),
                    // Lost a creation race; the role exists now.
                    Err(StoreError::Conflict(_)) => self
                        .roles
                        .role_by_name(SUPER_ADMIN_ROLE)
                        .await
                        .map_err(AuthzError::from),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns true when a seed principal was created on this run.
    async fn ensure_seed_principal(&self, role: &Role) -> bool {
        let count = match self.principals.principal_count().await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "failed to count principals; skipping seed");
                return false;
            }
        };
        if count > 0 {
            return false;
        }

        let principal = match self
            .principals
            .create_principal(NewPrincipal {
                username: SEED_ADMIN_USERNAME.to_string(),
            })
            .await
        {
            Ok(principal) => principal,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create seed principal");
                return false;
            }
        };

        if let Err(err) = self.roles.assign_role(principal.id, role.id).await {
            tracing::warn!(
                principal = %principal.id,
                error = %err,
                "failed to assign bootstrap role to seed principal"
            );
        }
        tracing::info!(
            principal = %principal.id,
            username = SEED_ADMIN_USERNAME,
            "seeded administrative principal"
        );
        true
    }
}
