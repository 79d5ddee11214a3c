//! In-memory implementation of the authorization stores.
//!
//! # Purpose
//! Implements the `RoleStore`, `PrincipalStore`, and `PermissionStore` traits
//! entirely in memory using `HashMap`s guarded by `tokio::sync::RwLock`. It
//! exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: mutations take the write lock, reads the
//!   read lock; identifiers are assigned under the write lock and start at 1,
//!   keeping 0 reserved for the service identity.
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use warden_authz::{
    NewPrincipal, NewRole, PermissionStore, Principal, PrincipalGrant, PrincipalId, PrincipalStore,
    Role, RoleGrant, RoleId, RoleStore, StoreError, StoreResult,
};

#[derive(Default)]
struct State {
    roles: HashMap<RoleId, Role>,
    principals: HashMap<PrincipalId, Principal>,
    memberships: HashMap<PrincipalId, HashSet<RoleId>>,
    role_grants: HashMap<RoleId, HashMap<String, bool>>,
    principal_grants: HashMap<PrincipalId, HashMap<String, bool>>,
    next_role_id: i64,
    next_principal_id: i64,
}

/// Non-durable store for development and tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|existing| existing.name == role.name) {
            return Err(StoreError::Conflict(format!("role {}", role.name)));
        }
        state.next_role_id += 1;
        let created = Role {
            id: RoleId::new(state.next_role_id),
            name: role.name,
        };
        state.roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn role_by_name(&self, name: &str) -> StoreResult<Role> {
        let state = self.state.read().await;
        state
            .roles
            .values()
            .find(|role| role.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("role {name}")))
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by_key(|role| role.id);
        Ok(roles)
    }

    async fn delete_role(&self, role_id: RoleId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .roles
            .remove(&role_id)
            .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
        // Cascade: memberships and grants referencing the role go with it.
        state.role_grants.remove(&role_id);
        for members in state.memberships.values_mut() {
            members.remove(&role_id);
        }
        Ok(())
    }

    async fn roles_for_principal(&self, principal_id: PrincipalId) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .memberships
            .get(&principal_id)
            .map(|set| {
                set.iter()
                    .filter_map(|role_id| state.roles.get(role_id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        roles.sort_by_key(|role| role.id);
        Ok(roles)
    }

    async fn assign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(StoreError::NotFound(format!("role {role_id}")));
        }
        if !state.principals.contains_key(&principal_id) {
            return Err(StoreError::NotFound(format!("principal {principal_id}")));
        }
        state
            .memberships
            .entry(principal_id)
            .or_default()
            .insert(role_id);
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for InMemoryStore {
    async fn create_principal(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        let mut state = self.state.write().await;
        if state
            .principals
            .values()
            .any(|existing| existing.username == principal.username)
        {
            return Err(StoreError::Conflict(format!(
                "principal {}",
                principal.username
            )));
        }
        state.next_principal_id += 1;
        let created = Principal {
            id: PrincipalId::new(state.next_principal_id),
            username: principal.username,
        };
        state.principals.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal> {
        let state = self.state.read().await;
        state
            .principals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("principal {id}")))
    }

    async fn list_principals(&self) -> StoreResult<Vec<Principal>> {
        let state = self.state.read().await;
        let mut principals: Vec<Principal> = state.principals.values().cloned().collect();
        principals.sort_by_key(|principal| principal.id);
        Ok(principals)
    }

    async fn principal_count(&self) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.principals.len() as u64)
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn add_role_grant(&self, grant: RoleGrant) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&grant.role_id) {
            return Err(StoreError::NotFound(format!("role {}", grant.role_id)));
        }
        let grants = state.role_grants.entry(grant.role_id).or_default();
        if grants.contains_key(&grant.permission) {
            return Err(StoreError::Conflict(format!(
                "role grant {}",
                grant.permission
            )));
        }
        grants.insert(grant.permission, grant.others);
        Ok(())
    }

    async fn remove_role_grant(&self, role_id: RoleId, permission: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .role_grants
            .get_mut(&role_id)
            .and_then(|grants| grants.remove(permission))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("role grant {permission}")))
    }

    async fn list_role_grants(&self, role_id: RoleId) -> StoreResult<Vec<RoleGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<RoleGrant> = state
            .role_grants
            .get(&role_id)
            .map(|grants| {
                grants
                    .iter()
                    .map(|(permission, others)| RoleGrant {
                        role_id,
                        permission: permission.clone(),
                        others: *others,
                    })
                    .collect()
            })
            .unwrap_or_default();
        grants.sort_by(|a, b| a.permission.cmp(&b.permission));
        Ok(grants)
    }

    async fn clear_role_grants(&self, role_id: RoleId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.role_grants.remove(&role_id);
        Ok(())
    }

    async fn add_principal_grant(&self, grant: PrincipalGrant) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.principals.contains_key(&grant.principal_id) {
            return Err(StoreError::NotFound(format!(
                "principal {}",
                grant.principal_id
            )));
        }
        let grants = state.principal_grants.entry(grant.principal_id).or_default();
        if grants.contains_key(&grant.permission) {
            return Err(StoreError::Conflict(format!(
                "principal grant {}",
                grant.permission
            )));
        }
        grants.insert(grant.permission, grant.others);
        Ok(())
    }

    async fn remove_principal_grant(
        &self,
        principal_id: PrincipalId,
        permission: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .principal_grants
            .get_mut(&principal_id)
            .and_then(|grants| grants.remove(permission))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("principal grant {permission}")))
    }

    async fn list_principal_grants(
        &self,
        principal_id: PrincipalId,
    ) -> StoreResult<Vec<PrincipalGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<PrincipalGrant> = state
            .principal_grants
            .get(&principal_id)
            .map(|grants| {
                grants
                    .iter()
                    .map(|(permission, others)| PrincipalGrant {
                        principal_id,
                        permission: permission.clone(),
                        others: *others,
                    })
                    .collect()
            })
            .unwrap_or_default();
        grants.sort_by(|a, b| a.permission.cmp(&b.permission));
        Ok(grants)
    }

    async fn clear_principal_grants(&self, principal_id: PrincipalId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.principal_grants.remove(&principal_id);
        Ok(())
    }
}
