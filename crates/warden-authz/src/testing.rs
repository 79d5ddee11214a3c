//! Shared fixtures for module tests: a minimal in-memory store and Ed25519
//! token material.
use crate::claims::AccessClaims;
use crate::store::{
    NewPrincipal, NewRole, PermissionStore, PrincipalStore, RoleStore, StoreError, StoreResult,
};
use crate::token::{Jwk, StaticKeyStore, VerificationKey};
use crate::types::{Principal, PrincipalGrant, PrincipalId, Role, RoleGrant, RoleId};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{DecodingKey, EncodingKey, Header};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct MemState {
    roles: HashMap<RoleId, Role>,
    principals: HashMap<PrincipalId, Principal>,
    memberships: HashMap<PrincipalId, HashSet<RoleId>>,
    role_grants: HashMap<RoleId, HashMap<String, bool>>,
    principal_grants: HashMap<PrincipalId, HashMap<String, bool>>,
    next_role_id: i64,
    next_principal_id: i64,
}

/// Hand-rolled store double; ids are assigned starting at 1 so 0 stays the
/// reserved service identity.
#[derive(Default)]
pub(crate) struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    pub(crate) fn add_role(&self, name: &str) -> RoleId {
        let mut state = self.state.lock().expect("lock");
        state.next_role_id += 1;
        let id = RoleId::new(state.next_role_id);
        state.roles.insert(
            id,
            Role {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub(crate) fn add_principal(&self, username: &str) -> PrincipalId {
        let mut state = self.state.lock().expect("lock");
        state.next_principal_id += 1;
        let id = PrincipalId::new(state.next_principal_id);
        state.principals.insert(
            id,
            Principal {
                id,
                username: username.to_string(),
            },
        );
        id
    }

    pub(crate) fn add_membership(&self, principal: PrincipalId, role: RoleId) {
        let mut state = self.state.lock().expect("lock");
        state.memberships.entry(principal).or_default().insert(role);
    }

    pub(crate) fn put_role_grant(&self, grant: RoleGrant) {
        let mut state = self.state.lock().expect("lock");
        state
            .role_grants
            .entry(grant.role_id)
            .or_default()
            .insert(grant.permission, grant.others);
    }

    pub(crate) fn put_principal_grant(&self, grant: PrincipalGrant) {
        let mut state = self.state.lock().expect("lock");
        state
            .principal_grants
            .entry(grant.principal_id)
            .or_default()
            .insert(grant.permission, grant.others);
    }

    pub(crate) fn remove_principal_grant_sync(&self, principal: PrincipalId, permission: &str) {
        let mut state = self.state.lock().expect("lock");
        if let Some(grants) = state.principal_grants.get_mut(&principal) {
            grants.remove(permission);
        }
    }

    pub(crate) fn remove_role_grant_sync(&self, role: RoleId, permission: &str) {
        let mut state = self.state.lock().expect("lock");
        if let Some(grants) = state.role_grants.get_mut(&role) {
            grants.remove(permission);
        }
    }

    pub(crate) fn role_by_name_sync(&self, name: &str) -> Option<Role> {
        let state = self.state.lock().expect("lock");
        state.roles.values().find(|role| role.name == name).cloned()
    }

    pub(crate) fn role_grants_sync(&self, role: RoleId) -> Vec<RoleGrant> {
        let state = self.state.lock().expect("lock");
        state
            .role_grants
            .get(&role)
            .map(|grants| {
                grants
                    .iter()
                    .map(|(permission, others)| RoleGrant {
                        role_id: role,
                        permission: permission.clone(),
                        others: *others,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn principal_by_username_sync(&self, username: &str) -> Option<Principal> {
        let state = self.state.lock().expect("lock");
        state
            .principals
            .values()
            .find(|principal| principal.username == username)
            .cloned()
    }

    pub(crate) fn memberships_sync(&self, principal: PrincipalId) -> Vec<RoleId> {
        let state = self.state.lock().expect("lock");
        let mut roles: Vec<RoleId> = state
            .memberships
            .get(&principal)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        roles.sort();
        roles
    }
}

#[async_trait]
impl RoleStore for MemStore {
    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        {
            let state = self.state.lock().expect("lock");
            if state.roles.values().any(|existing| existing.name == role.name) {
                return Err(StoreError::Conflict(format!("role {}", role.name)));
            }
        }
        let id = self.add_role(&role.name);
        Ok(Role {
            id,
            name: role.name,
        })
    }

    async fn role_by_name(&self, name: &str) -> StoreResult<Role> {
        self.role_by_name_sync(name)
            .ok_or_else(|| StoreError::NotFound(format!("role {name}")))
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let state = self.state.lock().expect("lock");
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by_key(|role| role.id);
        Ok(roles)
    }

    async fn delete_role(&self, role_id: RoleId) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock");
        state
            .roles
            .remove(&role_id)
            .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
        state.role_grants.remove(&role_id);
        for members in state.memberships.values_mut() {
            members.remove(&role_id);
        }
        Ok(())
    }

    async fn roles_for_principal(&self, principal_id: PrincipalId) -> StoreResult<Vec<Role>> {
        let state = self.state.lock().expect("lock");
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
        let mut state = self.state.lock().expect("lock");
        if !state.roles.contains_key(&role_id) {
            return Err(StoreError::NotFound(format!("role {role_id}")));
        }
        if !state.principals.contains_key(&principal_id) {
            return Err(StoreError::NotFound(format!("principal {principal_id}")));
        }
        state.memberships.entry(principal_id).or_default().insert(role_id);
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for MemStore {
    async fn create_principal(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        {
            let state = self.state.lock().expect("lock");
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
        }
        let id = self.add_principal(&principal.username);
        Ok(Principal {
            id,
            username: principal.username,
        })
    }

    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal> {
        let state = self.state.lock().expect("lock");
        state
            .principals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("principal {id}")))
    }

    async fn list_principals(&self) -> StoreResult<Vec<Principal>> {
        let state = self.state.lock().expect("lock");
        let mut principals: Vec<Principal> = state.principals.values().cloned().collect();
        principals.sort_by_key(|principal| principal.id);
        Ok(principals)
    }

    async fn principal_count(&self) -> StoreResult<u64> {
        let state = self.state.lock().expect("lock");
        Ok(state.principals.len() as u64)
    }
}

#[async_trait]
impl PermissionStore for MemStore {
    async fn add_role_grant(&self, grant: RoleGrant) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock");
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
        let mut state = self.state.lock().expect("lock");
        let removed = state
            .role_grants
            .get_mut(&role_id)
            .and_then(|grants| grants.remove(permission));
        removed
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("role grant {permission}")))
    }

    async fn list_role_grants(&self, role_id: RoleId) -> StoreResult<Vec<RoleGrant>> {
        Ok(self.role_grants_sync(role_id))
    }

    async fn clear_role_grants(&self, role_id: RoleId) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock");
        state.role_grants.remove(&role_id);
        Ok(())
    }

    async fn add_principal_grant(&self, grant: PrincipalGrant) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock");
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
        let mut state = self.state.lock().expect("lock");
        let removed = state
            .principal_grants
            .get_mut(&principal_id)
            .and_then(|grants| grants.remove(permission));
        removed
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("principal grant {permission}")))
    }

    async fn list_principal_grants(
        &self,
        principal_id: PrincipalId,
    ) -> StoreResult<Vec<PrincipalGrant>> {
        let state = self.state.lock().expect("lock");
        Ok(state
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
            .unwrap_or_default())
    }

    async fn clear_principal_grants(&self, principal_id: PrincipalId) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock");
        state.principal_grants.remove(&principal_id);
        Ok(())
    }
}

/// Wrapper that injects failures into a delegate permission store.
pub(crate) struct FailingPermissionStore {
    inner: Arc<MemStore>,
    fail_grant_for: Option<String>,
    fail_lists: bool,
}

impl FailingPermissionStore {
    /// Fails `add_role_grant` for one specific permission only.
    pub(crate) fn failing_grant(inner: Arc<MemStore>, permission: &str) -> Self {
        Self {
            inner,
            fail_grant_for: Some(permission.to_string()),
            fail_lists: false,
        }
    }

    /// Fails every list operation with `Unavailable`.
    pub(crate) fn unavailable(inner: Arc<MemStore>) -> Self {
        Self {
            inner,
            fail_grant_for: None,
            fail_lists: true,
        }
    }
}

#[async_trait]
impl PermissionStore for FailingPermissionStore {
    async fn add_role_grant(&self, grant: RoleGrant) -> StoreResult<()> {
        if self.fail_grant_for.as_deref() == Some(grant.permission.as_str()) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.add_role_grant(grant).await
    }

    async fn remove_role_grant(&self, role_id: RoleId, permission: &str) -> StoreResult<()> {
        self.inner.remove_role_grant(role_id, permission).await
    }

    async fn list_role_grants(&self, role_id: RoleId) -> StoreResult<Vec<RoleGrant>> {
        if self.fail_lists {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.list_role_grants(role_id).await
    }

    async fn clear_role_grants(&self, role_id: RoleId) -> StoreResult<()> {
        self.inner.clear_role_grants(role_id).await
    }

    async fn add_principal_grant(&self, grant: PrincipalGrant) -> StoreResult<()> {
        self.inner.add_principal_grant(grant).await
    }

    async fn remove_principal_grant(
        &self,
        principal_id: PrincipalId,
        permission: &str,
    ) -> StoreResult<()> {
        self.inner.remove_principal_grant(principal_id, permission).await
    }

    async fn list_principal_grants(
        &self,
        principal_id: PrincipalId,
    ) -> StoreResult<Vec<PrincipalGrant>> {
        if self.fail_lists {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.list_principal_grants(principal_id).await
    }

    async fn clear_principal_grants(&self, principal_id: PrincipalId) -> StoreResult<()> {
        self.inner.clear_principal_grants(principal_id).await
    }
}

const TEST_KEY_SEED: [u8; 32] = [7u8; 32];

/// Deterministic Ed25519 material shared by token tests.
pub(crate) fn test_keys() -> (EncodingKey, StaticKeyStore) {
    let signing_key = SigningKey::from_bytes(&TEST_KEY_SEED);
    let private_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("private pem");
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("public pem");
    let encoding = EncodingKey::from_ed_pem(private_pem.as_bytes()).expect("encoding key");
    let decoding = DecodingKey::from_ed_pem(public_pem.as_bytes()).expect("decoding key");
    let key_store = StaticKeyStore::new(vec![VerificationKey {
        kid: Some("test-key".to_string()),
        decoding_key: decoding,
    }]);
    (encoding, key_store)
}

/// JWKS entry for the deterministic test key.
pub(crate) fn test_jwk(kid: &str) -> Jwk {
    let signing_key = SigningKey::from_bytes(&TEST_KEY_SEED);
    Jwk {
        kty: "OKP".to_string(),
        crv: "Ed25519".to_string(),
        kid: kid.to_string(),
        x: URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes()),
    }
}

pub(crate) fn standard_claims(sub: &str) -> AccessClaims {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64;
    AccessClaims {
        iss: "https://idp.example".to_string(),
        aud: "warden".to_string(),
        sub: sub.to_string(),
        exp: now + 600,
        iat: now,
        username: None,
        roles: Vec::new(),
    }
}

pub(crate) fn mint_token(encoding: &EncodingKey, claims: &AccessClaims) -> String {
    let mut header = Header::new(jsonwebtoken::Algorithm::EdDSA);
    header.kid = Some("test-key".to_string());
    jsonwebtoken::encode(&header, claims, encoding).expect("token")
}
