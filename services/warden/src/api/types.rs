//! Request/response shapes for the admin API.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use warden_authz::{Principal, PrincipalGrant, Role, RoleGrant};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SystemInfoResponse {
    pub api_version: String,
    pub backend: String,
    pub durable: bool,
    pub permissions: usize,
    pub public_methods: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.as_i64(),
            name: role.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantRequest {
    pub permission: String,
    #[serde(default)]
    pub others: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionRequest {
    pub permission: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleGrantResponse {
    pub role_id: i64,
    pub permission: String,
    pub others: bool,
}

impl From<RoleGrant> for RoleGrantResponse {
    fn from(grant: RoleGrant) -> Self {
        Self {
            role_id: grant.role_id.as_i64(),
            permission: grant.permission,
            others: grant.others,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrincipalGrantResponse {
    pub principal_id: i64,
    pub permission: String,
    pub others: bool,
}

impl From<PrincipalGrant> for PrincipalGrantResponse {
    fn from(grant: PrincipalGrant) -> Self {
        Self {
            principal_id: grant.principal_id.as_i64(),
            permission: grant.permission,
            others: grant.others,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub principal_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePrincipalRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    pub id: i64,
    pub username: String,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id.as_i64(),
            username: principal.username,
        }
    }
}
