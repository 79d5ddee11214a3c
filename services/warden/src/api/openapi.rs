//! OpenAPI document assembly.
use crate::api::types::{
    AssignRoleRequest, CreatePrincipalRequest, CreateRoleRequest, ErrorResponse, GrantRequest,
    HealthResponse, PermissionRequest, PrincipalGrantResponse, PrincipalResponse,
    RoleGrantResponse, RoleResponse, StatusResponse, SystemInfoResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::system::system_health,
        crate::api::system::system_info,
        crate::api::system::openapi_spec,
        crate::api::roles::list_roles,
        crate::api::roles::create_role,
        crate::api::roles::delete_role,
        crate::api::roles::list_role_grants,
        crate::api::roles::add_role_grant,
        crate::api::roles::remove_role_grant,
        crate::api::roles::assign_role,
        crate::api::principals::list_principals,
        crate::api::principals::create_principal,
        crate::api::principals::get_principal,
        crate::api::principals::list_principal_grants,
        crate::api::principals::add_principal_grant,
        crate::api::principals::remove_principal_grant,
    ),
    components(schemas(
        AssignRoleRequest,
        CreatePrincipalRequest,
        CreateRoleRequest,
        ErrorResponse,
        GrantRequest,
        HealthResponse,
        PermissionRequest,
        PrincipalGrantResponse,
        PrincipalResponse,
        RoleGrantResponse,
        RoleResponse,
        StatusResponse,
        SystemInfoResponse,
    )),
    tags(
        (name = "system", description = "Health and service information"),
        (name = "roles", description = "Role and role-grant administration"),
        (name = "principals", description = "Principal and direct-grant administration")
    )
)]
pub struct ApiDoc;
