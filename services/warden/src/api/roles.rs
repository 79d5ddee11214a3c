//! Role administration: CRUD, role grants, and role assignment.
//!
//! Every grant mutation invalidates the permission cache synchronously,
//! before the handler reports success, so the next authorization check for
//! any affected principal observes the change. Role-level mutations evict the
//! whole cache because role membership is not indexed in the cache;
//! assignment evicts only the affected principal.
use crate::api::error::{api_store, api_validation_error, ApiError};
use crate::api::types::{
    AssignRoleRequest, CreateRoleRequest, GrantRequest, PermissionRequest, RoleGrantResponse,
    RoleResponse, StatusResponse,
};
use crate::app::AppState;
use axum::extract::{Path, State};
use axum::Json;
use warden_authz::{NewRole, PrincipalId, RoleGrant, RoleId};

#[utoipa::path(
    get,
    path = "/v1/roles",
    tag = "roles",
    responses((status = 200, description = "All roles", body = [RoleResponse]))
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = state
        .roles
        .list_roles()
        .await
        .map_err(|err| api_store("failed to list roles", err))?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/v1/roles",
    tag = "roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 200, description = "Role created", body = RoleResponse),
        (status = 409, description = "Role name already exists")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(api_validation_error("name is required"));
    }
    let role = state
        .roles
        .create_role(NewRole {
            name: name.to_string(),
        })
        .await
        .map_err(|err| api_store("failed to create role", err))?;
    Ok(Json(role.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/roles/{role_id}",
    tag = "roles",
    params(("role_id" = i64, Path, description = "Role identifier")),
    responses(
        (status = 200, description = "Role deleted", body = StatusResponse),
        (status = 404, description = "Unknown role")
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    let role_id = RoleId::new(role_id);
    state
        .permissions
        .clear_role_grants(role_id)
        .await
        .map_err(|err| api_store("failed to clear role grants", err))?;
    state
        .roles
        .delete_role(role_id)
        .await
        .map_err(|err| api_store("failed to delete role", err))?;
    state.cache.invalidate_all();
    Ok(Json(StatusResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/v1/roles/{role_id}/grants",
    tag = "roles",
    params(("role_id" = i64, Path, description = "Role identifier")),
    responses((status = 200, description = "Grants held by the role", body = [RoleGrantResponse]))
)]
pub async fn list_role_grants(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<RoleGrantResponse>>, ApiError> {
    let grants = state
        .permissions
        .list_role_grants(RoleId::new(role_id))
        .await
        .map_err(|err| api_store("failed to list role grants", err))?;
    Ok(Json(grants.into_iter().map(RoleGrantResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/v1/roles/{role_id}/grants",
    tag = "roles",
    params(("role_id" = i64, Path, description = "Role identifier")),
    request_body = GrantRequest,
    responses(
        (status = 200, description = "Grant created", body = RoleGrantResponse),
        (status = 400, description = "Permission not in the catalog"),
        (status = 409, description = "Grant already exists")
    )
)]
pub async fn add_role_grant(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<RoleGrantResponse>, ApiError> {
    if !state.catalog.contains(&body.permission) {
        return Err(api_validation_error(&format!(
            "unknown permission {}",
            body.permission
        )));
    }
    let grant = RoleGrant {
        role_id: RoleId::new(role_id),
        permission: body.permission,
        others: body.others,
    };
    state
        .permissions
        .add_role_grant(grant.clone())
        .await
        .map_err(|err| api_store("failed to add role grant", err))?;
    state.cache.invalidate_all();
    Ok(Json(grant.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/roles/{role_id}/grants",
    tag = "roles",
    params(("role_id" = i64, Path, description = "Role identifier")),
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Grant removed", body = StatusResponse),
        (status = 404, description = "Unknown grant")
    )
)]
pub async fn remove_role_grant(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    Json(body): Json<PermissionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .permissions
        .remove_role_grant(RoleId::new(role_id), &body.permission)
        .await
        .map_err(|err| api_store("failed to remove role grant", err))?;
    state.cache.invalidate_all();
    Ok(Json(StatusResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/v1/roles/{role_id}/assign",
    tag = "roles",
    params(("role_id" = i64, Path, description = "Role identifier")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = StatusResponse),
        (status = 404, description = "Unknown role or principal")
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    Json(body): Json<AssignRoleRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let principal = PrincipalId::new(body.principal_id);
    state
        .roles
        .assign_role(principal, RoleId::new(role_id))
        .await
        .map_err(|err| api_store("failed to assign role", err))?;
    state.cache.invalidate(principal);
    Ok(Json(StatusResponse::ok()))
}
