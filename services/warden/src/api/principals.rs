//! Principal administration: accounts, direct grants, and self-service reads.
//!
//! Handlers that act on a named principal apply the two-tier target check: a
//! caller may always act on itself, and needs the authorized-for-others flag
//! (set by the gate from the matched grant) to act on anyone else. Grant
//! mutations invalidate only the affected principal's cache entry, before the
//! handler reports success.
use crate::api::error::{api_forbidden, api_store, api_validation_error, ApiError};
use crate::api::types::{
    CreatePrincipalRequest, GrantRequest, PermissionRequest, PrincipalGrantResponse,
    PrincipalResponse, StatusResponse,
};
use crate::app::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use warden_authz::{AuthzContext, NewPrincipal, PrincipalGrant, PrincipalId};

#[utoipa::path(
    get,
    path = "/v1/principals",
    tag = "principals",
    responses((status = 200, description = "All principals", body = [PrincipalResponse]))
)]
pub async fn list_principals(
    State(state): State<AppState>,
) -> Result<Json<Vec<PrincipalResponse>>, ApiError> {
    let principals = state
        .principals
        .list_principals()
        .await
        .map_err(|err| api_store("failed to list principals", err))?;
    Ok(Json(
        principals.into_iter().map(PrincipalResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/principals",
    tag = "principals",
    request_body = CreatePrincipalRequest,
    responses(
        (status = 200, description = "Principal created", body = PrincipalResponse),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_principal(
    State(state): State<AppState>,
    Json(body): Json<CreatePrincipalRequest>,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(api_validation_error("username is required"));
    }
    let principal = state
        .principals
        .create_principal(NewPrincipal {
            username: username.to_string(),
        })
        .await
        .map_err(|err| api_store("failed to create principal", err))?;
    Ok(Json(principal.into()))
}

#[utoipa::path(
    get,
    path = "/v1/principals/{principal_id}",
    tag = "principals",
    params(("principal_id" = i64, Path, description = "Target principal")),
    responses(
        (status = 200, description = "Principal", body = PrincipalResponse),
        (status = 403, description = "Caller may not act on this principal"),
        (status = 404, description = "Unknown principal")
    )
)]
pub async fn get_principal(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthzContext>,
    Path(principal_id): Path<i64>,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let target = PrincipalId::new(principal_id);
    if !ctx.may_act_on(target) {
        return Err(api_forbidden("not authorized for target principal"));
    }
    let principal = state
        .principals
        .get_principal(target)
        .await
        .map_err(|err| api_store("failed to get principal", err))?;
    Ok(Json(principal.into()))
}

#[utoipa::path(
    get,
    path = "/v1/principals/{principal_id}/grants",
    tag = "principals",
    params(("principal_id" = i64, Path, description = "Target principal")),
    responses(
        (status = 200, description = "Direct grants", body = [PrincipalGrantResponse]),
        (status = 403, description = "Caller may not act on this principal")
    )
)]
pub async fn list_principal_grants(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthzContext>,
    Path(principal_id): Path<i64>,
) -> Result<Json<Vec<PrincipalGrantResponse>>, ApiError> {
    let target = PrincipalId::new(principal_id);
    if !ctx.may_act_on(target) {
        return Err(api_forbidden("not authorized for target principal"));
    }
    let grants = state
        .permissions
        .list_principal_grants(target)
        .await
        .map_err(|err| api_store("failed to list principal grants", err))?;
    Ok(Json(
        grants.into_iter().map(PrincipalGrantResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/principals/{principal_id}/grants",
    tag = "principals",
    params(("principal_id" = i64, Path, description = "Target principal")),
    request_body = GrantRequest,
    responses(
        (status = 200, description = "Grant created", body = PrincipalGrantResponse),
        (status = 400, description = "Permission not in the catalog"),
        (status = 403, description = "Caller may not act on this principal"),
        (status = 409, description = "Grant already exists")
    )
)]
pub async fn add_principal_grant(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthzContext>,
    Path(principal_id): Path<i64>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<PrincipalGrantResponse>, ApiError> {
    let target = PrincipalId::new(principal_id);
    if !ctx.may_act_on(target) {
        return Err(api_forbidden("not authorized for target principal"));
    }
    if !state.catalog.contains(&body.permission) {
        return Err(api_validation_error(&format!(
            "unknown permission {}",
            body.permission
        )));
    }
    let grant = PrincipalGrant {
        principal_id: target,
        permission: body.permission,
        others: body.others,
    };
    state
        .permissions
        .add_principal_grant(grant.clone())
        .await
        .map_err(|err| api_store("failed to add principal grant", err))?;
    state.cache.invalidate(target);
    Ok(Json(grant.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/principals/{principal_id}/grants",
    tag = "principals",
    params(("principal_id" = i64, Path, description = "Target principal")),
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Grant removed", body = StatusResponse),
        (status = 403, description = "Caller may not act on this principal"),
        (status = 404, description = "Unknown grant")
    )
)]
pub async fn remove_principal_grant(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthzContext>,
    Path(principal_id): Path<i64>,
    Json(body): Json<PermissionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let target = PrincipalId::new(principal_id);
    if !ctx.may_act_on(target) {
        return Err(api_forbidden("not authorized for target principal"));
    }
    state
        .permissions
        .remove_principal_grant(target, &body.permission)
        .await
        .map_err(|err| api_store("failed to remove principal grant", err))?;
    state.cache.invalidate(target);
    Ok(Json(StatusResponse::ok()))
}
