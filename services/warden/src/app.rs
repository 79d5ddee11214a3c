//! HTTP application wiring: route/method registration and the gate
//! middleware.
//!
//! # Purpose
//! Declares every route once, in [`route_specs`], which feeds both the
//! method registry (catalog derivation + public exemptions) and the route
//! table the middleware uses to map a matched HTTP route back to its
//! canonical RPC method name. The service's own admin API is protected by the
//! gate it administers.
use crate::api;
use crate::api::error::ApiError;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use warden_authz::{
    AuthorizationGate, CallMetadata, MethodRegistry, PermissionCache, PermissionCatalog,
    PermissionStore, PrincipalStore, PublicMethods, RoleStore, AUTHORIZATION_METADATA_KEY,
};

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub backend: &'static str,
    pub durable: bool,
    pub catalog: PermissionCatalog,
    pub public_methods: PublicMethods,
    pub routes: Arc<RouteTable>,
    pub gate: Arc<AuthorizationGate>,
    pub cache: Arc<PermissionCache>,
    pub roles: Arc<dyn RoleStore>,
    pub principals: Arc<dyn PrincipalStore>,
    pub permissions: Arc<dyn PermissionStore>,
}

struct RouteSpec {
    http: Method,
    path: &'static str,
    service: &'static str,
    rpc: &'static str,
    public: bool,
}

fn route_specs() -> Vec<RouteSpec> {
    let protected = |http: Method, path: &'static str, service: &'static str, rpc: &'static str| {
        RouteSpec {
            http,
            path,
            service,
            rpc,
            public: false,
        }
    };
    let public = |http: Method, path: &'static str, service: &'static str, rpc: &'static str| {
        RouteSpec {
            http,
            path,
            service,
            rpc,
            public: true,
        }
    };
    vec![
        public(Method::GET, "/v1/system/health", "warden.v1.System", "Health"),
        public(Method::GET, "/v1/system/info", "warden.v1.System", "Info"),
        public(Method::GET, "/v1/openapi.json", "warden.v1.System", "OpenApi"),
        protected(Method::GET, "/v1/roles", "warden.v1.Roles", "List"),
        protected(Method::POST, "/v1/roles", "warden.v1.Roles", "Create"),
        protected(Method::DELETE, "/v1/roles/:role_id", "warden.v1.Roles", "Delete"),
        protected(
            Method::GET,
            "/v1/roles/:role_id/grants",
            "warden.v1.Roles",
            "ListGrants",
        ),
        protected(
            Method::POST,
            "/v1/roles/:role_id/grants",
            "warden.v1.Roles",
            "AddGrant",
        ),
        protected(
            Method::DELETE,
            "/v1/roles/:role_id/grants",
            "warden.v1.Roles",
            "RemoveGrant",
        ),
        protected(
            Method::POST,
            "/v1/roles/:role_id/assign",
            "warden.v1.Roles",
            "Assign",
        ),
        protected(Method::GET, "/v1/principals", "warden.v1.Principals", "List"),
        protected(Method::POST, "/v1/principals", "warden.v1.Principals", "Create"),
        protected(
            Method::GET,
            "/v1/principals/:principal_id",
            "warden.v1.Principals",
            "Get",
        ),
        protected(
            Method::GET,
            "/v1/principals/:principal_id/grants",
            "warden.v1.Principals",
            "ListGrants",
        ),
        protected(
            Method::POST,
            "/v1/principals/:principal_id/grants",
            "warden.v1.Principals",
            "AddGrant",
        ),
        protected(
            Method::DELETE,
            "/v1/principals/:principal_id/grants",
            "warden.v1.Principals",
            "RemoveGrant",
        ),
    ]
}

/// Maps a matched `(http method, route pattern)` pair back to the canonical
/// RPC method name the gate authorizes against.
pub struct RouteTable {
    entries: HashMap<(Method, &'static str), String>,
}

impl RouteTable {
    pub fn lookup<'a>(&'a self, http: &Method, matched_path: &'a str) -> Option<&'a str> {
        self.entries
            .get(&(http.clone(), matched_path))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Announce every route of this service to the method registry and build the
/// route table the middleware consults. Called once at startup, before the
/// registry is sealed into the catalog.
pub fn build_method_registry() -> (MethodRegistry, RouteTable) {
    let mut registry = MethodRegistry::new();
    let mut entries = HashMap::new();
    for spec in route_specs() {
        let full_method = registry.register_method(spec.service, spec.rpc);
        if spec.public {
            registry.mark_public(full_method.clone());
        }
        entries.insert((spec.http, spec.path), full_method);
    }
    (registry, RouteTable { entries })
}

/// Gate middleware: runs once per inbound call, before dispatch. Streaming
/// responses are decided here once, at establishment, like everything else.
async fn require_authorization(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(matched) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
    else {
        // No matched route: let the router produce its 404.
        return next.run(req).await;
    };
    let Some(full_method) = state
        .routes
        .lookup(req.method(), &matched)
        .map(str::to_string)
    else {
        return next.run(req).await;
    };

    let mut metadata = CallMetadata::new();
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        metadata.insert(AUTHORIZATION_METADATA_KEY, value);
    }

    match state.gate.authorize(&full_method, &metadata).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/system/health", get(api::system::system_health))
        .route("/v1/system/info", get(api::system::system_info))
        .route("/v1/openapi.json", get(api::system::openapi_spec))
        .route(
            "/v1/roles",
            get(api::roles::list_roles).post(api::roles::create_role),
        )
        .route("/v1/roles/:role_id", delete(api::roles::delete_role))
        .route(
            "/v1/roles/:role_id/grants",
            get(api::roles::list_role_grants)
                .post(api::roles::add_role_grant)
                .delete(api::roles::remove_role_grant),
        )
        .route("/v1/roles/:role_id/assign", post(api::roles::assign_role))
        .route(
            "/v1/principals",
            get(api::principals::list_principals).post(api::principals::create_principal),
        )
        .route(
            "/v1/principals/:principal_id",
            get(api::principals::get_principal),
        )
        .route(
            "/v1/principals/:principal_id/grants",
            get(api::principals::list_principal_grants)
                .post(api::principals::add_principal_grant)
                .delete(api::principals::remove_principal_grant),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_authorization,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
