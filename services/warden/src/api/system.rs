//! System endpoints: health, build/info, and the OpenAPI document. These are
//! the canonical public methods; they answer without a token.
use crate::api::types::{HealthResponse, SystemInfoResponse};
use crate::app::AppState;
use axum::extract::State;
use axum::Json;

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn system_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/system/info",
    tag = "system",
    responses((status = 200, description = "Service information", body = SystemInfoResponse))
)]
pub async fn system_info(State(state): State<AppState>) -> Json<SystemInfoResponse> {
    Json(SystemInfoResponse {
        api_version: state.api_version.clone(),
        backend: state.backend.to_string(),
        durable: state.durable,
        permissions: state.catalog.len(),
        public_methods: state.public_methods.len(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/openapi.json",
    tag = "system",
    responses((status = 200, description = "OpenAPI document"))
)]
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(crate::api::openapi::ApiDoc::openapi())
}
