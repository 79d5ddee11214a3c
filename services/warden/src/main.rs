//! Warden control-plane service entry point.
//!
//! # Purpose
//! Wires configuration, storage, the permission catalog and bootstrapper,
//! token verification, and the HTTP router, then serves the admin API.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup
//! logic. Startup order matters: every method registers before the catalog is
//! sealed, and the bootstrapper reconciles the super-admin role before the
//! first request is served.
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use warden::app::{self, AppState};
use warden::config::{StorageBackend, WardenConfig};
use warden::jwks::RemoteJwksKeyStore;
use warden::observability;
use warden::store::{InMemoryStore, PostgresStore};
use warden_authz::{
    AuthorizationGate, Bootstrapper, JwtTokenValidator, KeyStore, PermissionCache,
    PermissionResolver, PermissionStore, PrincipalStore, RoleStore, StaticKeyStore, TokenValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WardenConfig::from_env_or_yaml().context("load warden config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: WardenConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("warden");
    let state = build_state(&config).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = app::build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "warden control plane listening");
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: &WardenConfig) -> anyhow::Result<AppState> {
    let (registry, routes) = app::build_method_registry();
    let (catalog, public_methods) = registry.into_parts();

    let (roles, principals, permissions, backend, durable): (
        Arc<dyn RoleStore>,
        Arc<dyn PrincipalStore>,
        Arc<dyn PermissionStore>,
        &'static str,
        bool,
    ) = match config.storage {
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store.clone(), store, "memory", false)
        }
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            let store = Arc::new(PostgresStore::connect(pg).await?);
            (store.clone(), store.clone(), store, "postgres", true)
        }
    };

    let report = Bootstrapper::new(
        roles.clone(),
        principals.clone(),
        permissions.clone(),
        catalog.clone(),
    )
    .run()
    .await
    .context("bootstrap authorization data")?;
    tracing::info!(
        grants_created = report.grants_created,
        grants_failed = report.grants_failed,
        seeded_admin = report.seeded_admin,
        "authorization bootstrap complete"
    );

    let key_store: Arc<dyn KeyStore> = match (&config.token.jwks_url, &config.token.public_key_path)
    {
        (Some(url), _) => Arc::new(RemoteJwksKeyStore::new(
            url.clone(),
            Duration::from_secs(config.token.jwks_refresh_secs),
        )),
        (None, Some(path)) => {
            let pem = std::fs::read(path)
                .with_context(|| format!("read WARDEN_TOKEN_PUBLIC_KEY: {path}"))?;
            Arc::new(StaticKeyStore::from_ed_pem(&pem).context("parse token public key")?)
        }
        (None, None) => {
            anyhow::bail!("set WARDEN_JWKS_URL or WARDEN_TOKEN_PUBLIC_KEY for token verification")
        }
    };
    let validator: Arc<dyn TokenValidator> = Arc::new(JwtTokenValidator::new(
        config.token.issuer.clone(),
        config.token.audience.clone(),
        config.token.leeway_secs,
        key_store,
    ));

    let cache = Arc::new(PermissionCache::new(config.cache_ttl));
    let resolver = PermissionResolver::new(roles.clone(), permissions.clone(), catalog.clone());
    let gate = Arc::new(AuthorizationGate::new(
        public_methods.clone(),
        validator,
        resolver,
        cache.clone(),
    ));

    Ok(AppState {
        api_version: "v1".to_string(),
        backend,
        durable,
        catalog,
        public_methods,
        routes: Arc::new(routes),
        gate,
        cache,
        roles,
        principals,
        permissions,
    })
}
