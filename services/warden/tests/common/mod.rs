//! Shared harness for router-level tests: in-memory stores, a deterministic
//! Ed25519 identity provider, and request helpers.
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use warden::app::{build_method_registry, build_router, AppState};
use warden::store::InMemoryStore;
use warden_authz::{
    AccessClaims, AuthorizationGate, Bootstrapper, JwtTokenValidator, PermissionCache,
    PermissionResolver, PermissionStore, PrincipalStore, RoleStore, StaticKeyStore, TokenValidator,
};

const ISSUER: &str = "https://idp.example";
const AUDIENCE: &str = "warden";
const KEY_SEED: [u8; 32] = [23u8; 32];

pub struct Harness {
    pub app: Router,
    pub state: AppState,
    encoding: EncodingKey,
}

/// Build a fully wired application over the in-memory store. The
/// bootstrapper has already run: principal 1 is the seeded admin holding the
/// Super Admin role.
pub async fn harness() -> Harness {
    let (registry, routes) = build_method_registry();
    let (catalog, public_methods) = registry.into_parts();

    let store = Arc::new(InMemoryStore::new());
    let roles: Arc<dyn RoleStore> = store.clone();
    let principals: Arc<dyn PrincipalStore> = store.clone();
    let permissions: Arc<dyn PermissionStore> = store;

    Bootstrapper::new(
        roles.clone(),
        principals.clone(),
        permissions.clone(),
        catalog.clone(),
    )
    .run()
    .await
    .expect("bootstrap");

    let signing_key = SigningKey::from_bytes(&KEY_SEED);
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("public pem");
    let private_pem = signing_key.to_pkcs8_pem(LineEnding::LF).expect("private pem");
    let encoding = EncodingKey::from_ed_pem(private_pem.as_bytes()).expect("encoding key");
    let key_store = StaticKeyStore::from_ed_pem(public_pem.as_bytes()).expect("key store");
    let validator: Arc<dyn TokenValidator> = Arc::new(JwtTokenValidator::new(
        ISSUER,
        AUDIENCE,
        30,
        Arc::new(key_store),
    ));

    let cache = Arc::new(PermissionCache::new(Duration::from_secs(600)));
    let resolver = PermissionResolver::new(roles.clone(), permissions.clone(), catalog.clone());
    let gate = Arc::new(AuthorizationGate::new(
        public_methods.clone(),
        validator,
        resolver,
        cache.clone(),
    ));

    let state = AppState {
        api_version: "v1".to_string(),
        backend: "memory",
        durable: false,
        catalog,
        public_methods,
        routes: Arc::new(routes),
        gate,
        cache,
        roles,
        principals,
        permissions,
    };
    let app = build_router(state.clone());
    Harness {
        app,
        state,
        encoding,
    }
}

impl Harness {
    /// Mint a token whose subject is the given principal id.
    pub fn token(&self, principal_id: i64) -> String {
        self.token_for_subject(&principal_id.to_string())
    }

    pub fn token_for_subject(&self, sub: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs() as i64;
        let claims = AccessClaims {
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            sub: sub.to_string(),
            exp: now + 600,
            iat: now,
            username: None,
            roles: Vec::new(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding)
            .expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.expect("response")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        self.request(Method::DELETE, uri, token, body).await
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
