//! Permission catalog derivation from the RPC method registry.
//!
//! # Purpose
//! Each service announces its RPC methods (and which of them are public) at
//! startup through [`MethodRegistry`]. Consuming the registry yields the
//! immutable [`PermissionCatalog`] (the universe of valid permission
//! identifiers) and the [`PublicMethods`] set the interceptor exempts from
//! authorization.
//!
//! # Key invariants
//! - Canonical identifiers are `"/" + service_full_name + "/" + method_name`,
//!   exactly the RPC framework's full-method naming, so catalog derivation and
//!   interceptor lookup use identical strings without transformation.
//! - The catalog is computed once, after every service has registered, and is
//!   read-only for the life of the process. Immutability is enforced by
//!   construction: [`MethodRegistry::into_parts`] consumes the registry.
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Build the canonical full-method string for one RPC method.
pub fn full_method_name(service: &str, method: &str) -> String {
    format!("/{service}/{method}")
}

/// Mutable, startup-time registry of RPC methods and public exemptions.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeSet<String>,
    public: HashSet<String>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one method and return its canonical permission identifier.
    pub fn register_method(&mut self, service: &str, method: &str) -> String {
        let full = full_method_name(service, method);
        self.methods.insert(full.clone());
        full
    }

    /// Register every method of one service.
    pub fn register_service(&mut self, service: &str, methods: &[&str]) {
        for method in methods {
            self.register_method(service, method);
        }
    }

    /// Exempt an exact full-method string from authorization entirely.
    /// Health checks, login, and registration are the canonical examples.
    pub fn mark_public(&mut self, full_method: impl Into<String>) {
        self.public.insert(full_method.into());
    }

    /// Seal the registry into the immutable catalog snapshot and the public
    /// method set. Call this only after every service has registered.
    pub fn into_parts(self) -> (PermissionCatalog, PublicMethods) {
        (
            PermissionCatalog {
                permissions: Arc::new(self.methods),
            },
            PublicMethods {
                methods: Arc::new(self.public),
            },
        )
    }
}

/// Immutable, deduplicated snapshot of every permission identifier the
/// cluster exposes. Cheap to clone; shared across the resolver, the
/// bootstrapper, and admin validation.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    permissions: Arc<BTreeSet<String>>,
}

impl PermissionCatalog {
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

/// Explicitly constructed set of public full-method strings, passed into the
/// interceptor's constructor rather than living in process-global state.
#[derive(Debug, Clone)]
pub struct PublicMethods {
    methods: Arc<HashSet<String>>,
}

impl PublicMethods {
    pub fn contains(&self, full_method: &str) -> bool {
        self.methods.contains(full_method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_format_matches_rpc_naming() {
        assert_eq!(
            full_method_name("warden.v1.Roles", "Create"),
            "/warden.v1.Roles/Create"
        );
    }

    #[test]
    fn catalog_is_deduplicated() {
        let mut registry = MethodRegistry::new();
        registry.register_service("svc.Thing", &["Get", "Get", "List"]);
        registry.register_method("svc.Thing", "Get");
        let (catalog, _) = registry.into_parts();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("/svc.Thing/Get"));
        assert!(catalog.contains("/svc.Thing/List"));
    }

    #[test]
    fn public_set_is_exact_match_only() {
        let mut registry = MethodRegistry::new();
        let health = registry.register_method("svc.System", "Health");
        registry.register_method("svc.System", "Info");
        registry.mark_public(health);
        let (_, public) = registry.into_parts();
        assert!(public.contains("/svc.System/Health"));
        assert!(!public.contains("/svc.System/Info"));
        assert!(!public.contains("/svc.System/health"));
    }

    #[test]
    fn catalog_iterates_every_registered_method() {
        let mut registry = MethodRegistry::new();
        registry.register_service("a.A", &["X"]);
        registry.register_service("b.B", &["Y", "Z"]);
        let (catalog, _) = registry.into_parts();
        let all: Vec<&str> = catalog.iter().collect();
        assert_eq!(all, vec!["/a.A/X", "/b.B/Y", "/b.B/Z"]);
    }
}
