//! Strongly typed identifiers and grant records for the permission model.
//!
//! # Purpose
//! Wraps raw integer identifiers to reduce accidental mix-ups between roles
//! and principals, and defines the grant records and the OR-merging effective
//! permission map the resolver produces.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of an authenticated actor (end-user or service).
///
/// Id `0` is reserved for the service-to-service caller: it is implicitly
/// granted every catalog permission with `others=true` and never has stored
/// grant rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(i64);

impl PrincipalId {
    /// The reserved system/service-to-service identity.
    pub const SYSTEM: PrincipalId = PrincipalId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    pub fn is_system(self) -> bool {
        self == Self::SYSTEM
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role identifier wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

impl RoleId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named collection of grants. Role names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// An actor known to the stores. Holds zero or more roles and zero or more
/// direct grants; direct grants supplement role-derived grants, never replace
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
}

/// Grant of one permission to every holder of a role.
///
/// `others=true` authorizes the action against any target, not only the
/// caller itself. Unique per `(role_id, permission)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role_id: RoleId,
    pub permission: String,
    pub others: bool,
}

/// Grant of one permission directly to a single principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalGrant {
    pub principal_id: PrincipalId,
    pub permission: String,
    pub others: bool,
}

/// The resolved view of a principal's grants: `permission -> others`.
///
/// Folding is an OR-merge: once a permission's `others` flag is true from any
/// source, a later grant with `others=false` never downgrades it. The map is
/// serde-serializable because the cache stores an encoded form of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    entries: BTreeMap<String, bool>,
}

impl EffectivePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one grant into the map, OR-merging the `others` flag.
    pub fn grant(&mut self, permission: impl Into<String>, others: bool) {
        let entry = self.entries.entry(permission.into()).or_insert(false);
        *entry = *entry || others;
    }

    /// Returns the `others` flag for a permission, or `None` when the
    /// permission is not granted at all.
    pub fn lookup(&self, permission: &str) -> Option<bool> {
        self.entries.get(permission).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
