//! Time-bounded, invalidatable cache of resolved permission maps.
//!
//! # Purpose
//! Keeps the common case (already-cached, allowed) cheap enough to run on
//! every RPC. Entries are stored in an encoded form; a corrupted or
//! undecodable entry behaves exactly like a miss, so a cache malfunction
//! fails open to recomputation and never to a blanket allow or deny.
//!
//! # Concurrency
//! Backed by a sharded concurrent map keyed by principal, so arbitrarily many
//! simultaneous calls for distinct principals never contend on one lock. Two
//! concurrent misses for the same principal may both resolve and populate;
//! resolution is idempotent and the last writer wins, with the TTL reset
//! either way.
use crate::types::{EffectivePermissions, PrincipalId};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// TTL applied to every entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

struct CacheEntry {
    encoded: Vec<u8>,
    expires_at: Instant,
}

enum Lookup {
    Hit(EffectivePermissions),
    Stale,
    Absent,
}

pub struct PermissionCache {
    entries: DashMap<PrincipalId, CacheEntry>,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached map when present, TTL-valid, and decodable.
    pub fn get(&self, principal: PrincipalId) -> Option<EffectivePermissions> {
        // The map guard must be released before the stale-entry removal below.
        let lookup = match self.entries.get(&principal) {
            None => Lookup::Absent,
            Some(entry) if entry.expires_at <= Instant::now() => Lookup::Stale,
            Some(entry) => match serde_json::from_slice(&entry.encoded) {
                Ok(permissions) => Lookup::Hit(permissions),
                // Corrupted entry: recompute, never decide from it.
                Err(_) => Lookup::Stale,
            },
        };
        match lookup {
            Lookup::Hit(permissions) => {
                metrics::counter!("warden_permission_cache_hits_total").increment(1);
                Some(permissions)
            }
            Lookup::Stale => {
                self.entries.remove(&principal);
                metrics::counter!("warden_permission_cache_misses_total").increment(1);
                None
            }
            Lookup::Absent => {
                metrics::counter!("warden_permission_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Store or overwrite the entry and reset its TTL.
    pub fn insert(&self, principal: PrincipalId, permissions: &EffectivePermissions) {
        match serde_json::to_vec(permissions) {
            Ok(encoded) => {
                self.entries.insert(
                    principal,
                    CacheEntry {
                        encoded,
                        expires_at: Instant::now() + self.ttl,
                    },
                );
            }
            Err(err) => {
                // An unencodable map must not become an authorization error;
                // the next check simply resolves again.
                tracing::warn!(%principal, error = %err, "failed to encode permission map");
            }
        }
    }

    /// Evict one principal's entry, independent of TTL.
    pub fn invalidate(&self, principal: PrincipalId) {
        self.entries.remove(&principal);
    }

    /// Evict every entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&self, principal: PrincipalId, encoded: Vec<u8>) {
        self.entries.insert(
            principal,
            CacheEntry {
                encoded,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
