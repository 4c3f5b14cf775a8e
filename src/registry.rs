//! Registration storage
//!
//! Maps (contract, name) keys to registrations. Uses `DashMap` with `ahash`
//! so lookups stay guard-free around user code: registrations are handed out
//! as `Arc` clones and no shard lock is held while a provider runs.

use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::registration::Registration;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Thread-safe map from [`ServiceKey`] to [`Registration`].
///
/// Entries are overwritten, never merged: re-registering a key replaces the
/// previous registration (last write wins).
pub struct Registry {
    entries: DashMap<ServiceKey, Arc<Registration>, RandomState>,
}

impl Registry {
    /// Create an empty registry.
    ///
    /// Eight shards balance creation cost against contention for the
    /// dozens-of-services cardinality containers typically hold.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Upsert a registration under its key; last write wins.
    #[inline]
    pub fn insert(&self, registration: Registration) {
        self.entries
            .insert(registration.key().clone(), Arc::new(registration));
    }

    /// Look up the registration for a key.
    #[inline]
    pub fn get(&self, key: &ServiceKey) -> Result<Arc<Registration>> {
        self.entries
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DiError::not_registered_key(key.clone()))
    }

    /// Non-erroring probe for a key.
    #[inline]
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Every name-variant registered for a contract.
    pub fn get_all(&self, type_id: TypeId) -> Vec<Arc<Registration>> {
        self.entries
            .iter()
            .filter(|entry| entry.key().type_id() == type_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of registrations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no registrations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every registration.
    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("count", &self.len()).finish()
    }
}
