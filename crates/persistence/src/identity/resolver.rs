//! Central identity lookup.

use std::collections::HashMap;

use async_trait::async_trait;

use super::model::{CentralIdentity, IdentityField};
use crate::error::StorageResult;
use crate::tenant::ActorType;

/// Lookups against the central identity store.
///
/// Implementations always use their own connection to the central database,
/// so calling them while a [`TenantContext`](crate::tenant::TenantContext) is
/// bound never disturbs the tenant binding.
#[async_trait]
pub trait CentralIdentityResolver: Send + Sync {
    /// Finds one identity by central id.
    async fn find_by_id(
        &self,
        actor_type: ActorType,
        id: i64,
    ) -> StorageResult<Option<CentralIdentity>>;

    /// Finds several identities by central id. Unknown ids are left out.
    async fn find_by_ids(
        &self,
        actor_type: ActorType,
        ids: &[i64],
    ) -> StorageResult<Vec<CentralIdentity>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(identity) = self.find_by_id(actor_type, *id).await? {
                found.push(identity);
            }
        }
        Ok(found)
    }

    /// Returns the ids whose `field` equals `value` via the blind index.
    ///
    /// Exact match only. Returns an empty vector when nothing matches.
    async fn search_by_plaintext(
        &self,
        actor_type: ActorType,
        field: IdentityField,
        value: &str,
    ) -> StorageResult<Vec<i64>>;
}

/// Per-pass memo of identity lookups for one actor type.
///
/// Lookup failures are logged and reported as "no identity" so the row can
/// still be emitted; failures are not cached and will be retried.
pub struct IdentityCache<'a> {
    resolver: &'a dyn CentralIdentityResolver,
    actor_type: ActorType,
    entries: HashMap<i64, Option<CentralIdentity>>,
    failures: u64,
}

impl<'a> IdentityCache<'a> {
    /// Creates an empty cache for identities of `actor_type`.
    pub fn new(resolver: &'a dyn CentralIdentityResolver, actor_type: ActorType) -> Self {
        Self {
            resolver,
            actor_type,
            entries: HashMap::new(),
            failures: 0,
        }
    }

    /// Loads every id not yet cached in one batch.
    pub async fn prefetch(&mut self, ids: impl IntoIterator<Item = i64>) {
        let mut missing: Vec<i64> = ids
            .into_iter()
            .filter(|id| !self.entries.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if missing.is_empty() {
            return;
        }

        match self.resolver.find_by_ids(self.actor_type, &missing).await {
            Ok(found) => {
                for id in &missing {
                    self.entries.insert(*id, None);
                }
                for identity in found {
                    self.entries.insert(identity.id, Some(identity));
                }
            }
            Err(e) => {
                self.failures += 1;
                tracing::warn!(
                    actor_type = %self.actor_type,
                    count = missing.len(),
                    error = %e,
                    "Batch identity lookup failed, falling back to single lookups"
                );
            }
        }
    }

    /// Resolves one identity.
    pub async fn resolve(&mut self, id: i64) -> Option<CentralIdentity> {
        if let Some(cached) = self.entries.get(&id) {
            return cached.clone();
        }

        match self.resolver.find_by_id(self.actor_type, id).await {
            Ok(identity) => {
                self.entries.insert(id, identity.clone());
                identity
            }
            Err(e) => {
                self.failures += 1;
                tracing::warn!(
                    actor_type = %self.actor_type,
                    id,
                    error = %e,
                    "Identity resolution failed, emitting row without identity"
                );
                None
            }
        }
    }

    /// Number of failed lookups so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IdentityError, StorageError};
    use parking_lot::Mutex;

    struct FlakyResolver {
        calls: Mutex<Vec<i64>>,
        broken: i64,
    }

    #[async_trait]
    impl CentralIdentityResolver for FlakyResolver {
        async fn find_by_id(
            &self,
            actor_type: ActorType,
            id: i64,
        ) -> StorageResult<Option<CentralIdentity>> {
            self.calls.lock().push(id);
            if id == self.broken {
                return Err(StorageError::Identity(IdentityError::ResolutionFailed {
                    actor_type,
                    id,
                    message: "decrypt failed".to_string(),
                }));
            }
            Ok((id < 100).then(|| CentralIdentity::new(actor_type, id)))
        }

        async fn search_by_plaintext(
            &self,
            _actor_type: ActorType,
            _field: IdentityField,
            _value: &str,
        ) -> StorageResult<Vec<i64>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_resolve_caches_hits_and_misses() {
        let resolver = FlakyResolver {
            calls: Mutex::new(Vec::new()),
            broken: -1,
        };
        let mut cache = IdentityCache::new(&resolver, ActorType::Patient);

        assert!(cache.resolve(1).await.is_some());
        assert!(cache.resolve(1).await.is_some());
        assert!(cache.resolve(500).await.is_none());
        assert!(cache.resolve(500).await.is_none());

        assert_eq!(*resolver.calls.lock(), vec![1, 500]);
    }

    #[tokio::test]
    async fn test_failures_yield_none_and_are_retried() {
        let resolver = FlakyResolver {
            calls: Mutex::new(Vec::new()),
            broken: 7,
        };
        let mut cache = IdentityCache::new(&resolver, ActorType::Patient);

        assert!(cache.resolve(7).await.is_none());
        assert!(cache.resolve(7).await.is_none());
        assert_eq!(cache.failures(), 2);
        assert_eq!(resolver.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_prefetch_fills_cache() {
        let resolver = FlakyResolver {
            calls: Mutex::new(Vec::new()),
            broken: -1,
        };
        let mut cache = IdentityCache::new(&resolver, ActorType::Practitioner);

        cache.prefetch([3, 3, 200]).await;
        resolver.calls.lock().clear();

        assert_eq!(cache.resolve(3).await.unwrap().id, 3);
        assert!(cache.resolve(200).await.is_none());
        assert!(resolver.calls.lock().is_empty());
    }
}
