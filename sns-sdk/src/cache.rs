//! Owner cache handed to the resolver
//!
//! The resolver never caches on its own. Callers that want repeated lookups to
//! skip the network pass an [`OwnerCache`] in explicitly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anchor_lang::prelude::Pubkey;
use parking_lot::RwLock;

/// Domain key -> resolved owner
pub trait OwnerCache: Send + Sync {
    fn get(&self, domain_key: &Pubkey) -> Option<Pubkey>;
    fn insert(&self, domain_key: Pubkey, owner: Pubkey);
    fn invalidate(&self, domain_key: &Pubkey);
}

#[derive(Debug, Clone, Copy)]
struct CachedOwner {
    owner: Pubkey,
    inserted_at: Instant,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CachedOwner {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Bounded cache with a single TTL for every entry
pub struct TtlCache {
    entries: RwLock<HashMap<Pubkey, CachedOwner>>,
    capacity: usize,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get_at(&self, domain_key: &Pubkey, now: Instant) -> Option<Pubkey> {
        let mut entries = self.entries.write();
        match entries.get(domain_key) {
            Some(cached) if !cached.is_expired(now) => Some(cached.owner),
            Some(_) => {
                entries.remove(domain_key);
                None
            }
            None => None,
        }
    }

    /// Insert, evicting expired entries and then the oldest insertion when full
    pub fn insert_at(&self, domain_key: Pubkey, owner: Pubkey, now: Instant) {
        let mut entries = self.entries.write();

        if !entries.contains_key(&domain_key) && entries.len() >= self.capacity {
            entries.retain(|_, cached| !cached.is_expired(now));

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, cached)| cached.inserted_at)
                    .map(|(key, _)| *key);
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            domain_key,
            CachedOwner {
                owner,
                inserted_at: now,
                expires_at: now.checked_add(self.ttl),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl OwnerCache for TtlCache {
    fn get(&self, domain_key: &Pubkey) -> Option<Pubkey> {
        self.get_at(domain_key, Instant::now())
    }

    fn insert(&self, domain_key: Pubkey, owner: Pubkey) {
        self.insert_at(domain_key, owner, Instant::now());
    }

    fn invalidate(&self, domain_key: &Pubkey) {
        self.entries.write().remove(domain_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_entries_are_not_served() {
        let cache = TtlCache::new(4, Duration::from_secs(30));
        let (domain, owner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let start = Instant::now();

        cache.insert_at(domain, owner, start);
        assert_eq!(cache.get_at(&domain, start + Duration::from_secs(29)), Some(owner));
        assert_eq!(cache.get_at(&domain, start + Duration::from_secs(30)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_expired_first() {
        let cache = TtlCache::new(2, Duration::from_secs(10));
        let start = Instant::now();
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        cache.insert_at(a, a, start);
        cache.insert_at(b, b, start + Duration::from_secs(8));
        // a has expired by now, b has not
        cache.insert_at(c, c, start + Duration::from_secs(11));

        let now = start + Duration::from_secs(12);
        assert_eq!(cache.get_at(&a, now), None);
        assert_eq!(cache.get_at(&b, now), Some(b));
        assert_eq!(cache.get_at(&c, now), Some(c));
    }

    #[test]
    fn test_capacity_evicts_oldest_when_nothing_expired() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        let start = Instant::now();
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        cache.insert_at(a, a, start);
        cache.insert_at(b, b, start + Duration::from_secs(1));
        cache.insert_at(c, c, start + Duration::from_secs(2));

        let now = start + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&a, now), None);
        assert_eq!(cache.get_at(&b, now), Some(b));
    }

    #[test]
    fn test_unbounded_ttl_never_expires() {
        let cache = TtlCache::new(2, Duration::MAX);
        let (domain, owner) = (Pubkey::new_unique(), Pubkey::new_unique());
        let start = Instant::now();

        cache.insert_at(domain, owner, start);
        assert_eq!(cache.get_at(&domain, start + Duration::from_secs(86_400 * 365)), Some(owner));
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let cache = TtlCache::new(1, Duration::from_secs(60));
        let domain = Pubkey::new_unique();
        let (first, second) = (Pubkey::new_unique(), Pubkey::new_unique());

        cache.insert(domain, first);
        cache.insert(domain, second);
        assert_eq!(cache.get(&domain), Some(second));

        cache.invalidate(&domain);
        assert_eq!(cache.get(&domain), None);
    }
}
