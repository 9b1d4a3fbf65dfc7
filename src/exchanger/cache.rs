use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::MxLookup;
use crate::dns::DnsResolver;

pub const CACHE_SIZE_ENV: &str = "EMAIL_ADDRESS_CACHE_SIZE";
pub const DEFAULT_CACHE_SIZE: usize = 100;

static GLOBAL: LazyLock<Arc<ExchangerCache>> =
    LazyLock::new(|| Arc::new(ExchangerCache::new(capacity_from_env())));

/// Address of the resolver allocation plus the queried host.
type Key = (usize, String);

struct Entry {
    // keeps the keyed allocation alive while the entry exists
    _resolver: Arc<dyn DnsResolver>,
    answer: MxLookup,
}

/// Bounded LRU of MX answers, keyed by resolver and host name.
///
/// Only definite answers ([`MxLookup::Found`], [`MxLookup::NotFound`]) are
/// stored; outages and disabled lookups are answered fresh every time. A
/// hit promotes the entry; inserting into a full cache evicts the least
/// recently used answer first. All access goes through one mutex.
pub struct ExchangerCache {
    entries: Mutex<LruCache<Key, Entry>>,
}

impl ExchangerCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Process-wide cache sized from `EMAIL_ADDRESS_CACHE_SIZE` (default 100).
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Cached answer for `host` from `resolver`, else the result of `query`.
    /// The lock is not held while `query` runs.
    pub fn answer<F>(&self, host: &str, resolver: &Arc<dyn DnsResolver>, query: F) -> MxLookup
    where
        F: FnOnce() -> MxLookup,
    {
        let key: Key = (resolver_id(resolver), host.to_string());
        if let Some(entry) = self.entries.lock().get(&key) {
            debug!(host, "exchanger cache hit");
            return entry.answer.clone();
        }

        let answer = query();
        if matches!(answer, MxLookup::Found(_) | MxLookup::NotFound) {
            let entry = Entry {
                _resolver: Arc::clone(resolver),
                answer: answer.clone(),
            };
            if let Some(((_, evicted), _)) = self.entries.lock().push(key.clone(), entry) {
                if evicted != key.1 {
                    debug!(host, evicted = %evicted, "exchanger cache eviction");
                }
            }
        }
        answer
    }

    /// Whether any resolver's answer for `host` is cached. Leaves recency
    /// untouched.
    pub fn contains(&self, host: &str) -> bool {
        self.entries.lock().iter().any(|((_, cached), _)| cached == host)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ExchangerCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for ExchangerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("ExchangerCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish()
    }
}

fn resolver_id(resolver: &Arc<dyn DnsResolver>) -> usize {
    Arc::as_ptr(resolver).cast::<()>() as usize
}

fn capacity_from_env() -> usize {
    parse_capacity(std::env::var(CACHE_SIZE_ENV).ok().as_deref())
}

pub(crate) fn parse_capacity(value: Option<&str>) -> usize {
    value
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_CACHE_SIZE)
}
