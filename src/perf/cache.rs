//! # perf::cache
//!
//! [`RequestCache`] — TTL memoization plus in-flight request deduplication.
//!
//! ## Lookup order in `get_or_fetch`
//! 1. **Fresh entry** — returned immediately, no I/O
//! 2. **In-flight request** for the key — the caller awaits the same shared
//!    future as everyone else
//! 3. **Miss** — the producer is spawned as its own task and registered as
//!    the key's pending request
//!
//! The spawned task settles the key itself (store on success, clear the
//! pending marker either way), so a caller that gives up waiting never
//! cancels the underlying call. Failures are handed to every waiter and are
//! never cached.
//!
//! Expired entries are dropped lazily on lookup; [`RequestCache::spawn_sweeper`]
//! additionally bounds memory for keys nobody asks for again.

use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use futures_util::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use serde::Serialize;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, error};

use crate::error::FetchError;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

// ─── Entries ──────────────────────────────────────────────────────────────────

struct CacheEntry<V> {
    data:      V,
    stored_at: Instant,
    ttl:       Duration,
}

impl<V> CacheEntry<V> {
    /// Valid while `now - stored_at <= ttl`; written without `stored_at + ttl`
    /// so `Duration::MAX` means "never expires" instead of overflowing.
    #[inline]
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

struct Pending<V> {
    generation: u64,
    fetch:      SharedFetch<V>,
}

// ─── Metrics ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheMetrics {
    pub hits:        u64,
    pub misses:      u64,
    /// Callers that attached to an already running request.
    pub joined:      u64,
    pub inserts:     u64,
    pub expirations: u64,
    pub failures:    u64,
    pub entries:     usize,
    pub pending:     usize,
}

impl CacheMetrics {
    /// Share of lookups answered without starting a new producer.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.joined + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.joined) as f64 / total as f64
        }
    }
}

// ─── Internal State ───────────────────────────────────────────────────────────

struct State<V> {
    entries:         HashMap<String, CacheEntry<V>>,
    pending:         HashMap<String, Pending<V>>,
    next_generation: u64,
    metrics:         CacheMetrics,
}

impl<V: Clone> State<V> {
    fn lookup(&mut self, key: &str, now: Instant) -> Option<V> {
        let fresh = self.entries.get(key)?.is_fresh(now);
        if fresh {
            return self.entries.get(key).map(|e| e.data.clone());
        }
        self.entries.remove(key);
        self.metrics.expirations += 1;
        None
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before - self.entries.len();
        self.metrics.expirations += removed as u64;
        removed
    }
}

struct Inner<V> {
    state: Mutex<State<V>>,
}

impl<V: Clone> Inner<V> {
    /// Critical sections never await, so a poisoned lock still holds
    /// consistent maps.
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, key: &str, generation: u64, result: &Result<V, FetchError>, ttl: Duration) {
        let mut state = self.lock();

        if let Err(e) = result {
            state.metrics.failures += 1;
            error!(key, error = %e, "API call failed");
        }

        // A `clear()` or `invalidate()` while we were running retires this
        // generation; its result must not repopulate the cache.
        let current = state.pending.get(key).map(|p| p.generation) == Some(generation);
        if !current {
            debug!(key, generation, "stale fetch settled, result dropped");
            return;
        }
        state.pending.remove(key);

        if let Ok(data) = result {
            if !ttl.is_zero() {
                state.entries.insert(
                    key.to_string(),
                    CacheEntry { data: data.clone(), stored_at: Instant::now(), ttl },
                );
                state.metrics.inserts += 1;
            }
        }
    }
}

// ─── RequestCache ─────────────────────────────────────────────────────────────

/// Cheap to clone; clones share the same entries and pending requests.
pub struct RequestCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for RequestCache<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V> Default for RequestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RequestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries:         HashMap::new(),
                    pending:         HashMap::new(),
                    next_generation: 0,
                    metrics:         CacheMetrics::default(),
                }),
            }),
        }
    }

    /// Returns the cached value for `key`, joins the in-flight request for
    /// it, or starts `producer` — in that order.
    ///
    /// A zero `ttl` still deduplicates concurrent callers but never stores
    /// the result.
    ///
    /// `producer` is called synchronously while the cache is locked; it must
    /// only build the future, not touch this cache.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, producer: F, ttl: Duration) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let fetch = {
            let mut state = self.inner.lock();

            if let Some(data) = state.lookup(key, Instant::now()) {
                state.metrics.hits += 1;
                return Ok(data);
            }

            if let Some(pending) = state.pending.get(key) {
                let fetch = pending.fetch.clone();
                state.metrics.joined += 1;
                debug!(key, "joining in-flight request");
                fetch
            } else {
                state.metrics.misses += 1;
                let generation = state.next_generation;
                state.next_generation += 1;

                let fetch = self.start(key, generation, producer(), ttl);
                state.pending.insert(
                    key.to_string(),
                    Pending { generation, fetch: fetch.clone() },
                );
                fetch
            }
        };

        fetch.await
    }

    fn start<Fut>(&self, key: &str, generation: u64, fut: Fut, ttl: Duration) -> SharedFetch<V>
    where
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();

        // A panicking producer still has to settle its key, otherwise the
        // dead shared future would be handed to every later caller.
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result.map_err(FetchError::new),
                Err(panic) => Err(FetchError::new(anyhow::anyhow!(
                    "producer panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            };
            inner.settle(&owned_key, generation, &result, ttl);
            result
        });

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    // Runtime shutdown cancelled the task before it settled.
                    let result = Err(FetchError::new(anyhow::anyhow!(
                        "producer task did not complete: {join_err}"
                    )));
                    inner.settle(&owned_key, generation, &result, ttl);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Fresh cached value, without fetching.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().lookup(key, Instant::now())
    }

    /// Drops the entry and any pending marker for `key`.
    pub fn invalidate(&self, key: &str) {
        let mut state = self.inner.lock();
        state.entries.remove(key);
        state.pending.remove(key);
    }

    /// Drops every entry and pending marker. Requests already running finish
    /// for their current waiters but do not repopulate the cache.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.pending.clear();
    }

    /// Removes expired entries; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired(Instant::now())
    }

    /// Number of stored entries, including ones that expired but were not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        let state = self.inner.lock();
        CacheMetrics {
            entries: state.entries.len(),
            pending: state.pending.len(),
            ..state.metrics.clone()
        }
    }

    /// Periodically purges expired entries. The task stops on its own once
    /// every handle to this cache is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner<V>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let removed = inner.lock().purge_expired(Instant::now());
                if removed > 0 {
                    debug!(removed, "🧹 cache sweep");
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
