//! # perf::debounce
//!
//! [`Debouncer`] — coalesces rapid repeated triggers under one key into a
//! single action. Scheduling under a key cancels whatever was waiting there;
//! only the last call inside the delay window runs.
//!
//! Once an action has started it can no longer be cancelled by a newer call.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, error};

struct Scheduled {
    generation: u64,
    handle:     JoinHandle<()>,
}

#[derive(Default)]
struct Slots {
    by_key:          HashMap<String, Scheduled>,
    next_generation: u64,
}

#[derive(Clone, Default)]
pub struct Debouncer {
    slots: Arc<Mutex<Slots>>,
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to run after `delay`, replacing anything still
    /// waiting under `key`. Errors from the action are logged, not returned.
    pub fn debounce<F, Fut>(&self, key: &str, action: F, delay: Duration)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut slots = lock(&self.slots);
        let generation = slots.next_generation;
        slots.next_generation += 1;

        let shared = Arc::clone(&self.slots);
        let owned_key = key.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Leave the slot before running so a newer call cannot abort us
            // mid-action. If the slot moved on, we were superseded.
            {
                let mut slots = lock(&shared);
                let current = slots.by_key.get(&owned_key).map(|s| s.generation) == Some(generation);
                if !current {
                    return;
                }
                slots.by_key.remove(&owned_key);
            }

            if let Err(e) = action().await {
                error!(key = %owned_key, error = %e, "Debounced action failed");
            }
        });

        if let Some(previous) = slots.by_key.insert(key.to_string(), Scheduled { generation, handle }) {
            previous.handle.abort();
            debug!(key, "debounce: replaced pending action");
        }
    }

    /// Cancels the action waiting under `key`. Returns `true` if one was waiting.
    pub fn cancel(&self, key: &str) -> bool {
        match lock(&self.slots).by_key.remove(key) {
            Some(scheduled) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of keys with an action still waiting for its delay.
    pub fn pending(&self) -> usize {
        lock(&self.slots).by_key.len()
    }
}
