//! Reactive key-value store
//!
//! Single source of truth shared between the loader and every consumer.
//! Holds one JSON slice per key with a per-key write timestamp, and notifies
//! subscribers synchronously on every write. Only the loader role writes;
//! pages/consumers read and subscribe.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

/// Slice keys written by the core pipeline
pub mod keys {
    pub const TRADES: &str = "trades";
    pub const JOURNAL_STATS: &str = "journalStats";
    pub const MONTE_CARLO: &str = "monteCarlo";
    pub const MACRO: &str = "macro";
    pub const AI_CONTEXT: &str = "aiContext";
}

/// Subscription key matching every slice
pub const WILDCARD: &str = "*";

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Handler = Arc<dyn Fn(&str, &Value) + Send + Sync>;

struct Entry {
    value: Value,
    written_at: Instant,
}

/// Reactive keyed state holder.
///
/// Values are opaque JSON slices. Writes stamp the key's freshness and fan
/// out to per-key subscribers plus wildcard subscribers, in registration
/// order. Keys are never deleted; an absent key reads as `Value::Null`.
#[derive(Default)]
pub struct Store {
    data: RwLock<HashMap<String, Entry>>,
    subscribers: RwLock<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial slices.
    ///
    /// Seeded keys carry a write timestamp, so they are fresh with respect
    /// to `is_stale` from the moment of construction.
    pub fn with_initial(initial: impl IntoIterator<Item = (String, Value)>) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.write();
            for (key, value) in initial {
                data.insert(
                    key,
                    Entry {
                        value,
                        written_at: Instant::now(),
                    },
                );
            }
        }
        store
    }

    /// Current slice for `key`, or `Value::Null` if never written
    pub fn get(&self, key: &str) -> Value {
        self.data
            .read()
            .get(key)
            .map(|e| e.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Typed view of a slice; `None` when absent or of a different shape
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.get(key)).ok()
    }

    /// Replace the slice wholesale, stamp freshness, notify subscribers
    pub fn set(&self, key: &str, value: Value) {
        {
            let mut data = self.data.write();
            data.insert(
                key.to_string(),
                Entry {
                    value: value.clone(),
                    written_at: Instant::now(),
                },
            );
        }
        self.notify(key, &value);
    }

    /// Shallow-merge `partial` into the existing slice.
    ///
    /// When both the current slice and `partial` are JSON objects the result
    /// is their union with `partial`'s fields winning; otherwise `partial`
    /// replaces the slice wholesale. Stamps and notifies like `set`.
    pub fn merge(&self, key: &str, partial: Value) {
        let merged = {
            let mut data = self.data.write();
            let merged = match (data.get(key).map(|e| &e.value), &partial) {
                (Some(Value::Object(current)), Value::Object(incoming)) => {
                    let mut union = current.clone();
                    for (k, v) in incoming {
                        union.insert(k.clone(), v.clone());
                    }
                    Value::Object(union)
                }
                _ => partial,
            };
            data.insert(
                key.to_string(),
                Entry {
                    value: merged.clone(),
                    written_at: Instant::now(),
                },
            );
            merged
        };
        self.notify(key, &merged);
    }

    /// Instant of the last `set`/`merge` for `key`
    pub fn last_written(&self, key: &str) -> Option<Instant> {
        self.data.read().get(key).map(|e| e.written_at)
    }

    /// True when `key` was never written or its age is at least `max_age`.
    ///
    /// The boundary is inclusive: `is_stale(key, Duration::ZERO)` is true
    /// immediately after a write.
    pub fn is_stale(&self, key: &str, max_age: Duration) -> bool {
        match self.last_written(key) {
            Some(written_at) => written_at.elapsed() >= max_age,
            None => true,
        }
    }

    /// Register `handler` for writes to `key` (or [`WILDCARD`]).
    ///
    /// Handlers receive `(key, new_value)` synchronously, in registration
    /// order, per-key list before the wildcard list.
    pub fn subscribe(
        &self,
        key: &str,
        handler: impl Fn(&str, &Value) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers
            .write()
            .entry(key.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription; returns false when it was not registered
    pub fn unsubscribe(&self, key: &str, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        match subs.get_mut(key) {
            Some(handlers) => {
                let before = handlers.len();
                handlers.retain(|(hid, _)| *hid != id);
                handlers.len() != before
            }
            None => false,
        }
    }

    fn notify(&self, key: &str, value: &Value) {
        // Snapshot handlers outside the lock so they may read the store
        let handlers: Vec<Handler> = {
            let subs = self.subscribers.read();
            subs.get(key)
                .into_iter()
                .chain(subs.get(WILDCARD))
                .flatten()
                .map(|(_, h)| h.clone())
                .collect()
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(key, value))).is_err() {
                warn!("store subscriber for '{}' panicked; continuing", key);
            }
        }
    }
}
