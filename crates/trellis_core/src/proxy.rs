//! Change-observing proxies for binding contexts
//!
//! A proxy is just another [`ContextObject`]: it forwards reads to its target
//! and, on every write, forwards the write and then notifies subscribers.
//! Scopes and property lookup accept a proxied [`BindingContext`] exactly
//! like a raw one.
//!
//! [`ProxyObserverFactory`] is the pluggable strategy consumed by
//! [`BindingContext::create_observed`]. [`ProxyObserverCache`] is the stock
//! implementation: one observer per target, reused for as long as the proxy
//! is alive.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use trellis_core::{BindingContext, ProxyObserverCache, ProxyObserverFactory};
//!
//! let cache = ProxyObserverCache::new();
//! let target = BindingContext::new();
//! let observer = cache.get_or_create(&target);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! let _handle = observer.subscribe(move |change| {
//!     seen_clone.lock().unwrap().push(change.key.clone());
//! });
//!
//! observer.proxy().set("count", 1);
//! assert_eq!(*seen.lock().unwrap(), vec!["count".to_string()]);
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use rustc_hash::FxHashMap;

use crate::binding_context::{BindingContext, ContextObject};
use crate::value::Value;

/// A single observed write
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    pub key: String,
    /// `Undefined` when the property did not exist before
    pub old_value: Value,
    /// `Undefined` when the property was removed
    pub new_value: Value,
}

/// Callback invoked after a proxied write
pub type ChangeCallback = Arc<dyn Fn(&PropertyChange) + Send + Sync>;

/// Handle for unsubscribing from a proxy observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
}

#[derive(Default)]
struct Subscribers {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(u64, ChangeCallback)>>,
}

impl Subscribers {
    fn add(&self, callback: ChangeCallback) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));
        SubscriptionHandle { id }
    }

    fn remove(&self, handle: SubscriptionHandle) -> bool {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|(id, _)| *id != handle.id);
        callbacks.len() != before
    }

    fn notify(&self, change: &PropertyChange) {
        // Snapshot so callbacks may subscribe/unsubscribe re-entrantly
        let callbacks: Vec<ChangeCallback> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            callback(change);
        }
    }

    fn len(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ObservedContext
// ─────────────────────────────────────────────────────────────────────────────

/// Context object that forwards to a target and reports writes
pub struct ObservedContext {
    target: BindingContext,
    subscribers: Arc<Subscribers>,
}

impl ObservedContext {
    /// The raw context behind the proxy
    pub fn target(&self) -> &BindingContext {
        &self.target
    }
}

impl ContextObject for ObservedContext {
    fn has_own(&self, key: &str) -> bool {
        self.target.has_own(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.target.get(key)
    }

    fn set(&self, key: &str, value: Value) {
        let old_value = self.target.get(key).unwrap_or_default();
        if self.target.has_own(key) && old_value == value {
            return;
        }
        self.target.set(key, value.clone());
        self.subscribers.notify(&PropertyChange {
            key: key.to_string(),
            old_value,
            new_value: value,
        });
    }

    fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.target.remove(key)?;
        self.subscribers.notify(&PropertyChange {
            key: key.to_string(),
            old_value: removed.clone(),
            new_value: Value::Undefined,
        });
        Some(removed)
    }

    fn own_keys(&self) -> Vec<String> {
        self.target.own_keys()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProxyObserver
// ─────────────────────────────────────────────────────────────────────────────

/// Observer for one target context, exposing its proxy
#[derive(Clone)]
pub struct ProxyObserver {
    proxy: BindingContext,
    subscribers: Arc<Subscribers>,
}

impl ProxyObserver {
    /// The observed context; writes through it notify subscribers
    pub fn proxy(&self) -> &BindingContext {
        &self.proxy
    }

    /// Subscribe to writes made through the proxy
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&PropertyChange) + Send + Sync + 'static,
    {
        self.subscribers.add(Arc::new(callback))
    }

    /// Remove a subscription, returning whether it existed
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers.remove(handle)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Strategy for wrapping binding contexts in observing proxies
pub trait ProxyObserverFactory: Send + Sync {
    /// Get the observer for `target`, creating one if needed
    ///
    /// Passing a proxy returns that proxy's own observer.
    fn get_or_create(&self, target: &BindingContext) -> ProxyObserver;
}

/// Default [`ProxyObserverFactory`] that reuses one observer per target
///
/// Entries are weak: once every handle to a proxy is dropped, the next
/// `get_or_create` for its target builds a fresh observer.
#[derive(Default)]
pub struct ProxyObserverCache {
    observers: Mutex<ObserverMap>,
}

/// Smallest map size at which inserts sweep dead entries
const MIN_PRUNE_AT: usize = 64;

#[derive(Default)]
struct ObserverMap {
    entries: FxHashMap<usize, Weak<ObservedContext>>,
    prune_at: usize,
}

impl ObserverMap {
    fn prune(&mut self) {
        self.entries.retain(|_, observed| observed.strong_count() > 0);
    }

    /// Insert, sweeping dead entries once the map doubles since the last sweep
    fn insert(&mut self, addr: usize, observed: Weak<ObservedContext>) {
        if self.entries.len() >= self.prune_at.max(MIN_PRUNE_AT) {
            self.prune();
            self.prune_at = self.entries.len() * 2;
        }
        self.entries.insert(addr, observed);
    }
}

impl ProxyObserverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live observers
    pub fn len(&self) -> usize {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        observers.prune();
        observers.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProxyObserverFactory for ProxyObserverCache {
    fn get_or_create(&self, target: &BindingContext) -> ProxyObserver {
        // A proxy observes itself
        if let Some(observed) = target.downcast_ref::<ObservedContext>() {
            return ProxyObserver {
                proxy: target.clone(),
                subscribers: observed.subscribers.clone(),
            };
        }

        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        let cached = observers
            .entries
            .get(&target.addr())
            .and_then(Weak::upgrade)
            .filter(|observed| observed.target.ptr_eq(target));
        if let Some(observed) = cached {
            let subscribers = observed.subscribers.clone();
            return ProxyObserver {
                proxy: BindingContext::from_arc(observed),
                subscribers,
            };
        }

        tracing::debug!(keys = ?target.own_keys(), "creating proxy observer");
        let observed = Arc::new(ObservedContext {
            target: target.clone(),
            subscribers: Arc::new(Subscribers::default()),
        });
        observers.insert(target.addr(), Arc::downgrade(&observed));
        let subscribers = observed.subscribers.clone();
        ProxyObserver {
            proxy: BindingContext::from_arc(observed),
            subscribers,
        }
    }
}
