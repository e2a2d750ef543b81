//! Binding contexts - the data objects view expressions read from and write to
//!
//! A [`BindingContext`] is a cheap-to-clone handle to a shared property
//! object. The object behind the handle implements [`ContextObject`]; the
//! default implementation is [`PropertyBag`], an insertion-ordered map of
//! own properties. Proxies (see [`crate::proxy`]) implement the same trait
//! and wrap another context, so call sites never know whether they hold a
//! raw bag or an observed one.
//!
//! Membership is always an own-key test. There is no prototype chain, so
//! nothing inherited can masquerade as bound data.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{BindingContext, Value};
//!
//! let item = BindingContext::with_property("title", "Hello");
//! let copy = BindingContext::from_object(&item);
//!
//! copy.set("title", "Changed");
//! assert_eq!(item.get("title"), Some(Value::from("Hello")));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::flags::LifecycleFlags;
use crate::proxy::ProxyObserverFactory;
use crate::value::Value;

/// Read/write capability shared by raw property bags and proxies
pub trait ContextObject: Send + Sync {
    /// Whether `key` is an own property of this object
    fn has_own(&self, key: &str) -> bool;

    /// Read an own property
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a property, creating it if needed
    fn set(&self, key: &str, value: Value);

    /// Delete an own property, returning the previous value
    fn remove(&self, key: &str) -> Option<Value>;

    /// Own property names in insertion order
    fn own_keys(&self) -> Vec<String>;

    /// Downcast support for proxy detection
    fn as_any(&self) -> &dyn Any;
}

// ─────────────────────────────────────────────────────────────────────────────
// PropertyBag
// ─────────────────────────────────────────────────────────────────────────────

/// Plain property storage with no observation
#[derive(Default)]
pub struct PropertyBag {
    props: RwLock<IndexMap<String, Value>>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Value>> {
        self.props.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Value>> {
        self.props.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContextObject for PropertyBag {
    fn has_own(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.write().shift_remove(key)
    }

    fn own_keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BindingContext
// ─────────────────────────────────────────────────────────────────────────────

/// How a new binding context is populated
pub enum ContextInit<'a> {
    /// No properties
    Empty,
    /// Exactly one property
    Property(&'a str, Value),
    /// Shallow copy of another context's own properties
    CopyFrom(&'a BindingContext),
}

/// Shared handle to a context object
///
/// Cloning the handle does not copy the properties; use
/// [`BindingContext::from_object`] for a shallow copy.
#[derive(Clone)]
pub struct BindingContext {
    inner: Arc<dyn ContextObject>,
}

impl BindingContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::from_object_impl(PropertyBag::new())
    }

    /// Create a context holding a single property
    pub fn with_property(key: &str, value: impl Into<Value>) -> Self {
        let ctx = Self::new();
        ctx.set(key, value);
        ctx
    }

    /// Shallow-copy the own properties of `source` into a new context
    ///
    /// Values are cloned, so nested `Value::Object`s stay shared with the
    /// source.
    pub fn from_object(source: &BindingContext) -> Self {
        let ctx = Self::new();
        for key in source.own_keys() {
            if let Some(value) = source.get(&key) {
                ctx.set(&key, value);
            }
        }
        ctx
    }

    /// Wrap any [`ContextObject`] implementation in a handle
    pub fn from_object_impl(object: impl ContextObject + 'static) -> Self {
        Self {
            inner: Arc::new(object),
        }
    }

    /// Wrap an already shared context object
    pub fn from_arc(object: Arc<dyn ContextObject>) -> Self {
        Self { inner: object }
    }

    /// Create a synthetic context for use in a scope
    ///
    /// `PROXY_STRATEGY` has no effect here since no proxy factory is
    /// available; see [`BindingContext::create_observed`].
    pub fn create(flags: LifecycleFlags, init: ContextInit<'_>) -> Self {
        tracing::trace!(?flags, "creating binding context");
        match init {
            ContextInit::Empty => Self::new(),
            ContextInit::Property(key, value) => Self::with_property(key, value),
            ContextInit::CopyFrom(source) => Self::from_object(source),
        }
    }

    /// Create a synthetic context, wrapping it in a proxy when
    /// `PROXY_STRATEGY` is set
    pub fn create_observed(
        flags: LifecycleFlags,
        init: ContextInit<'_>,
        observers: &dyn ProxyObserverFactory,
    ) -> Self {
        let ctx = Self::create(flags, init);
        if flags.contains(LifecycleFlags::PROXY_STRATEGY) {
            return observers.get_or_create(&ctx).proxy().clone();
        }
        ctx
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.inner.has_own(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.set(key, value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    pub fn own_keys(&self) -> Vec<String> {
        self.inner.own_keys()
    }

    /// Whether both handles point at the same context object
    pub fn ptr_eq(&self, other: &BindingContext) -> bool {
        // Compare data pointers only; vtable pointers may differ across codegen units
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Address of the context object, stable for its lifetime
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Downcast the underlying object
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys only; values may refer back to this context
        f.debug_struct("BindingContext")
            .field("keys", &self.own_keys())
            .finish()
    }
}
