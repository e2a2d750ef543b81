//! Override contexts - per-scope synthetic properties layered over the data
//!
//! Constructs such as repeaters and `let` bindings inject names (`$index`,
//! `$host`, aliases) without touching the application's data object. Those
//! names live on the [`OverrideContext`] and shadow same-named properties of
//! its binding context during lookup.

use std::fmt;
use std::sync::Arc;

use crate::binding_context::{BindingContext, ContextObject, PropertyBag};
use crate::flags::LifecycleFlags;
use crate::value::Value;

struct OverrideInner {
    binding_context: BindingContext,
    properties: PropertyBag,
}

/// Shared handle to an override context
#[derive(Clone)]
pub struct OverrideContext {
    inner: Arc<OverrideInner>,
}

impl OverrideContext {
    /// Create an override context backed by `bc`
    pub fn create(flags: LifecycleFlags, bc: BindingContext) -> Self {
        tracing::trace!(?flags, "creating override context");
        Self {
            inner: Arc::new(OverrideInner {
                binding_context: bc,
                properties: PropertyBag::new(),
            }),
        }
    }

    /// The backing data object, fixed at creation
    pub fn binding_context(&self) -> &BindingContext {
        &self.inner.binding_context
    }

    /// Whether `key` was injected directly on this override context
    pub fn has_own(&self, key: &str) -> bool {
        self.inner.properties.has_own(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.properties.get(key)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.properties.set(key, value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.properties.remove(key)
    }

    pub fn own_keys(&self) -> Vec<String> {
        self.inner.properties.own_keys()
    }

    /// Whether both handles point at the same override context
    pub fn ptr_eq(&self, other: &OverrideContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for OverrideContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideContext")
            .field("keys", &self.own_keys())
            .field("binding_context", &self.inner.binding_context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injected_names_do_not_touch_data() {
        let bc = BindingContext::with_property("item", "a");
        let oc = OverrideContext::create(LifecycleFlags::NONE, bc.clone());

        oc.set("$index", 0);

        assert!(oc.has_own("$index"));
        assert!(!oc.has_own("item"));
        assert!(!bc.has_own("$index"));
        assert!(oc.binding_context().ptr_eq(&bc));
    }

    #[test]
    fn test_clone_shares_properties() {
        let oc = OverrideContext::create(LifecycleFlags::NONE, BindingContext::new());
        let other = oc.clone();
        other.set("$host", "host");

        assert!(oc.ptr_eq(&other));
        assert_eq!(oc.get("$host"), Some(Value::from("host")));
        assert_eq!(oc.remove("$host"), Some(Value::from("host")));
        assert!(other.own_keys().is_empty());
    }
}
