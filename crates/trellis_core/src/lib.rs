//! Trellis Core Runtime
//!
//! This crate provides the binding-scope primitives for the Trellis UI framework:
//!
//! - **Values**: a tagged union for dynamically keyed view data
//! - **Binding Contexts**: shared property objects that view expressions read and write
//! - **Override Contexts**: per-scope injected names (`$index`, `$host`, aliases)
//! - **Scopes**: the ancestor chain a binding expression resolves against
//! - **Proxies**: optional change observation for binding contexts
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{resolve_property, BindingContext, LifecycleFlags, Scope};
//!
//! let flags = LifecycleFlags::NONE;
//! let page = Scope::create(flags, BindingContext::with_property("user", "ada"));
//! let row = Scope::from_parent(flags, Some(&page), BindingContext::with_property("item", 1))?;
//!
//! // `user` is found on the page's binding context
//! let target = resolve_property(Some(&row), "user", 0, flags, None)?;
//! assert!(target.as_binding().is_some_and(|bc| bc.ptr_eq(page.binding_context())));
//! # Ok::<(), trellis_core::ScopeError>(())
//! ```

pub mod binding_context;
pub mod error;
pub mod flags;
pub mod override_context;
pub mod proxy;
pub mod scope;
pub mod value;

pub use binding_context::{BindingContext, ContextInit, ContextObject, PropertyBag};
pub use error::{Result, ScopeError};
pub use flags::LifecycleFlags;
pub use override_context::OverrideContext;
pub use proxy::{
    ChangeCallback, ObservedContext, PropertyChange, ProxyObserver, ProxyObserverCache,
    ProxyObserverFactory, SubscriptionHandle,
};
pub use scope::{resolve_property, ContextTarget, Scope};
pub use value::Value;
