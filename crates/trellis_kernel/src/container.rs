//! Container capability consumed by component resolution
//!
//! Resolution code never sees a concrete container. It only needs to ask
//! whether a key is registered, fetch the resolver behind a key, and get an
//! instance. Anything implementing [`Container`] can back the router;
//! [`crate::ComponentRegistry`] is the stock implementation.

use std::fmt;
use std::sync::Arc;

use crate::component::{ComponentInstance, ComponentType};

/// Prefix of resource keys derived from custom element names
pub const CUSTOM_ELEMENT_KEY_PREFIX: &str = "trellis:resource:custom-element:";

/// Registration key
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Named resource, e.g. a custom element registered by name
    Resource(String),
    /// A component type used directly as a key
    Type(ComponentType),
}

impl Key {
    pub fn of_type(component_type: &ComponentType) -> Self {
        Key::Type(component_type.clone())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Resource(key) => write!(f, "Key({key})"),
            Key::Type(ty) => write!(f, "Key(type {})", ty.name()),
        }
    }
}

/// Derive the registration key for a custom element name
pub fn key_from(name: &str) -> Key {
    Key::Resource(format!("{CUSTOM_ELEMENT_KEY_PREFIX}{name}"))
}

/// Produces the type behind a registration
pub trait Factory: Send + Sync {
    fn component_type(&self) -> &ComponentType;

    /// Build a new instance of [`Factory::component_type`]
    fn construct(&self) -> ComponentInstance {
        self.component_type().create_instance()
    }
}

/// Strategy behind a single registration
pub trait Resolver: Send + Sync {
    /// The factory for the registered type, if the registration has one
    fn get_factory(&self, container: &dyn Container) -> Option<Arc<dyn Factory>>;

    /// Produce the instance for this registration
    fn resolve(&self, container: &dyn Container) -> Option<ComponentInstance>;
}

/// Minimal container capability
pub trait Container: Send + Sync {
    /// Whether `key` is registered here (or in an ancestor when `search_ancestors`)
    fn has(&self, key: &Key, search_ancestors: bool) -> bool;

    /// The resolver registered for `key`, searching ancestors
    fn get_resolver(&self, key: &Key) -> Option<Arc<dyn Resolver>>;

    /// Resolve an instance for `key`
    fn get(&self, key: &Key) -> Option<ComponentInstance>;
}
